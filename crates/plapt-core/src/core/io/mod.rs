//! Format-specific extractors and result writers.
//!
//! Every input format implements [`traits::ProteinFormat`], [`traits::MoleculeFormat`] or
//! both. [`dispatch::extract_file`] picks the implementation from a static extension table.
//! Molecule readers return canonical SMILES; plain text files are passed through as written.

pub mod cif;
pub mod dispatch;
pub mod error;
pub mod fasta;
pub mod pdb;
pub mod results;
pub mod sdf;
pub mod structure;
pub mod traits;
pub mod txt;

pub use dispatch::extract_file;
pub use error::ExtractError;
pub use traits::ExtractOptions;
