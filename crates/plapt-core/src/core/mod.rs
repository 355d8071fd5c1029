//! # Core Module
//!
//! Fundamental data structures and parsers used by the PLAPT front end.
//!
//! - **Input Models** ([`models`]) - Domains, input sets, molecular graphs and prediction records
//! - **Chemistry** ([`chem`]) - Elements, valence model, canonical ranking and SMILES I/O
//! - **File I/O** ([`io`]) - Format extractors dispatched by file extension
//! - **Residue Tables** ([`residues`]) - Standard amino-acid codes

pub mod chem;
pub mod io;
pub mod models;
pub mod residues;
