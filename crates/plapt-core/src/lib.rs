//! # PLAPT Core Library
//!
//! Input resolution, canonicalization and result formatting for protein-ligand
//! binding affinity prediction.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`InputSet`, `MolGraph`,
//!   `PredictionRecord`), the canonical SMILES machinery, the amino-acid tables and the
//!   format-specific extractors for FASTA, PDB, SDF, CIF and plain text files.
//!
//! - **[`engine`]: The Logic Core.** Decides whether a token is literal data or a file,
//!   reconciles protein and molecule cardinalities, joins predictions with their inputs,
//!   serializes result sets and tracks the run state machine. The affinity model itself
//!   sits behind the [`engine::predictor::AffinityPredictor`] seam.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into complete
//!   runs: resolving inputs only, or resolving, predicting and writing results.

pub mod core;
pub mod engine;
pub mod workflows;
