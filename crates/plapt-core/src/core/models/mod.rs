//! Data models shared by the extractors, the engine and the workflows.
//!
//! - [`input`] - Input domains and ordered canonical input sets.
//! - [`molecule`] - The molecular graph that canonical SMILES are computed from.
//! - [`prediction`] - Predictor outputs and the joined result records.

pub mod input;
pub mod molecule;
pub mod prediction;
