//! Chemistry primitives backing molecule canonicalization.
//!
//! - [`element`] - Element symbols, atomic numbers and covalent radii.
//! - [`valence`] - Default valences, implicit hydrogen filling and valence checks.
//! - [`rings`] - Ring bonds and smallest rings.
//! - [`aromaticity`] - Hückel aromaticity perception for Kekulé and aromatic input.
//! - [`canonical`] - Graph-invariant atom ranking.
//! - [`stereo`] - Tetrahedral and double-bond stereo, including perception from coordinates.
//! - [`smiles`] - SMILES parsing and canonical SMILES generation.

pub mod aromaticity;
pub mod canonical;
pub mod element;
pub mod rings;
pub mod smiles;
pub mod stereo;
pub mod valence;

pub use smiles::{SmilesError, canonicalize_smiles, to_canonical_smiles};
