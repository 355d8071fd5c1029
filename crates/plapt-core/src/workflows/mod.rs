//! # Workflows Module
//!
//! High-level entry points that run the engine end to end.
//!
//! - **Prediction Workflow** ([`predict`]) - Resolves inputs, calls the affinity predictor,
//!   formats the results and writes them to the configured target.
//! - **Resolution Workflow** ([`resolve`]) - Resolves and reconciles inputs without
//!   predicting, useful for checking what a predictor would receive.

pub mod predict;
pub mod resolve;
