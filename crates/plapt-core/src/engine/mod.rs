//! # Engine Module
//!
//! This module implements the decision logic that sits between raw command-line tokens and
//! a finished set of affinity predictions.
//!
//! ## Overview
//!
//! A run resolves each protein and molecule token into canonical strings, brings the two
//! lists to a common length, hands the aligned pairs to an affinity predictor, joins the
//! returned values with their inputs and finally writes the result set to its target. The
//! engine owns every one of these decisions while staying agnostic of how the predictor is
//! implemented.
//!
//! ## Architecture
//!
//! - **Input Resolution** ([`resolver`]) - Literal versus file classification and extraction
//! - **Reconciliation** ([`reconcile`]) - Broadcasting singular inputs against lists
//! - **Prediction Seam** ([`predictor`]) - The `AffinityPredictor` trait and its error type
//! - **Result Formatting** ([`format`]) - Joining predictions with their originating inputs
//! - **Output** ([`output`]) - Console and file sinks, opened only after formatting succeeds
//! - **State Tracking** ([`state`]) - The run state machine and its logged transitions
//! - **Progress Monitoring** ([`progress`]) - Progress events for user feedback
//! - **Configuration** ([`config`]) - Validated run settings and their builder
//! - **Error Handling** ([`error`]) - Engine-level error aggregation
//!
//! ## Key Capabilities
//!
//! - **Explicit file probing** governed by a documented length and line heuristic
//! - **Format dispatch** through static extension tables for both input domains
//! - **Deterministic output** where record order always matches input order
//! - **All-or-nothing writes** so a failed run never leaves partial results behind

pub mod config;
pub mod error;
pub mod format;
pub mod output;
pub mod predictor;
pub mod progress;
pub mod reconcile;
pub mod resolver;
pub mod state;
