use thiserror::Error;

use super::config::ConfigError;
use super::predictor::PredictorError;
use crate::core::io::ExtractError;
use crate::core::io::results::ResultsError;
use crate::core::models::input::Domain;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("When using file input for {domain}s, please provide only one file")]
    AmbiguousInput { domain: Domain },

    #[error("No {domain} input was given")]
    EmptyInput { domain: Domain },

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error(
        "Number of proteins ({proteins}) and molecules ({molecules}) must match or one must be singular"
    )]
    CardinalityMismatch { proteins: usize, molecules: usize },

    #[error("Predictor returned {actual} prediction(s) for {expected} input pair(s)")]
    PredictionCount { expected: usize, actual: usize },

    #[error("Prediction failed: {source}")]
    Predictor {
        #[from]
        source: PredictorError,
    },

    #[error("Failed to write results to {target}: {source}")]
    Output {
        target: String,
        #[source]
        source: ResultsError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
