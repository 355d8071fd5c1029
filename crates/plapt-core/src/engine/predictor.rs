use crate::core::models::prediction::Prediction;
use thiserror::Error;

/// Failure reported by an affinity predictor. Its contents are opaque to the engine.
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("Predictor is unavailable: {0}")]
    Unavailable(String),
    #[error("Predictor returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("{0}")]
    Other(String),
}

/// The affinity model seam.
///
/// Implementations receive equal-length, index-aligned slices and must return exactly one
/// prediction per index, in order.
pub trait AffinityPredictor {
    fn predict(
        &self,
        proteins: &[String],
        molecules: &[String],
    ) -> Result<Vec<Prediction>, PredictorError>;
}

impl<F> AffinityPredictor for F
where
    F: Fn(&[String], &[String]) -> Result<Vec<Prediction>, PredictorError>,
{
    fn predict(
        &self,
        proteins: &[String],
        molecules: &[String],
    ) -> Result<Vec<Prediction>, PredictorError> {
        self(proteins, molecules)
    }
}
