use super::error::EngineError;
use crate::core::models::input::InputSet;
use crate::core::models::prediction::{Prediction, PredictionRecord, ResultSet};

/// Joins predictions with the reconciled inputs they were computed from.
///
/// Values are kept at full precision; rounding belongs to the text writers.
pub fn format_results(
    predictions: &[Prediction],
    proteins: &InputSet,
    molecules: &InputSet,
) -> Result<ResultSet, EngineError> {
    let expected = proteins.len();
    if molecules.len() != expected {
        return Err(EngineError::Internal(format!(
            "unreconciled inputs: {} proteins, {} molecules",
            expected,
            molecules.len()
        )));
    }
    if predictions.len() != expected {
        return Err(EngineError::PredictionCount {
            expected,
            actual: predictions.len(),
        });
    }

    Ok(predictions
        .iter()
        .zip(proteins.iter().zip(molecules.iter()))
        .map(|(prediction, (protein, molecule))| PredictionRecord {
            protein: protein.clone(),
            molecule: molecule.clone(),
            neg_log10_affinity_m: prediction.neg_log10_affinity_m,
            affinity_um: prediction.affinity_um,
        })
        .collect())
}
