use super::resolve::parse_inputs;
use crate::core::models::prediction::ResultSet;
use crate::engine::config::RunConfig;
use crate::engine::error::EngineError;
use crate::engine::format::format_results;
use crate::engine::output::write_results;
use crate::engine::predictor::AffinityPredictor;
use crate::engine::progress::ProgressReporter;
use crate::engine::reconcile::reconcile;
use crate::engine::state::{RunState, StateTracker};
use std::io::Write;
use tracing::{debug, info, instrument};

/// Runs a full prediction: resolve, reconcile, predict, format, write.
///
/// Any error moves the run to [`RunState::Failed`] and is returned unchanged. Nothing is
/// written unless every earlier stage succeeded. The returned result set is the one that
/// was written.
#[instrument(skip_all, name = "predict_workflow")]
pub fn run<W: Write>(
    proteins: &[String],
    molecules: &[String],
    config: &RunConfig,
    predictor: &dyn AffinityPredictor,
    reporter: &ProgressReporter,
    console: &mut W,
) -> Result<ResultSet, EngineError> {
    let mut tracker = StateTracker::start(reporter);
    match execute(&mut tracker, proteins, molecules, config, predictor, console) {
        Ok(results) => {
            info!(
                "Workflow complete. Wrote {} prediction(s) to {}.",
                results.len(),
                config.output.target
            );
            Ok(results)
        }
        Err(err) => Err(tracker.fail(err)),
    }
}

fn execute<W: Write>(
    tracker: &mut StateTracker,
    proteins: &[String],
    molecules: &[String],
    config: &RunConfig,
    predictor: &dyn AffinityPredictor,
    console: &mut W,
) -> Result<ResultSet, EngineError> {
    // === Parsing inputs ===
    let (proteins, molecules) =
        parse_inputs(proteins, molecules, &config.input, tracker.reporter())?;
    tracker.advance()?;

    // === Reconciling ===
    let (proteins, molecules) = reconcile(proteins, molecules)?;
    debug!(pairs = proteins.len(), "Inputs reconciled");
    tracker.advance()?;

    // === Predicting ===
    let predictions = predictor.predict(proteins.as_slice(), molecules.as_slice())?;
    tracker.advance()?;

    // === Formatting ===
    let results = format_results(&predictions, &proteins, &molecules)?;
    tracker.advance()?;

    // === Writing ===
    write_results(&results, &config.output, console)?;
    if tracker.advance()? != &RunState::Done {
        return Err(EngineError::Internal(
            "run did not reach its final state after writing".into(),
        ));
    }

    Ok(results)
}
