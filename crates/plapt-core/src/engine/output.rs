use super::config::{OutputConfig, OutputFormat, OutputTarget};
use super::error::EngineError;
use crate::core::io::results::{ResultsError, write_csv, write_json, write_lines};
use crate::core::models::prediction::PredictionRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::info;

/// Writes a finished result set to its configured target.
///
/// Console output goes to `console`. File targets are created only here, after every record
/// has been formatted, so a failed run never leaves a partial file behind.
pub fn write_results<W: Write>(
    records: &[PredictionRecord],
    config: &OutputConfig,
    console: &mut W,
) -> Result<(), EngineError> {
    let to_output_error = |source: ResultsError| EngineError::Output {
        target: config.target.to_string(),
        source,
    };

    match &config.target {
        OutputTarget::Console => {
            write_lines(records, config.precision, console).map_err(to_output_error)
        }
        OutputTarget::File { path, format } => {
            let file = File::create(path).map_err(|e| to_output_error(e.into()))?;
            let mut writer = BufWriter::new(file);
            match format {
                OutputFormat::Json => write_json(records, &mut writer),
                OutputFormat::Csv => write_csv(records, &mut writer),
                OutputFormat::Lines => write_lines(records, config.precision, &mut writer),
            }
            .map_err(to_output_error)?;
            info!(path = %path.display(), count = records.len(), "Results written");
            Ok(())
        }
    }
}
