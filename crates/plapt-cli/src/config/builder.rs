use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::{AppConfig, PredictorSettings};
use crate::cli::ConfigArgs;
use crate::error::{CliError, Result};
use plapt::engine::config::{self as core_config, ConfigError, OutputTarget};
use std::str::FromStr;
use std::time::Duration;

/// Values given through dedicated command-line flags. They win over every other layer.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides<'a> {
    pub endpoint: Option<&'a str>,
    pub batch_size: Option<usize>,
    pub output: Option<&'a str>,
}

pub fn build_config(args: &ConfigArgs, overrides: CliOverrides) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = FileConfig::load(args.config.as_deref())?;
    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let predictor_file = file_config.predictor.take().unwrap_or_default();
    let input_file = file_config.input.take().unwrap_or_default();
    let output_file = file_config.output.take().unwrap_or_default();

    let batch_size = overrides
        .batch_size
        .or(predictor_file.batch_size)
        .unwrap_or(defaults.batch_size);
    if batch_size == 0 {
        return Err(CliError::Config(
            ConfigError::InvalidValue {
                parameter: "predictor.batch-size",
                reason: "must be greater than zero".into(),
            }
            .to_string(),
        ));
    }

    let predictor = PredictorSettings {
        endpoint: overrides
            .endpoint
            .map(str::to_string)
            .or(predictor_file.endpoint)
            .unwrap_or(defaults.endpoint),
        batch_size,
        timeout: Duration::from_secs(
            predictor_file
                .timeout_secs
                .unwrap_or(defaults.timeout_secs),
        ),
    };

    let target = overrides
        .output
        .map(OutputTarget::from_argument)
        .unwrap_or(OutputTarget::Console);

    let run = core_config::RunConfigBuilder::new()
        .literal_length_threshold(
            input_file
                .literal_length_threshold
                .unwrap_or(defaults.literal_length_threshold),
        )
        .warn_skipped_residues(
            input_file
                .warn_skipped_residues
                .unwrap_or(defaults.warn_skipped_residues),
        )
        .precision(output_file.precision.unwrap_or(defaults.precision))
        .output(target)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig { run, predictor })
}

fn parse_value<T: FromStr>(key: &str, value_str: &str, kind: &str) -> Result<T> {
    value_str.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value_str))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();

        match key {
            "predictor.endpoint" => {
                config
                    .predictor
                    .get_or_insert_with(Default::default)
                    .endpoint = Some(value_str.trim().to_string());
            }
            "predictor.batch-size" => {
                config
                    .predictor
                    .get_or_insert_with(Default::default)
                    .batch_size = Some(parse_value(key, value_str, "integer")?);
            }
            "predictor.timeout-secs" => {
                config
                    .predictor
                    .get_or_insert_with(Default::default)
                    .timeout_secs = Some(parse_value(key, value_str, "integer")?);
            }
            "input.literal-length-threshold" => {
                config
                    .input
                    .get_or_insert_with(Default::default)
                    .literal_length_threshold = Some(parse_value(key, value_str, "integer")?);
            }
            "input.warn-skipped-residues" => {
                config
                    .input
                    .get_or_insert_with(Default::default)
                    .warn_skipped_residues = Some(parse_value(key, value_str, "boolean")?);
            }
            "output.precision" => {
                config
                    .output
                    .get_or_insert_with(Default::default)
                    .precision = Some(parse_value(key, value_str, "integer")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plapt::engine::config::OutputFormat;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    fn write_config_file(content: &str) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plapt.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn args_with(config: Option<PathBuf>, set_values: &[&str]) -> ConfigArgs {
        ConfigArgs {
            config,
            set_values: set_values.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn empty_file_args() -> (TempDir, ConfigArgs) {
        let (dir, path) = write_config_file("");
        (dir, args_with(Some(path), &[]))
    }

    #[test]
    fn empty_file_yields_defaults() {
        let (_dir, args) = empty_file_args();
        let app = build_config(&args, CliOverrides::default()).unwrap();
        assert_eq!(app.predictor.endpoint, "http://127.0.0.1:8000/predict");
        assert_eq!(app.predictor.batch_size, 4);
        assert_eq!(app.predictor.timeout, Duration::from_secs(300));
        assert_eq!(app.run.input.literal_length_threshold, 50);
        assert!(app.run.input.extract.warn_on_skipped);
        assert_eq!(app.run.output.precision, 4);
        assert_eq!(app.run.output.target, OutputTarget::Console);
    }

    #[test]
    fn file_values_override_defaults() {
        let (_dir, path) = write_config_file(
            r#"
            [predictor]
            batch-size = 32
            timeout-secs = 10

            [input]
            warn-skipped-residues = false
            "#,
        );
        let app = build_config(&args_with(Some(path), &[]), CliOverrides::default()).unwrap();
        assert_eq!(app.predictor.batch_size, 32);
        assert_eq!(app.predictor.timeout, Duration::from_secs(10));
        assert!(!app.run.input.extract.warn_on_skipped);
    }

    #[test]
    fn set_values_override_file_and_flags_override_both() {
        let (_dir, path) = write_config_file(
            r#"
            [predictor]
            endpoint = "http://from-file/predict"
            batch-size = 32
            "#,
        );
        let args = args_with(
            Some(path),
            &[
                "predictor.batch-size=2",
                "predictor.endpoint=http://from-set/predict",
                "output.precision=6",
            ],
        );

        let app = build_config(&args, CliOverrides::default()).unwrap();
        assert_eq!(app.predictor.batch_size, 2);
        assert_eq!(app.predictor.endpoint, "http://from-set/predict");
        assert_eq!(app.run.output.precision, 6);

        let app = build_config(
            &args,
            CliOverrides {
                endpoint: Some("http://from-flag/predict"),
                batch_size: Some(9),
                output: Some("results.csv"),
            },
        )
        .unwrap();
        assert_eq!(app.predictor.batch_size, 9);
        assert_eq!(app.predictor.endpoint, "http://from-flag/predict");
        assert!(matches!(
            app.run.output.target,
            OutputTarget::File { format: OutputFormat::Csv, .. }
        ));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let (_dir, args) = empty_file_args();
        let err = build_config(
            &args,
            CliOverrides {
                batch_size: Some(0),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("predictor.batch-size")));
    }

    #[test]
    fn invalid_set_values_are_rejected() {
        for bad in [
            "predictor.batch-size",
            "predictor.batch-size=many",
            "input.warn-skipped-residues=sometimes",
            "optimization.num-solutions=3",
        ] {
            let (_dir, path) = write_config_file("");
            let result = build_config(&args_with(Some(path), &[bad]), CliOverrides::default());
            assert!(matches!(result, Err(CliError::Config(_))), "{}", bad);
        }
    }

    #[test]
    fn zero_threshold_from_set_value_fails_core_validation() {
        let (_dir, path) = write_config_file("");
        let result = build_config(
            &args_with(Some(path), &["input.literal-length-threshold=0"]),
            CliOverrides::default(),
        );
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("literal_length_threshold")));
    }
}
