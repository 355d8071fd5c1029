use crate::error::{CliError, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FilePredictorConfig {
    pub endpoint: Option<String>,
    #[serde(rename = "batch-size")]
    pub batch_size: Option<usize>,
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileInputConfig {
    #[serde(rename = "literal-length-threshold")]
    pub literal_length_threshold: Option<usize>,
    #[serde(rename = "warn-skipped-residues")]
    pub warn_skipped_residues: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileOutputConfig {
    pub precision: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub predictor: Option<FilePredictorConfig>,
    pub input: Option<FileInputConfig>,
    pub output: Option<FileOutputConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the explicit file if given, otherwise the per-user default when it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                debug!("No configuration file found, using built-in defaults.");
                Ok(Self::default())
            }
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "plapt").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_kebab_case_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plapt.toml");
        fs::write(
            &path,
            r#"
            [predictor]
            endpoint = "http://gpu-box:9000/predict"
            batch-size = 16

            [input]
            literal-length-threshold = 80
            warn-skipped-residues = false

            [output]
            precision = 6
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        let predictor = config.predictor.unwrap();
        assert_eq!(predictor.endpoint.as_deref(), Some("http://gpu-box:9000/predict"));
        assert_eq!(predictor.batch_size, Some(16));
        assert_eq!(predictor.timeout_secs, None);
        let input = config.input.unwrap();
        assert_eq!(input.literal_length_threshold, Some(80));
        assert_eq!(input.warn_skipped_residues, Some(false));
        assert_eq!(config.output.unwrap().precision, Some(6));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plapt.toml");
        fs::write(&path, "[predictor]\nbatch_size = 3\n").unwrap();
        assert!(matches!(
            FileConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = FileConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CliError::Io(_))));
    }

    #[test]
    fn default_path_ends_with_config_file_name() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("config.toml"));
        }
    }
}
