use crate::core::io::traits::ExtractOptions;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_LITERAL_LENGTH_THRESHOLD: usize = 50;
pub const DEFAULT_PRECISION: usize = 4;
const MAX_PRECISION: usize = 17;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

/// Serialization used for a result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Lines,
    Json,
    Csv,
}

/// Where results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Console,
    File { path: PathBuf, format: OutputFormat },
}

impl OutputTarget {
    /// `stdout` and `-` select the console. Anything else is a file whose extension picks the
    /// serialization (`.json`, `.csv`, otherwise one text line per record).
    pub fn from_argument(argument: &str) -> Self {
        if argument == "stdout" || argument == "-" {
            return OutputTarget::Console;
        }
        let path = PathBuf::from(argument);
        let format = match Self::extension(&path).as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Lines,
        };
        OutputTarget::File { path, format }
    }

    fn extension(path: &Path) -> String {
        path.extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default()
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Console => f.write_str("stdout"),
            OutputTarget::File { path, .. } => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputConfig {
    pub literal_length_threshold: usize,
    pub extract: ExtractOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub target: OutputTarget,
    pub precision: usize,
}

/// Validated settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Default)]
pub struct RunConfigBuilder {
    literal_length_threshold: Option<usize>,
    warn_skipped_residues: Option<bool>,
    output: Option<OutputTarget>,
    precision: Option<usize>,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literal_length_threshold(mut self, threshold: usize) -> Self {
        self.literal_length_threshold = Some(threshold);
        self
    }
    pub fn warn_skipped_residues(mut self, warn: bool) -> Self {
        self.warn_skipped_residues = Some(warn);
        self
    }
    pub fn output(mut self, target: OutputTarget) -> Self {
        self.output = Some(target);
        self
    }
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn build(self) -> Result<RunConfig, ConfigError> {
        let literal_length_threshold = self
            .literal_length_threshold
            .ok_or(ConfigError::MissingParameter("literal_length_threshold"))?;
        if literal_length_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "literal_length_threshold",
                reason: "must be greater than zero".into(),
            });
        }
        let precision = self
            .precision
            .ok_or(ConfigError::MissingParameter("precision"))?;
        if precision > MAX_PRECISION {
            return Err(ConfigError::InvalidValue {
                parameter: "precision",
                reason: format!("must be at most {}", MAX_PRECISION),
            });
        }

        Ok(RunConfig {
            input: InputConfig {
                literal_length_threshold,
                extract: ExtractOptions {
                    warn_on_skipped: self
                        .warn_skipped_residues
                        .ok_or(ConfigError::MissingParameter("warn_skipped_residues"))?,
                },
            },
            output: OutputConfig {
                target: self.output.ok_or(ConfigError::MissingParameter("output"))?,
                precision,
            },
        })
    }
}
