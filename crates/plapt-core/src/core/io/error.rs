use crate::core::models::input::Domain;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unsupported file extension for {domain} input: '{extension}'")]
    UnsupportedFormat { extension: String, domain: Domain },
    #[error("No valid amino acid sequence found in structure '{path}'")]
    EmptyStructure { path: PathBuf },
    #[error("No valid {format} records found in '{path}'")]
    EmptyFile { path: PathBuf, format: &'static str },
    #[error("Failed to parse {format} file '{path}': {message}")]
    Parse {
        format: &'static str,
        path: PathBuf,
        message: String,
    },
}

/// Path-free failure raised while reading a stream. The path-aware entry points turn it
/// into an [`ExtractError`].
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("no records")]
    NoRecords,
    #[error("no residues")]
    NoResidues,
    #[error("{0}")]
    Malformed(String),
}

impl FormatError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        FormatError::Malformed(message.into())
    }

    pub(crate) fn at_path(self, path: PathBuf, format: &'static str) -> ExtractError {
        match self {
            FormatError::Io(source) => ExtractError::Io { path, source },
            FormatError::NoRecords => ExtractError::EmptyFile { path, format },
            FormatError::NoResidues => ExtractError::EmptyStructure { path },
            FormatError::Malformed(message) => ExtractError::Parse {
                format,
                path,
                message,
            },
        }
    }
}
