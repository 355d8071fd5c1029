use super::error::{ExtractError, FormatError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Per-call extraction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Emit a warning for every residue or atom line skipped while building a sequence.
    pub warn_on_skipped: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            warn_on_skipped: true,
        }
    }
}

/// A file format that yields protein sequences.
pub trait ProteinFormat {
    /// Lowercase format name used in error messages.
    const FORMAT: &'static str;

    /// Reads every sequence from a buffered reader, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::NoRecords`] or [`FormatError::NoResidues`] when nothing usable
    /// is found, and other variants when the stream cannot be read.
    fn read_sequences(
        reader: &mut impl BufRead,
        options: &ExtractOptions,
    ) -> Result<Vec<String>, FormatError>;

    /// Opens `path` and reads every sequence from it.
    fn read_sequences_from_path(
        path: &Path,
        options: &ExtractOptions,
    ) -> Result<Vec<String>, ExtractError> {
        let file = File::open(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        Self::read_sequences(&mut reader, options)
            .map_err(|e| e.at_path(path.to_path_buf(), Self::FORMAT))
    }
}

/// A file format that yields small-molecule descriptors (canonical SMILES).
pub trait MoleculeFormat {
    const FORMAT: &'static str;

    /// Reads every molecule descriptor from a buffered reader, in file order.
    fn read_molecules(
        reader: &mut impl BufRead,
        options: &ExtractOptions,
    ) -> Result<Vec<String>, FormatError>;

    fn read_molecules_from_path(
        path: &Path,
        options: &ExtractOptions,
    ) -> Result<Vec<String>, ExtractError> {
        let file = File::open(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        Self::read_molecules(&mut reader, options)
            .map_err(|e| e.at_path(path.to_path_buf(), Self::FORMAT))
    }
}
