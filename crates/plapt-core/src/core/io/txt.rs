use super::error::FormatError;
use super::traits::{ExtractOptions, MoleculeFormat, ProteinFormat};
use std::io::BufRead;

/// Plain text: one already-canonical entry per non-blank line.
pub struct TextFile;

fn read_lines(reader: &mut impl BufRead) -> Result<Vec<String>, FormatError> {
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            entries.push(trimmed.to_string());
        }
    }
    if entries.is_empty() {
        return Err(FormatError::NoRecords);
    }
    Ok(entries)
}

impl ProteinFormat for TextFile {
    const FORMAT: &'static str = "txt";

    fn read_sequences(
        reader: &mut impl BufRead,
        _options: &ExtractOptions,
    ) -> Result<Vec<String>, FormatError> {
        read_lines(reader)
    }
}

impl MoleculeFormat for TextFile {
    const FORMAT: &'static str = "txt";

    fn read_molecules(
        reader: &mut impl BufRead,
        _options: &ExtractOptions,
    ) -> Result<Vec<String>, FormatError> {
        read_lines(reader)
    }
}
