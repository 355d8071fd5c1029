use super::error::FormatError;
use super::traits::{ExtractOptions, ProteinFormat};
use std::io::BufRead;
use tracing::debug;

/// FASTA reader: one sequence per `>` record.
pub struct FastaFile;

impl ProteinFormat for FastaFile {
    const FORMAT: &'static str = "fasta";

    fn read_sequences(
        reader: &mut impl BufRead,
        _options: &ExtractOptions,
    ) -> Result<Vec<String>, FormatError> {
        let mut sequences = Vec::new();
        let mut current: Option<String> = None;

        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.starts_with(';') {
                continue;
            }
            if let Some(header) = trimmed.strip_prefix('>') {
                if let Some(sequence) = current.take().filter(|s| !s.is_empty()) {
                    sequences.push(sequence);
                }
                debug!(header = header.trim(), "FASTA record");
                current = Some(String::new());
                continue;
            }
            // Lines before the first header belong to no record.
            if let Some(sequence) = current.as_mut() {
                sequence.extend(trimmed.chars().filter(|c| !c.is_whitespace()));
            }
        }
        if let Some(sequence) = current.filter(|s| !s.is_empty()) {
            sequences.push(sequence);
        }

        if sequences.is_empty() {
            return Err(FormatError::NoRecords);
        }
        Ok(sequences)
    }
}
