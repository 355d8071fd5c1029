use crate::core::models::prediction::PredictionRecord;
use serde::Serialize;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),
}

/// `protein: P, molecule: M, neg_log10_affinity_M: X, affinity_uM: Y` with both numbers
/// rounded to `precision` decimals.
pub fn format_line(record: &PredictionRecord, precision: usize) -> String {
    format!(
        "protein: {}, molecule: {}, neg_log10_affinity_M: {:.prec$}, affinity_uM: {:.prec$}",
        record.protein,
        record.molecule,
        record.neg_log10_affinity_m,
        record.affinity_um,
        prec = precision
    )
}

/// Writes one [`format_line`] per record.
pub fn write_lines(
    records: &[PredictionRecord],
    precision: usize,
    writer: &mut impl Write,
) -> Result<(), ResultsError> {
    for record in records {
        writeln!(writer, "{}", format_line(record, precision))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the records as a JSON array with four-space indentation and full precision.
pub fn write_json(records: &[PredictionRecord], writer: &mut impl Write) -> Result<(), ResultsError> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut *writer, formatter);
    records.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}

/// Writes the records as CSV with a header row.
pub fn write_csv(records: &[PredictionRecord], writer: &mut impl Write) -> Result<(), ResultsError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    if records.is_empty() {
        csv_writer.write_record(["protein", "molecule", "neg_log10_affinity_M", "affinity_uM"])?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(protein: &str, molecule: &str, log: f64, um: f64) -> PredictionRecord {
        PredictionRecord {
            protein: protein.into(),
            molecule: molecule.into(),
            neg_log10_affinity_m: log,
            affinity_um: um,
        }
    }

    #[test]
    fn console_line_rounds_to_precision() {
        let r = record("MKT", "CCO", 6.0, 1.0);
        assert_eq!(
            format_line(&r, 4),
            "protein: MKT, molecule: CCO, neg_log10_affinity_M: 6.0000, affinity_uM: 1.0000"
        );
        let r = record("A", "C", 7.123456, 0.0752);
        assert_eq!(
            format_line(&r, 2),
            "protein: A, molecule: C, neg_log10_affinity_M: 7.12, affinity_uM: 0.08"
        );
    }

    #[test]
    fn json_keeps_field_order_and_names() {
        let mut out = Vec::new();
        write_json(&[record("MKT", "CCO", 6.5, 0.31622776)], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let expected = "[\n    {\n        \"protein\": \"MKT\",\n        \"molecule\": \"CCO\",\n        \"neg_log10_affinity_M\": 6.5,\n        \"affinity_uM\": 0.31622776\n    }\n]";
        assert_eq!(text, expected);
    }

    #[test]
    fn csv_has_header_and_rows() {
        let mut out = Vec::new();
        write_csv(
            &[record("MKT", "CCO", 6.0, 1.0), record("AAA", "C", 5.5, 3.1622)],
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "protein,molecule,neg_log10_affinity_M,affinity_uM");
        assert_eq!(lines[1], "MKT,CCO,6.0,1.0");
        assert_eq!(lines[2], "AAA,C,5.5,3.1622");
    }

    #[test]
    fn csv_of_empty_result_set_is_header_only() {
        let mut out = Vec::new();
        write_csv(&[], &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "protein,molecule,neg_log10_affinity_M,affinity_uM\n"
        );
    }
}
