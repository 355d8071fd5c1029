use super::cif::CifFile;
use super::error::ExtractError;
use super::fasta::FastaFile;
use super::pdb::PdbFile;
use super::sdf::SdfFile;
use super::traits::{ExtractOptions, MoleculeFormat, ProteinFormat};
use super::txt::TextFile;
use crate::core::models::input::Domain;
use std::path::Path;
use tracing::debug;

type Handler = fn(&Path, &ExtractOptions) -> Result<Vec<String>, ExtractError>;

static PROTEIN_HANDLERS: &[(&str, Handler)] = &[
    ("fasta", FastaFile::read_sequences_from_path),
    ("pdb", PdbFile::read_sequences_from_path),
    ("sdf", SdfFile::read_sequences_from_path),
    ("txt", TextFile::read_sequences_from_path),
];

static MOLECULE_HANDLERS: &[(&str, Handler)] = &[
    ("sdf", SdfFile::read_molecules_from_path),
    ("pdb", PdbFile::read_molecules_from_path),
    ("cif", CifFile::read_molecules_from_path),
    ("txt", TextFile::read_molecules_from_path),
];

fn handlers(domain: Domain) -> &'static [(&'static str, Handler)] {
    match domain {
        Domain::Protein => PROTEIN_HANDLERS,
        Domain::Molecule => MOLECULE_HANDLERS,
    }
}

/// Lowercase extension without the leading dot, or an empty string.
pub fn normalized_extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Extensions accepted for a domain, in table order.
pub fn supported_extensions(domain: Domain) -> impl Iterator<Item = &'static str> {
    handlers(domain).iter().map(|(ext, _)| *ext)
}

/// Extracts canonical strings from a file, choosing the reader by extension.
///
/// # Errors
///
/// Returns [`ExtractError::UnsupportedFormat`] when the extension has no reader for the
/// domain, and the reader's error otherwise.
pub fn extract_file(
    path: &Path,
    domain: Domain,
    options: &ExtractOptions,
) -> Result<Vec<String>, ExtractError> {
    let extension = normalized_extension(path);
    let handler = handlers(domain)
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, handler)| *handler)
        .ok_or_else(|| ExtractError::UnsupportedFormat {
            extension: extension.clone(),
            domain,
        })?;
    debug!(path = %path.display(), %domain, format = %extension, "Extracting file input");
    handler(path, options)
}
