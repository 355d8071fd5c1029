//! Literal-versus-file classification of raw input tokens.
//!
//! A token is literal data when it contains a newline or is longer than the configured
//! threshold (in characters). Only shorter single-line tokens are looked up on the filesystem,
//! and only a regular file at that path makes them a file reference; failed lookups count as
//! literal. The checks run in that order, so long sequences never touch the filesystem.

use super::config::InputConfig;
use super::error::EngineError;
use crate::core::io::dispatch::extract_file;
use crate::core::models::input::{Domain, InputSet, RawInputItem};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub fn is_likely_file_path(token: &str, threshold: usize) -> bool {
    if token.contains('\n') || token.chars().count() > threshold {
        return false;
    }
    Path::new(token).is_file()
}

pub fn classify(token: &str, threshold: usize) -> RawInputItem {
    if is_likely_file_path(token, threshold) {
        RawInputItem::File(PathBuf::from(token))
    } else {
        RawInputItem::Literal(token.to_string())
    }
}

/// Turns raw tokens into an [`InputSet`] of canonical strings.
pub struct InputResolver<'a> {
    config: &'a InputConfig,
}

impl<'a> InputResolver<'a> {
    pub fn new(config: &'a InputConfig) -> Self {
        Self { config }
    }

    pub fn resolve(&self, raw: &[String], domain: Domain) -> Result<InputSet, EngineError> {
        let items: Vec<RawInputItem> = raw
            .iter()
            .map(|token| classify(token, self.config.literal_length_threshold))
            .collect();

        match items.as_slice() {
            [] => Err(EngineError::EmptyInput { domain }),
            [RawInputItem::File(path)] => {
                info!(path = %path.display(), %domain, "Reading {} from file", domain.plural());
                let entries = extract_file(path, domain, &self.config.extract)?;
                debug!(count = entries.len(), %domain, "Extracted entries");
                Ok(InputSet::new(entries))
            }
            items if items.iter().any(RawInputItem::is_file) => {
                Err(EngineError::AmbiguousInput { domain })
            }
            _ => Ok(InputSet::new(raw.to_vec())),
        }
    }
}
