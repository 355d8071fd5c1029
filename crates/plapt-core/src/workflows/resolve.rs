use crate::core::models::input::{Domain, InputSet};
use crate::engine::config::InputConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::reconcile::reconcile;
use crate::engine::resolver::InputResolver;
use tracing::{info, instrument};

/// Canonical inputs after reconciliation. Both sets have the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPairs {
    pub proteins: InputSet,
    pub molecules: InputSet,
}

impl ResolvedPairs {
    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.proteins.iter().zip(self.molecules.iter())
    }
}

pub(crate) fn parse_inputs(
    proteins: &[String],
    molecules: &[String],
    config: &InputConfig,
    reporter: &ProgressReporter,
) -> Result<(InputSet, InputSet), EngineError> {
    let resolver = InputResolver::new(config);
    let proteins = resolver.resolve(proteins, Domain::Protein)?;
    let molecules = resolver.resolve(molecules, Domain::Molecule)?;
    info!(
        proteins = proteins.len(),
        molecules = molecules.len(),
        "Inputs resolved"
    );
    reporter.message(format!(
        "Resolved {} protein(s) and {} molecule(s)",
        proteins.len(),
        molecules.len()
    ));
    Ok((proteins, molecules))
}

#[instrument(skip_all, name = "resolve_workflow")]
pub fn run(
    proteins: &[String],
    molecules: &[String],
    config: &InputConfig,
    reporter: &ProgressReporter,
) -> Result<ResolvedPairs, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Parsing inputs",
    });
    let parsed = parse_inputs(proteins, molecules, config, reporter);
    reporter.report(Progress::PhaseFinish);
    let (proteins, molecules) = parsed?;

    reporter.report(Progress::PhaseStart {
        name: "Reconciling",
    });
    let reconciled = reconcile(proteins, molecules);
    reporter.report(Progress::PhaseFinish);
    let (proteins, molecules) = reconciled?;

    info!("Resolved {} input pair(s).", proteins.len());
    Ok(ResolvedPairs {
        proteins,
        molecules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::traits::ExtractOptions;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn config() -> InputConfig {
        InputConfig {
            literal_length_threshold: 50,
            extract: ExtractOptions::default(),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn literal_inputs_pass_through_and_broadcast() {
        let pairs = run(
            &strings(&["MKT"]),
            &strings(&["OCC", "c1ccccc1"]),
            &config(),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(pairs.len(), 2);
        let collected: Vec<_> = pairs.iter().collect();
        assert_eq!(collected[0].0, "MKT");
        assert_eq!(collected[1].0, "MKT");
        assert_eq!(collected[0].1, "OCC");
        assert_eq!(collected[1].1, "c1ccccc1");
    }

    #[test]
    fn fasta_file_expands_to_many_proteins() {
        let mut fasta = tempfile::Builder::new().suffix(".fasta").tempfile().unwrap();
        writeln!(fasta, ">a\nMKT\n>b\nGAV\n>c\nPLW").unwrap();
        let path = fasta.path().to_string_lossy().into_owned();
        let pairs = run(&[path], &strings(&["CCO"]), &config(), &ProgressReporter::new())
            .unwrap();
        assert_eq!(pairs.proteins.as_slice(), &strings(&["MKT", "GAV", "PLW"])[..]);
        assert_eq!(pairs.molecules.as_slice(), &strings(&["CCO", "CCO", "CCO"])[..]);
    }

    #[test]
    fn mismatched_lengths_fail() {
        let err = run(
            &strings(&["MKT", "GAV"]),
            &strings(&["C", "CC", "CCC"]),
            &config(),
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::CardinalityMismatch {
                proteins: 2,
                molecules: 3
            }
        ));
    }

    #[test]
    fn resolved_counts_are_reported_as_a_message() {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if let Progress::Message(text) = event {
                sink.lock().unwrap().push(text);
            }
        }));
        run(
            &strings(&["MKT"]),
            &strings(&["OCC", "c1ccccc1"]),
            &config(),
            &reporter,
        )
        .unwrap();
        assert_eq!(
            *messages.lock().unwrap(),
            vec!["Resolved 1 protein(s) and 2 molecule(s)".to_string()]
        );
    }
}
