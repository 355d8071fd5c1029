use super::error::EngineError;
use crate::core::models::input::InputSet;
use tracing::debug;

/// Aligns proteins and molecules into equal-length sequences.
///
/// A single-element side is repeated to match the other side. Equal lengths pass through
/// unchanged. Any other combination is a [`EngineError::CardinalityMismatch`].
pub fn reconcile(
    proteins: InputSet,
    molecules: InputSet,
) -> Result<(InputSet, InputSet), EngineError> {
    let (p, m) = (proteins.len(), molecules.len());
    if p == m {
        return Ok((proteins, molecules));
    }
    if p == 1 {
        if let Some(broadcast) = proteins.broadcast(m) {
            debug!(count = m, "Broadcasting single protein");
            return Ok((broadcast, molecules));
        }
    }
    if m == 1 {
        if let Some(broadcast) = molecules.broadcast(p) {
            debug!(count = p, "Broadcasting single molecule");
            return Ok((proteins, broadcast));
        }
    }
    Err(EngineError::CardinalityMismatch {
        proteins: p,
        molecules: m,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> InputSet {
        InputSet::new(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn single_protein_is_broadcast() {
        let (p, m) = reconcile(set(&["P"]), set(&["M1", "M2", "M3"])).unwrap();
        assert_eq!(p, set(&["P", "P", "P"]));
        assert_eq!(m, set(&["M1", "M2", "M3"]));
    }

    #[test]
    fn single_molecule_is_broadcast() {
        let (p, m) = reconcile(set(&["P1", "P2"]), set(&["M"])).unwrap();
        assert_eq!(p, set(&["P1", "P2"]));
        assert_eq!(m, set(&["M", "M"]));
    }

    #[test]
    fn equal_lengths_are_unchanged() {
        let (p, m) = reconcile(set(&["P1", "P2"]), set(&["M1", "M2"])).unwrap();
        assert_eq!(p, set(&["P1", "P2"]));
        assert_eq!(m, set(&["M1", "M2"]));
        let (p, m) = reconcile(set(&["P"]), set(&["M"])).unwrap();
        assert_eq!((p.len(), m.len()), (1, 1));
    }

    #[test]
    fn mismatched_lengths_fail() {
        let err = reconcile(set(&["P1", "P2"]), set(&["M1", "M2", "M3"])).unwrap_err();
        assert!(matches!(
            err,
            EngineError::CardinalityMismatch {
                proteins: 2,
                molecules: 3
            }
        ));
    }
}
