use super::element::Element;
use crate::core::models::molecule::{BondOrder, MolGraph};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValenceError {
    #[error("Explicit valence {valence} for atom #{atom} ({element}) exceeds the allowed maximum")]
    Exceeded {
        atom: usize,
        element: Element,
        valence: u8,
    },
}

/// Default valences in ascending order. Empty for elements without a valence model.
pub fn default_valences(element: Element) -> &'static [u8] {
    match element.atomic_number() {
        1 => &[1],
        5 => &[3],
        6 => &[4],
        7 => &[3, 5],
        8 => &[2],
        9 | 17 | 35 | 53 => &[1],
        14 => &[4],
        15 => &[3, 5],
        16 => &[2, 4, 6],
        33 => &[3, 5],
        34 => &[2, 4, 6],
        _ => &[],
    }
}

/// Elements that SMILES may write without brackets.
pub fn is_organic_subset(element: Element) -> bool {
    matches!(element.atomic_number(), 5 | 6 | 7 | 8 | 9 | 15 | 16 | 17 | 35 | 53)
}

/// Elements that SMILES may write in lowercase (aromatic) form.
pub fn can_be_aromatic(element: Element) -> bool {
    matches!(element.atomic_number(), 5 | 6 | 7 | 8 | 15 | 16 | 33 | 34 | 52)
}

/// Valence consumed by the bonds of an atom, hydrogens excluded.
///
/// Aromatic bonds count one each, plus one extra for the delocalized system.
pub fn bond_valence(graph: &MolGraph, atom: usize) -> u8 {
    let mut total: u8 = 0;
    let mut aromatic_bonds: u8 = 0;
    for &(_, bond) in graph.neighbors(atom) {
        match graph.bond(bond).order {
            BondOrder::Aromatic => aromatic_bonds = aromatic_bonds.saturating_add(1),
            order => total = total.saturating_add(order.valence()),
        }
    }
    if aromatic_bonds > 0 {
        total = total.saturating_add(aromatic_bonds + 1);
    }
    total
}

fn shifted_valence(element: Element, base: u8, charge: i8) -> Option<u8> {
    let shifted = match element.atomic_number() {
        5 => i16::from(base) - i16::from(charge),
        6 | 14 => i16::from(base) - i16::from(charge).abs(),
        _ => i16::from(base) + i16::from(charge),
    };
    u8::try_from(shifted).ok()
}

/// Hydrogen count implied for an atom written without brackets in SMILES.
pub fn implied_hydrogens(graph: &MolGraph, atom: usize) -> u8 {
    let a = graph.atom(atom);
    if !is_organic_subset(a.element) {
        return 0;
    }
    let used = bond_valence(graph, atom);
    let valences = default_valences(a.element);
    if a.aromatic {
        return valences.first().map_or(0, |v| v.saturating_sub(used));
    }
    valences
        .iter()
        .find(|v| **v >= used)
        .map_or(0, |v| v - used)
}

/// Fills hydrogens up to the charge-adjusted default valence for every atom that has a
/// valence model. Existing hydrogen counts are kept.
pub fn fill_implicit_hydrogens(graph: &mut MolGraph) {
    for index in 0..graph.atom_count() {
        let atom = graph.atom(index);
        let used = bond_valence(graph, index).saturating_add(atom.hydrogens);
        let candidates = default_valences(atom.element);
        let target = if atom.aromatic {
            candidates
                .first()
                .and_then(|v| shifted_valence(atom.element, *v, atom.charge))
        } else {
            candidates
                .iter()
                .filter_map(|v| shifted_valence(atom.element, *v, atom.charge))
                .find(|v| *v >= used)
        };
        if let Some(target) = target {
            let extra = target.saturating_sub(used);
            graph.atom_mut(index).hydrogens += extra;
        }
    }
}

/// Rejects atoms whose total valence exceeds the largest charge-adjusted default valence.
pub fn check_valence(graph: &MolGraph) -> Result<(), ValenceError> {
    for (index, atom) in graph.atoms().iter().enumerate() {
        let Some(max) = default_valences(atom.element)
            .iter()
            .filter_map(|v| shifted_valence(atom.element, *v, atom.charge))
            .max()
        else {
            continue;
        };
        let valence = bond_valence(graph, index).saturating_add(atom.hydrogens);
        if valence > max {
            return Err(ValenceError::Exceeded {
                atom: index,
                element: atom.element,
                valence,
            });
        }
    }
    Ok(())
}
