//! Hückel aromaticity perception.
//!
//! Kekulé and lowercase inputs of the same molecule converge on one aromatic graph. Small
//! rings and pairs of rings fused through a single bond are tested for a 4n+2 pi-electron
//! count; passing rings have every atom flagged aromatic and every bond set to
//! [`BondOrder::Aromatic`]. Hydrogen counts must be final before this runs.

use super::rings::{Ring, ring_bonds, smallest_rings};
use super::valence::can_be_aromatic;
use crate::core::models::molecule::{BondOrder, MolGraph};

const MAX_RING_SIZE: usize = 8;

/// Pi electrons an atom donates to a ring, or `None` if it cannot be part of one.
fn pi_electrons(graph: &MolGraph, atom: usize, ring_bond: &[bool]) -> Option<u32> {
    let a = graph.atom(atom);
    if !can_be_aromatic(a.element) {
        return None;
    }
    let connections = graph.degree(atom) + usize::from(a.hydrogens);
    if connections > 3 {
        return None;
    }

    let mut double = None;
    let mut aromatic_bonds = 0;
    for &(neighbor, bond) in graph.neighbors(atom) {
        match graph.bond(bond).order {
            BondOrder::Triple => return None,
            BondOrder::Double if double.is_some() => return None,
            BondOrder::Double => double = Some((neighbor, bond)),
            BondOrder::Aromatic => aromatic_bonds += 1,
            BondOrder::Single => {}
        }
    }

    let number = a.element.atomic_number();
    if let Some((partner, bond)) = double {
        if ring_bond[bond] {
            return Some(1);
        }
        // Exocyclic C=O, C=N and C=S leave the carbon's p orbital empty.
        let polar = matches!(graph.atom(partner).element.atomic_number(), 7 | 8 | 16);
        return (number == 6 && polar).then_some(0);
    }

    let lone_pair = match (number, a.charge) {
        (7 | 15 | 33, 0) => connections == 3,
        (8 | 16 | 34 | 52, 0) => connections == 2,
        (6, -1) | (7, -1) => true,
        _ => false,
    };
    if lone_pair {
        return Some(2);
    }
    if aromatic_bonds > 0 {
        return Some(1);
    }
    match (number, a.charge) {
        (6, 1) | (5, 0) => Some(0),
        _ => None,
    }
}

fn fuse(a: &Ring, b: &Ring) -> Ring {
    let mut atoms: Vec<usize> = a.atoms.iter().chain(&b.atoms).copied().collect();
    atoms.sort_unstable();
    atoms.dedup();
    let mut bonds: Vec<usize> = a.bonds.iter().chain(&b.bonds).copied().collect();
    bonds.sort_unstable();
    bonds.dedup();
    Ring { atoms, bonds }
}

/// Flags aromatic rings and normalizes aromatic bonds that do not lie on a ring to single.
pub fn perceive_aromaticity(graph: &mut MolGraph) {
    let ring_bond = ring_bonds(graph);
    for (index, in_ring) in ring_bond.iter().enumerate() {
        if !in_ring && graph.bond(index).order == BondOrder::Aromatic {
            graph.bond_mut(index).order = BondOrder::Single;
        }
    }

    let rings: Vec<Ring> = smallest_rings(graph)
        .into_iter()
        .filter(|ring| ring.len() <= MAX_RING_SIZE)
        .collect();
    let mut candidates = rings.clone();
    for (i, first) in rings.iter().enumerate() {
        for second in &rings[i + 1..] {
            if first.shared_bond_count(second) == 1 {
                candidates.push(fuse(first, second));
            }
        }
    }

    let electrons: Vec<Option<u32>> = (0..graph.atom_count())
        .map(|atom| pi_electrons(graph, atom, &ring_bond))
        .collect();
    let mut aromatic_atoms = vec![false; graph.atom_count()];
    let mut aromatic_bonds = vec![false; graph.bonds().len()];
    for ring in &candidates {
        let Some(total) = ring.atoms.iter().map(|a| electrons[*a]).sum::<Option<u32>>() else {
            continue;
        };
        if total % 4 != 2 {
            continue;
        }
        for &atom in &ring.atoms {
            aromatic_atoms[atom] = true;
        }
        for &bond in &ring.bonds {
            aromatic_bonds[bond] = true;
        }
    }

    for (atom, aromatic) in aromatic_atoms.into_iter().enumerate() {
        if aromatic {
            graph.atom_mut(atom).aromatic = true;
        }
    }
    for (bond, aromatic) in aromatic_bonds.into_iter().enumerate() {
        if aromatic {
            let bond = graph.bond_mut(bond);
            bond.order = BondOrder::Aromatic;
            bond.stereo = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles::parse_smiles;

    fn perceived(smiles: &str) -> MolGraph {
        let mut g = parse_smiles(smiles).unwrap();
        perceive_aromaticity(&mut g);
        g
    }

    fn aromatic_count(g: &MolGraph) -> usize {
        g.atoms().iter().filter(|a| a.aromatic).count()
    }

    #[test]
    fn kekule_benzene_becomes_aromatic() {
        let g = perceived("C1=CC=CC=C1");
        assert_eq!(aromatic_count(&g), 6);
        assert!(g.bonds().iter().all(|b| b.order == BondOrder::Aromatic));
        assert!(g.atoms().iter().all(|a| a.hydrogens == 1));
    }

    #[test]
    fn heteroaromatic_rings_use_lone_pairs() {
        assert_eq!(aromatic_count(&perceived("C1=CNC=C1")), 5);
        assert_eq!(aromatic_count(&perceived("C1=COC=C1")), 5);
        assert_eq!(aromatic_count(&perceived("C1=CSC=C1")), 5);
        assert_eq!(aromatic_count(&perceived("O=C1C=CC=CN1")), 6);
    }

    #[test]
    fn fused_rings_are_perceived() {
        assert_eq!(aromatic_count(&perceived("C1=CC=C2C=CC=CC2=C1")), 10);
        assert_eq!(aromatic_count(&perceived("C1=CC=C2C(=C1)C=CN2")), 9);
    }

    #[test]
    fn non_aromatic_rings_are_left_alone() {
        assert_eq!(aromatic_count(&perceived("C1=CCC=C1")), 0);
        assert_eq!(aromatic_count(&perceived("C1=CC=CC1")), 0);
        assert_eq!(aromatic_count(&perceived("O=C1C=CC(=O)C=C1")), 0);
        assert_eq!(aromatic_count(&perceived("C1CCCCC1")), 0);
    }

    #[test]
    fn aromatic_bonds_between_rings_become_single() {
        let g = perceived("c1ccccc1c1ccccc1");
        let link = g.bond_between(5, 6).unwrap();
        assert_eq!(g.bond(link).order, BondOrder::Single);
    }
}
