//! Ring perception.
//!
//! Each ring bond contributes the shortest cycle running through it. For the molecules seen
//! here this yields the smallest set of smallest rings plus any equally small alternatives,
//! which is what aromaticity and double-bond stereo need.

use crate::core::models::molecule::MolGraph;
use std::collections::VecDeque;

/// A simple cycle as sorted atom and bond index lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ring {
    pub atoms: Vec<usize>,
    pub bonds: Vec<usize>,
}

impl Ring {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn shared_bond_count(&self, other: &Ring) -> usize {
        self.bonds
            .iter()
            .filter(|b| other.bonds.binary_search(b).is_ok())
            .count()
    }
}

/// Shortest path from `from` to `to` that avoids `excluded`, as the bond indices walked.
fn shortest_path_avoiding(
    graph: &MolGraph,
    from: usize,
    to: usize,
    excluded: usize,
) -> Option<Vec<usize>> {
    let mut via: Vec<Option<(usize, usize)>> = vec![None; graph.atom_count()];
    let mut seen = vec![false; graph.atom_count()];
    let mut queue = VecDeque::from([from]);
    seen[from] = true;
    while let Some(atom) = queue.pop_front() {
        if atom == to {
            let mut bonds = Vec::new();
            let mut cursor = to;
            while let Some((previous, bond)) = via[cursor] {
                bonds.push(bond);
                cursor = previous;
            }
            return Some(bonds);
        }
        for &(next, bond) in graph.neighbors(atom) {
            if bond == excluded || seen[next] {
                continue;
            }
            seen[next] = true;
            via[next] = Some((atom, bond));
            queue.push_back(next);
        }
    }
    None
}

/// `true` for every bond that lies on a cycle.
pub fn ring_bonds(graph: &MolGraph) -> Vec<bool> {
    graph
        .bonds()
        .iter()
        .enumerate()
        .map(|(index, bond)| shortest_path_avoiding(graph, bond.atom1, bond.atom2, index).is_some())
        .collect()
}

/// The distinct smallest rings through every ring bond, sorted by size.
pub fn smallest_rings(graph: &MolGraph) -> Vec<Ring> {
    let mut rings: Vec<Ring> = Vec::new();
    for (index, bond) in graph.bonds().iter().enumerate() {
        let Some(mut bonds) = shortest_path_avoiding(graph, bond.atom1, bond.atom2, index) else {
            continue;
        };
        bonds.push(index);
        bonds.sort_unstable();
        let mut atoms: Vec<usize> = bonds
            .iter()
            .flat_map(|b| [graph.bond(*b).atom1, graph.bond(*b).atom2])
            .collect();
        atoms.sort_unstable();
        atoms.dedup();
        let ring = Ring { atoms, bonds };
        if !rings.contains(&ring) {
            rings.push(ring);
        }
    }
    rings.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    rings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::element::Element;
    use crate::core::models::molecule::{Atom, BondOrder};

    fn carbons(n: usize, bonds: &[(usize, usize)]) -> MolGraph {
        let mut g = MolGraph::new();
        for _ in 0..n {
            g.add_atom(Atom::new(Element::CARBON));
        }
        for &(a, b) in bonds {
            g.add_bond(a, b, BondOrder::Single);
        }
        g
    }

    #[test]
    fn chains_have_no_rings() {
        let g = carbons(3, &[(0, 1), (1, 2)]);
        assert!(ring_bonds(&g).iter().all(|r| !r));
        assert!(smallest_rings(&g).is_empty());
    }

    #[test]
    fn fused_bicycle_yields_both_small_rings() {
        // Bicyclo[4.4.0]decane: two six-membered rings sharing the 0-5 bond.
        let g = carbons(
            10,
            &[
                (0, 1),
                (1, 2),
                (2, 3),
                (3, 4),
                (4, 5),
                (5, 0),
                (5, 6),
                (6, 7),
                (7, 8),
                (8, 9),
                (9, 0),
            ],
        );
        let rings = smallest_rings(&g);
        assert_eq!(rings.len(), 2);
        assert!(rings.iter().all(|r| r.len() == 6));
        assert_eq!(rings[0].shared_bond_count(&rings[1]), 1);
    }

    #[test]
    fn substituent_bonds_are_not_ring_bonds() {
        // Methylcyclopropane.
        let g = carbons(4, &[(0, 1), (1, 2), (2, 0), (0, 3)]);
        assert_eq!(ring_bonds(&g), vec![true, true, true, false]);
    }
}
