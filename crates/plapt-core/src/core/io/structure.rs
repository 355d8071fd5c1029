//! Shared steps for turning coordinate-only structures into canonical SMILES.

use crate::core::chem::aromaticity::perceive_aromaticity;
use crate::core::chem::stereo::perceive_from_coordinates;
use crate::core::chem::to_canonical_smiles;
use crate::core::chem::valence::fill_implicit_hydrogens;
use crate::core::models::molecule::{BondOrder, MolGraph};
use std::collections::HashMap;

/// Added to the sum of covalent radii when deciding whether two atoms are bonded.
pub const BOND_TOLERANCE: f64 = 0.45;
/// Atoms closer than this are treated as overlapping alternates, not bonded.
pub const MIN_BOND_DISTANCE: f64 = 0.40;

type Cell = (i64, i64, i64);

/// Bonds every pair of positioned atoms whose distance is below the sum of their covalent
/// radii plus [`BOND_TOLERANCE`]. Pairs that are already bonded are left untouched.
pub fn add_proximity_bonds(graph: &mut MolGraph) {
    let max_radius = graph
        .atoms()
        .iter()
        .filter(|a| a.position.is_some())
        .map(|a| a.element.covalent_radius())
        .fold(0.0_f64, f64::max);
    let cell_size = 2.0 * max_radius + BOND_TOLERANCE;
    if cell_size <= 0.0 {
        return;
    }

    let cell_of = |p: &nalgebra::Point3<f64>| -> Cell {
        (
            (p.x / cell_size).floor() as i64,
            (p.y / cell_size).floor() as i64,
            (p.z / cell_size).floor() as i64,
        )
    };

    let mut grid: HashMap<Cell, Vec<usize>> = HashMap::new();
    for (index, atom) in graph.atoms().iter().enumerate() {
        if let Some(p) = atom.position.as_ref() {
            grid.entry(cell_of(p)).or_default().push(index);
        }
    }

    let mut pairs = Vec::new();
    for (index, atom) in graph.atoms().iter().enumerate() {
        let Some(p) = atom.position.as_ref() else {
            continue;
        };
        let (cx, cy, cz) = cell_of(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &other in bucket.iter().filter(|o| **o > index) {
                        let other_atom = graph.atom(other);
                        let Some(q) = other_atom.position.as_ref() else {
                            continue;
                        };
                        let distance = nalgebra::distance(p, q);
                        let limit = atom.element.covalent_radius()
                            + other_atom.element.covalent_radius()
                            + BOND_TOLERANCE;
                        if distance > MIN_BOND_DISTANCE && distance < limit {
                            pairs.push((index, other));
                        }
                    }
                }
            }
        }
    }

    pairs.sort_unstable();
    for (a, b) in pairs {
        graph.add_bond(a, b, BondOrder::Single);
    }
}

/// Folds explicit hydrogens, fills implicit ones and writes the canonical SMILES with
/// stereo read from the coordinates.
pub fn canonical_smiles_from_structure(mut graph: MolGraph) -> String {
    graph.fold_explicit_hydrogens();
    fill_implicit_hydrogens(&mut graph);
    canonical_smiles_with_geometry(graph)
}

/// Perceives aromaticity, then tetrahedral and double-bond stereo from the coordinates, and
/// writes the canonical SMILES. Hydrogen counts must already be final.
pub fn canonical_smiles_with_geometry(mut graph: MolGraph) -> String {
    perceive_aromaticity(&mut graph);
    perceive_from_coordinates(&mut graph);
    to_canonical_smiles(&graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::canonicalize_smiles;
    use crate::core::chem::element::Element;
    use crate::core::models::molecule::Atom;
    use nalgebra::Point3;

    fn atom_at(element: Element, x: f64, y: f64, z: f64) -> Atom {
        Atom::new(element).with_position(Point3::new(x, y, z))
    }

    #[test]
    fn proximity_bonds_connect_close_atoms_only() {
        let mut g = MolGraph::new();
        g.add_atom(atom_at(Element::CARBON, 0.0, 0.0, 0.0));
        g.add_atom(atom_at(Element::CARBON, 1.54, 0.0, 0.0));
        g.add_atom(atom_at(Element::OXYGEN, 2.0, 1.3, 0.0));
        g.add_atom(atom_at(Element::CARBON, 10.0, 0.0, 0.0));
        add_proximity_bonds(&mut g);
        assert!(g.bond_between(0, 1).is_some());
        assert!(g.bond_between(1, 2).is_some());
        assert!(g.bond_between(0, 2).is_none());
        assert_eq!(g.degree(3), 0);
    }

    #[test]
    fn proximity_bonds_keep_existing_orders() {
        let mut g = MolGraph::new();
        g.add_atom(atom_at(Element::CARBON, 0.0, 0.0, 0.0));
        g.add_atom(atom_at(Element::OXYGEN, 1.21, 0.0, 0.0));
        g.add_bond(0, 1, BondOrder::Double);
        add_proximity_bonds(&mut g);
        assert_eq!(g.bonds().len(), 1);
        assert_eq!(g.bond(0).order, BondOrder::Double);
    }

    #[test]
    fn ethanol_heavy_atoms_become_canonical_smiles() {
        let mut g = MolGraph::new();
        g.add_atom(atom_at(Element::CARBON, 0.0, 0.0, 0.0));
        g.add_atom(atom_at(Element::CARBON, 1.52, 0.0, 0.0));
        g.add_atom(atom_at(Element::OXYGEN, 2.0, 1.35, 0.0));
        add_proximity_bonds(&mut g);
        let smiles = canonical_smiles_from_structure(g);
        assert_eq!(smiles, canonicalize_smiles("CCO").unwrap());
    }

    #[test]
    fn coordinate_stereocenter_reads_back_unchanged() {
        // CHFClBr with its hydrogen, mirrored through the yz plane when `handedness` is -1.
        let build = |handedness: f64| {
            let mut g = MolGraph::new();
            g.add_atom(atom_at(Element::CARBON, 0.0, 0.0, 0.0));
            g.add_atom(atom_at(Element::FLUORINE, 0.0, 0.0, 1.35));
            g.add_atom(atom_at(Element::CHLORINE, 1.66 * handedness, 0.0, -0.59));
            g.add_atom(atom_at(Element::BROMINE, -0.97 * handedness, 1.68, -0.68));
            g.add_atom(atom_at(Element::HYDROGEN, -0.51 * handedness, -0.89, -0.36));
            add_proximity_bonds(&mut g);
            canonical_smiles_from_structure(g)
        };
        let left = build(1.0);
        let right = build(-1.0);
        assert!(left.contains('@'), "{}", left);
        assert_ne!(left, right);
        assert_eq!(canonicalize_smiles(&left), Ok(left.clone()));
        assert_eq!(canonicalize_smiles(&right), Ok(right.clone()));
    }
}
