//! Tetrahedral and double-bond stereo: which atoms and bonds can carry it, and how to read
//! it off 3D (or, for double bonds, 2D) coordinates.

use super::canonical::symmetry_classes;
use super::rings::ring_bonds;
use crate::core::models::molecule::{
    BondOrder, Chirality, DoubleBondStereo, MolGraph, NeighborRef,
};
use nalgebra::{Point3, Vector3};
use std::collections::HashSet;

const MIN_SIGNED_VOLUME: f64 = 0.05;
/// Substituents closer than this to perpendicular across a double bond give no geometry.
const MIN_DIHEDRAL_COSINE: f64 = 0.2;

fn can_be_tetrahedral_center(graph: &MolGraph, atom: usize) -> bool {
    let a = graph.atom(atom);
    let allowed = match a.element.atomic_number() {
        6 | 14 | 15 | 16 => true,
        7 => a.charge > 0,
        _ => false,
    };
    allowed && a.hydrogens <= 1 && graph.degree(atom) + usize::from(a.hydrogens) == 4
}

/// Returns `true` if the atom is a tetrahedral stereocenter: four substituents, at most
/// one hydrogen, and pairwise topologically distinct heavy neighbors.
pub fn is_stereocenter(graph: &MolGraph, classes: &[usize], atom: usize) -> bool {
    if !can_be_tetrahedral_center(graph, atom) {
        return false;
    }
    let mut seen = HashSet::new();
    graph
        .neighbors(atom)
        .iter()
        .all(|&(n, _)| seen.insert(classes[n]))
}

/// Drops parity annotations from atoms that are not stereocenters.
pub fn clear_non_stereocenters(graph: &mut MolGraph) {
    let classes = symmetry_classes(graph);
    for atom in 0..graph.atom_count() {
        if graph.atom(atom).chirality.is_some() && !is_stereocenter(graph, &classes, atom) {
            graph.atom_mut(atom).chirality = None;
        }
    }
}

/// Substituents of one end of a double bond, or `None` if that end cannot carry geometry.
fn double_bond_end(graph: &MolGraph, end: usize, partner: usize) -> Option<Vec<usize>> {
    let a = graph.atom(end);
    let number = a.element.atomic_number();
    if number != 6 && number != 7 {
        return None;
    }
    let mut substituents = Vec::with_capacity(2);
    for &(n, bond) in graph.neighbors(end) {
        if n == partner {
            continue;
        }
        if graph.bond(bond).order != BondOrder::Single {
            return None;
        }
        substituents.push(n);
    }
    let valid = match substituents.len() {
        1 => a.hydrogens == 1 || number == 7,
        2 => a.hydrogens == 0,
        _ => false,
    };
    valid.then_some(substituents)
}

/// Returns `true` if the bond is an acyclic double bond whose ends each carry one
/// substituent, or two topologically distinct ones.
pub fn is_stereo_double_bond(
    graph: &MolGraph,
    classes: &[usize],
    ring_bond: &[bool],
    bond: usize,
) -> bool {
    let b = graph.bond(bond);
    if b.order != BondOrder::Double || ring_bond[bond] {
        return false;
    }
    [(b.atom1, b.atom2), (b.atom2, b.atom1)]
        .into_iter()
        .all(|(end, partner)| match double_bond_end(graph, end, partner) {
            Some(s) if s.len() == 2 => classes[s[0]] != classes[s[1]],
            Some(_) => true,
            None => false,
        })
}

/// Drops double-bond geometry from bonds that cannot carry it or whose reference
/// neighbors are not attached to the bond.
pub fn clear_non_stereo_bonds(graph: &mut MolGraph) {
    let classes = symmetry_classes(graph);
    let ring_bond = ring_bonds(graph);
    for bond in 0..graph.bonds().len() {
        let Some(stereo) = graph.bond(bond).stereo else {
            continue;
        };
        let b = graph.bond(bond);
        let (first, second) = stereo.neighbors;
        let attached = first != b.atom2
            && second != b.atom1
            && graph.bond_between(b.atom1, first).is_some()
            && graph.bond_between(b.atom2, second).is_some();
        if !attached || !is_stereo_double_bond(graph, &classes, &ring_bond, bond) {
            graph.bond_mut(bond).stereo = None;
        }
    }
}

/// Derives tetrahedral parities from 3D coordinates and double-bond geometry from 2D or 3D
/// coordinates.
///
/// Planar input (for example a 2D depiction with all z = 0) yields no tetrahedral parity.
pub fn perceive_from_coordinates(graph: &mut MolGraph) {
    let classes = symmetry_classes(graph);
    for atom in 0..graph.atom_count() {
        if !is_stereocenter(graph, &classes, atom) {
            continue;
        }
        if let Some(chirality) = parity_from_positions(graph, atom) {
            graph.atom_mut(atom).chirality = Some(chirality);
        }
    }

    let ring_bond = ring_bonds(graph);
    for bond in 0..graph.bonds().len() {
        if !is_stereo_double_bond(graph, &classes, &ring_bond, bond) {
            continue;
        }
        if let Some(stereo) = geometry_from_positions(graph, bond) {
            graph.bond_mut(bond).stereo = Some(stereo);
        }
    }
}

fn geometry_from_positions(graph: &MolGraph, bond: usize) -> Option<DoubleBondStereo> {
    let b = graph.bond(bond);
    let reference = |end: usize, partner: usize| {
        graph
            .neighbors(end)
            .iter()
            .map(|(n, _)| *n)
            .find(|n| *n != partner)
    };
    let first = reference(b.atom1, b.atom2)?;
    let second = reference(b.atom2, b.atom1)?;

    let p1 = graph.atom(b.atom1).position?;
    let p2 = graph.atom(b.atom2).position?;
    let axis = (p2 - p1).try_normalize(1e-8)?;
    let across = |from: Point3<f64>, to: Point3<f64>| {
        let v = to - from;
        (v - axis * v.dot(&axis)).try_normalize(1e-8)
    };
    let u = across(p1, graph.atom(first).position?)?;
    let v = across(p2, graph.atom(second).position?)?;
    let cosine = u.dot(&v);
    if cosine.abs() < MIN_DIHEDRAL_COSINE {
        return None;
    }
    Some(DoubleBondStereo {
        neighbors: (first, second),
        trans: cosine < 0.0,
    })
}

fn parity_from_positions(graph: &MolGraph, atom: usize) -> Option<Chirality> {
    let center = graph.atom(atom).position?;
    let mut neighbors = Vec::with_capacity(4);
    let mut points: Vec<Point3<f64>> = Vec::with_capacity(4);
    for &(n, _) in graph.neighbors(atom) {
        neighbors.push(NeighborRef::Atom(n));
        points.push(graph.atom(n).position?);
    }
    if graph.atom(atom).hydrogens == 1 {
        let sum: Vector3<f64> = points
            .iter()
            .filter_map(|p| (p - center).try_normalize(1e-8))
            .sum();
        let direction = (-sum).try_normalize(1e-8)?;
        neighbors.push(NeighborRef::ImplicitH);
        points.push(center + direction);
    }
    if points.len() != 4 {
        return None;
    }

    let units: Vec<Vector3<f64>> = points
        .iter()
        .map(|p| (p - center).try_normalize(1e-8))
        .collect::<Option<_>>()?;
    let volume = (units[2] - units[1])
        .cross(&(units[3] - units[1]))
        .dot(&units[0]);
    if volume.abs() < MIN_SIGNED_VOLUME {
        return None;
    }
    Some(Chirality {
        neighbors,
        anticlockwise: volume > 0.0,
    })
}

/// Parity of the permutation that takes `from` to `to`. `None` if they are not permutations
/// of each other.
pub fn permutation_is_odd(from: &[NeighborRef], to: &[NeighborRef]) -> Option<bool> {
    if from.len() != to.len() {
        return None;
    }
    let positions: Vec<usize> = from
        .iter()
        .map(|item| to.iter().position(|t| t == item))
        .collect::<Option<_>>()?;
    let mut inversions = 0usize;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            if positions[i] > positions[j] {
                inversions += 1;
            }
        }
    }
    Some(inversions % 2 == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::element::Element;
    use crate::core::models::molecule::{Atom, BondOrder};

    // Bromochlorofluoromethane with the hydrogen folded away.
    fn chfclbr(mirror: bool) -> MolGraph {
        let z = if mirror { -1.0 } else { 1.0 };
        let mut g = MolGraph::new();
        let mut c = Atom::new(Element::CARBON).with_position(Point3::origin());
        c.hydrogens = 1;
        let c = g.add_atom(c);
        let f = g.add_atom(Atom::new(Element::FLUORINE).with_position(Point3::new(0.0, 0.0, z)));
        let cl = g.add_atom(
            Atom::new(Element::CHLORINE).with_position(Point3::new(0.94, 0.0, -0.33 * z)),
        );
        let br = g.add_atom(
            Atom::new(Element::BROMINE).with_position(Point3::new(-0.47, 0.82, -0.33 * z)),
        );
        for n in [f, cl, br] {
            g.add_bond(c, n, BondOrder::Single);
        }
        g
    }

    #[test]
    fn mirror_images_get_opposite_parities() {
        let mut left = chfclbr(false);
        let mut right = chfclbr(true);
        perceive_from_coordinates(&mut left);
        perceive_from_coordinates(&mut right);
        let l = left.atom(0).chirality.clone().unwrap();
        let r = right.atom(0).chirality.clone().unwrap();
        assert_eq!(l.neighbors, r.neighbors);
        assert_ne!(l.anticlockwise, r.anticlockwise);
    }

    #[test]
    fn planar_centers_get_no_parity() {
        let mut g = chfclbr(false);
        for i in 0..g.atom_count() {
            if let Some(p) = g.atom_mut(i).position.as_mut() {
                p.z = 0.0;
            }
        }
        g.atom_mut(1).position = Some(Point3::new(-0.47, -0.82, 0.0));
        perceive_from_coordinates(&mut g);
        assert!(g.atom(0).chirality.is_none());
    }

    #[test]
    fn permutation_parity_counts_inversions() {
        use NeighborRef::*;
        let a = [Atom(0), Atom(1), Atom(2), ImplicitH];
        assert_eq!(permutation_is_odd(&a, &a), Some(false));
        assert_eq!(
            permutation_is_odd(&a, &[Atom(1), Atom(0), Atom(2), ImplicitH]),
            Some(true)
        );
        assert_eq!(
            permutation_is_odd(&a, &[Atom(1), Atom(2), Atom(0), ImplicitH]),
            Some(false)
        );
        assert_eq!(permutation_is_odd(&a, &[Atom(0), Atom(1)]), None);
    }

    // 2-butene in the xy plane; `trans` puts the second methyl below the axis.
    fn butene(trans: bool) -> MolGraph {
        let y = if trans { -1.2 } else { 1.2 };
        let mut g = MolGraph::new();
        let positions = [(-0.7, 1.2), (0.0, 0.0), (1.3, 0.0), (2.0, y)];
        for (x, y) in positions {
            g.add_atom(Atom::new(Element::CARBON).with_position(Point3::new(x, y, 0.0)));
        }
        g.add_bond(0, 1, BondOrder::Single);
        g.add_bond(1, 2, BondOrder::Double);
        g.add_bond(2, 3, BondOrder::Single);
        g.atom_mut(0).hydrogens = 3;
        g.atom_mut(1).hydrogens = 1;
        g.atom_mut(2).hydrogens = 1;
        g.atom_mut(3).hydrogens = 3;
        g
    }

    #[test]
    fn double_bond_geometry_follows_coordinates() {
        let mut cis = butene(false);
        let mut trans = butene(true);
        perceive_from_coordinates(&mut cis);
        perceive_from_coordinates(&mut trans);
        let expected = |t| {
            Some(DoubleBondStereo {
                neighbors: (0, 3),
                trans: t,
            })
        };
        assert_eq!(cis.bond(1).stereo, expected(false));
        assert_eq!(trans.bond(1).stereo, expected(true));
    }

    #[test]
    fn symmetric_double_bond_ends_carry_no_geometry() {
        // Isobutene: two methyls on one end.
        let mut g = MolGraph::new();
        for _ in 0..4 {
            g.add_atom(Atom::new(Element::CARBON));
        }
        g.add_bond(0, 1, BondOrder::Double);
        g.add_bond(1, 2, BondOrder::Single);
        g.add_bond(1, 3, BondOrder::Single);
        g.atom_mut(0).hydrogens = 2;
        let classes = symmetry_classes(&g);
        let ring_bond = ring_bonds(&g);
        assert!(!is_stereo_double_bond(&g, &classes, &ring_bond, 0));
    }

    #[test]
    fn stale_double_bond_geometry_is_cleared() {
        let mut g = butene(true);
        g.bond_mut(1).stereo = Some(DoubleBondStereo {
            neighbors: (3, 0),
            trans: true,
        });
        clear_non_stereo_bonds(&mut g);
        assert!(g.bond(1).stereo.is_none());
    }
}
