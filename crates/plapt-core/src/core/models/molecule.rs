use crate::core::chem::element::Element;
use nalgebra::Point3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Bond order used by the valence model. Aromatic bonds are handled separately.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    /// Next higher order, used when a connectivity record repeats a bond.
    pub fn promoted(self) -> BondOrder {
        match self {
            BondOrder::Single => BondOrder::Double,
            BondOrder::Double | BondOrder::Triple => BondOrder::Triple,
            BondOrder::Aromatic => BondOrder::Aromatic,
        }
    }

    pub(crate) fn rank_code(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
        }
    }
}

/// A neighbor slot in a tetrahedral parity specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeighborRef {
    Atom(usize),
    ImplicitH,
}

/// Tetrahedral parity: looking from the first neighbor toward the center, the remaining
/// neighbors are arranged anticlockwise (`@`) or clockwise (`@@`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chirality {
    pub neighbors: Vec<NeighborRef>,
    pub anticlockwise: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: Element,
    pub isotope: Option<u16>,
    pub charge: i8,
    pub hydrogens: u8,
    pub aromatic: bool,
    pub position: Option<Point3<f64>>,
    pub chirality: Option<Chirality>,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            isotope: None,
            charge: 0,
            hydrogens: 0,
            aromatic: false,
            position: None,
            chirality: None,
        }
    }

    pub fn with_position(mut self, position: Point3<f64>) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_charge(mut self, charge: i8) -> Self {
        self.charge = charge;
        self
    }

    fn is_plain_hydrogen(&self) -> bool {
        self.element == Element::HYDROGEN && self.isotope.is_none() && self.charge == 0
    }
}

/// Double-bond geometry, stated for one reference neighbor on each end. `neighbors.0` is
/// bonded to `atom1` of the double bond and `neighbors.1` to `atom2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoubleBondStereo {
    pub neighbors: (usize, usize),
    pub trans: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
    pub stereo: Option<DoubleBondStereo>,
}

impl Bond {
    pub fn other(&self, atom: usize) -> usize {
        if self.atom1 == atom {
            self.atom2
        } else {
            self.atom1
        }
    }
}

/// An undirected molecular graph with per-atom hydrogen counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MolGraph {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Vec<Vec<(usize, usize)>>, // (neighbor atom, bond index)
}

impl MolGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    /// Adds a bond between two distinct atoms.
    ///
    /// Returns the bond index, or `None` if the atoms are the same, out of range, or
    /// already bonded.
    pub fn add_bond(&mut self, atom1: usize, atom2: usize, order: BondOrder) -> Option<usize> {
        if atom1 == atom2 || atom1 >= self.atoms.len() || atom2 >= self.atoms.len() {
            return None;
        }
        if self.bond_between(atom1, atom2).is_some() {
            return None;
        }
        let index = self.bonds.len();
        self.bonds.push(Bond {
            atom1,
            atom2,
            order,
            stereo: None,
        });
        self.adjacency[atom1].push((atom2, index));
        self.adjacency[atom2].push((atom1, index));
        Some(index)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> &Atom {
        &self.atoms[index]
    }

    pub fn atom_mut(&mut self, index: usize) -> &mut Atom {
        &mut self.atoms[index]
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bond(&self, index: usize) -> &Bond {
        &self.bonds[index]
    }

    pub fn bond_mut(&mut self, index: usize) -> &mut Bond {
        &mut self.bonds[index]
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    pub fn bond_between(&self, atom1: usize, atom2: usize) -> Option<usize> {
        self.adjacency
            .get(atom1)?
            .iter()
            .find(|(n, _)| *n == atom2)
            .map(|(_, b)| *b)
    }

    /// Folds plain hydrogens bonded to exactly one non-hydrogen atom into that atom's
    /// hydrogen count. Parity references to removed hydrogens become implicit.
    pub fn fold_explicit_hydrogens(&mut self) {
        let mut removable = vec![false; self.atoms.len()];
        for (index, atom) in self.atoms.iter().enumerate() {
            if !atom.is_plain_hydrogen() || self.adjacency[index].len() != 1 {
                continue;
            }
            let (heavy, bond) = self.adjacency[index][0];
            if self.atoms[heavy].element != Element::HYDROGEN
                && self.bonds[bond].order == BondOrder::Single
            {
                removable[index] = true;
            }
        }
        if !removable.iter().any(|r| *r) {
            return;
        }

        for (index, remove) in removable.iter().enumerate() {
            if *remove {
                let heavy = self.adjacency[index][0].0;
                self.atoms[heavy].hydrogens = self.atoms[heavy].hydrogens.saturating_add(1);
            }
        }
        self.retain_atoms(&removable);
    }

    /// Connected components as sorted atom index lists, ordered by their first atom.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut component_of = vec![usize::MAX; self.atoms.len()];
        let mut components = Vec::new();
        for start in 0..self.atoms.len() {
            if component_of[start] != usize::MAX {
                continue;
            }
            let id = components.len();
            let mut members = vec![start];
            component_of[start] = id;
            let mut cursor = 0;
            while let Some(&atom) = members.get(cursor) {
                cursor += 1;
                for &(n, _) in &self.adjacency[atom] {
                    if component_of[n] == usize::MAX {
                        component_of[n] = id;
                        members.push(n);
                    }
                }
            }
            members.sort_unstable();
            components.push(members);
        }
        components
    }

    /// Copy of the graph restricted to `atoms`, which must be closed under bonding.
    pub fn subgraph(&self, atoms: &[usize]) -> MolGraph {
        let mut removed = vec![true; self.atoms.len()];
        for &atom in atoms {
            removed[atom] = false;
        }
        self.without_atoms(&removed)
    }

    fn retain_atoms(&mut self, removed: &[bool]) {
        *self = self.without_atoms(removed);
    }

    fn without_atoms(&self, removed: &[bool]) -> MolGraph {
        let mut remap = vec![None; self.atoms.len()];
        let mut next = 0;
        for (index, remove) in removed.iter().enumerate() {
            if !remove {
                remap[index] = Some(next);
                next += 1;
            }
        }

        let mut graph = MolGraph::new();
        for (index, atom) in self.atoms.iter().enumerate() {
            if removed[index] {
                continue;
            }
            let mut atom = atom.clone();
            if let Some(chirality) = atom.chirality.as_mut() {
                for slot in chirality.neighbors.iter_mut() {
                    if let NeighborRef::Atom(n) = *slot {
                        *slot = match remap[n] {
                            Some(m) => NeighborRef::Atom(m),
                            None => NeighborRef::ImplicitH,
                        };
                    }
                }
            }
            graph.add_atom(atom);
        }
        for bond in &self.bonds {
            let (Some(a), Some(b)) = (remap[bond.atom1], remap[bond.atom2]) else {
                continue;
            };
            let Some(index) = graph.add_bond(a, b, bond.order) else {
                continue;
            };
            graph.bonds[index].stereo = bond
                .stereo
                .and_then(|stereo| self.remap_double_bond_stereo(bond, stereo, &remap));
        }
        graph
    }

    /// Re-expresses double-bond geometry after atom removal. A removed reference neighbor is
    /// replaced by the other substituent on the same end, which sits on the opposite side.
    fn remap_double_bond_stereo(
        &self,
        bond: &Bond,
        stereo: DoubleBondStereo,
        remap: &[Option<usize>],
    ) -> Option<DoubleBondStereo> {
        let mut trans = stereo.trans;
        let mut resolve = |end: usize, partner: usize, reference: usize| -> Option<usize> {
            if let Some(mapped) = remap[reference] {
                return Some(mapped);
            }
            let substitute = self.adjacency[end]
                .iter()
                .map(|(n, _)| *n)
                .find(|n| *n != partner && *n != reference && remap[*n].is_some())?;
            trans = !trans;
            remap[substitute]
        };
        let first = resolve(bond.atom1, bond.atom2, stereo.neighbors.0)?;
        let second = resolve(bond.atom2, bond.atom1, stereo.neighbors.1)?;
        Some(DoubleBondStereo {
            neighbors: (first, second),
            trans,
        })
    }
}
