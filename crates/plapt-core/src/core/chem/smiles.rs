//! SMILES reading and canonical SMILES writing.
//!
//! The writer perceives aromaticity, then writes each connected component on its own and
//! joins the sorted component strings with `.`. Within a component, atoms are ranked with
//! [`canonical_ranks_by`], which settles leftover ties on the smallest resulting string. The
//! walk is depth-first from the lowest-ranked atom, visiting neighbors in rank order.
//! Tetrahedral parities are re-expressed relative to the emitted neighbor order, and
//! double-bond geometry is written as `/` `\` markers on adjacent single bonds. Markers on
//! ring-closure digits are read as plain single bonds.

use super::aromaticity::perceive_aromaticity;
use super::canonical::canonical_ranks_by;
use super::element::Element;
use super::stereo::{clear_non_stereo_bonds, clear_non_stereocenters, permutation_is_odd};
use super::valence::{can_be_aromatic, implied_hydrogens, is_organic_subset};
use crate::core::models::molecule::{
    Atom, BondOrder, Chirality, DoubleBondStereo, MolGraph, NeighborRef,
};
use itertools::Itertools;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SmilesError {
    #[error("Empty SMILES string")]
    Empty,
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
    #[error("Invalid bracket atom at position {position}: {reason}")]
    InvalidBracketAtom { position: usize, reason: String },
    #[error("Unbalanced parenthesis at position {position}")]
    UnbalancedParenthesis { position: usize },
    #[error("Bond at position {position} is not followed by an atom")]
    DanglingBond { position: usize },
    #[error("Ring closure {label} is never closed")]
    UnclosedRing { label: u16 },
    #[error("Conflicting bond symbols for ring closure {label}")]
    ConflictingRingBond { label: u16 },
    #[error("Invalid ring closure {label} at position {position}")]
    InvalidRingClosure { label: u16, position: usize },
}

/// Parses and re-emits a SMILES string in canonical form.
pub fn canonicalize_smiles(smiles: &str) -> Result<String, SmilesError> {
    let mut graph = parse_smiles(smiles)?;
    graph.fold_explicit_hydrogens();
    Ok(to_canonical_smiles(&graph))
}

// ---------------------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BondSymbol {
    Single,
    Double,
    Triple,
    Aromatic,
    Up,
    Down,
}

impl BondSymbol {
    fn order(self) -> BondOrder {
        match self {
            BondSymbol::Single | BondSymbol::Up | BondSymbol::Down => BondOrder::Single,
            BondSymbol::Double => BondOrder::Double,
            BondSymbol::Triple => BondOrder::Triple,
            BondSymbol::Aromatic => BondOrder::Aromatic,
        }
    }

    /// `Some(true)` for `/`, `Some(false)` for `\`.
    fn direction(self) -> Option<bool> {
        match self {
            BondSymbol::Up => Some(true),
            BondSymbol::Down => Some(false),
            _ => None,
        }
    }

    fn undirected(self) -> BondSymbol {
        match self {
            BondSymbol::Up | BondSymbol::Down => BondSymbol::Single,
            other => other,
        }
    }
}

/// Whether `neighbor` sits above `end` for a directional bond written from `from` with
/// `/` (`slash`) or `\`. The mapping is its own inverse, so it also turns a wanted side
/// into the marker to write.
fn side(end: usize, from: usize, slash: bool) -> bool {
    if from == end { slash } else { !slash }
}

struct RingOpening {
    atom: usize,
    bond: Option<BondSymbol>,
    slot: usize,
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    graph: MolGraph,
    bracketed: Vec<bool>,
    chiral_tags: Vec<Option<bool>>,
    neighbor_order: Vec<Vec<NeighborRef>>,
    rings: HashMap<u16, RingOpening>,
    /// Directional single bonds as `(bond, written-from atom, slash)`.
    directional: Vec<(usize, usize, bool)>,
}

/// Parses a SMILES string into a molecular graph with explicit hydrogen counts.
pub fn parse_smiles(smiles: &str) -> Result<MolGraph, SmilesError> {
    let trimmed = smiles.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::Empty);
    }
    Parser {
        chars: trimmed.chars().collect(),
        pos: 0,
        graph: MolGraph::new(),
        bracketed: Vec::new(),
        chiral_tags: Vec::new(),
        neighbor_order: Vec::new(),
        rings: HashMap::new(),
        directional: Vec::new(),
    }
    .run()
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn run(mut self) -> Result<MolGraph, SmilesError> {
        let mut previous: Option<usize> = None;
        let mut pending_bond: Option<(BondSymbol, usize)> = None;
        let mut branches: Vec<(Option<usize>, usize)> = Vec::new();

        while let Some(c) = self.peek() {
            let position = self.pos;
            match c {
                '(' => {
                    if previous.is_none() || pending_bond.is_some() {
                        return Err(SmilesError::UnbalancedParenthesis { position });
                    }
                    branches.push((previous, position));
                    self.pos += 1;
                }
                ')' => {
                    let Some((branch_root, _)) = branches.pop() else {
                        return Err(SmilesError::UnbalancedParenthesis { position });
                    };
                    if let Some((_, bond_pos)) = pending_bond {
                        return Err(SmilesError::DanglingBond { position: bond_pos });
                    }
                    previous = branch_root;
                    self.pos += 1;
                }
                '.' => {
                    if let Some((_, bond_pos)) = pending_bond {
                        return Err(SmilesError::DanglingBond { position: bond_pos });
                    }
                    previous = None;
                    self.pos += 1;
                }
                '-' | '=' | '#' | ':' | '/' | '\\' => {
                    if pending_bond.is_some() || previous.is_none() {
                        return Err(SmilesError::UnexpectedCharacter {
                            character: c,
                            position,
                        });
                    }
                    let symbol = match c {
                        '=' => BondSymbol::Double,
                        '#' => BondSymbol::Triple,
                        ':' => BondSymbol::Aromatic,
                        '/' => BondSymbol::Up,
                        '\\' => BondSymbol::Down,
                        _ => BondSymbol::Single,
                    };
                    pending_bond = Some((symbol, position));
                    self.pos += 1;
                }
                '0'..='9' | '%' => {
                    let Some(atom) = previous else {
                        return Err(SmilesError::UnexpectedCharacter {
                            character: c,
                            position,
                        });
                    };
                    let label = self.read_ring_label()?;
                    let symbol = pending_bond.take().map(|(s, _)| s.undirected());
                    self.ring_bond(atom, label, symbol, position)?;
                }
                '[' => {
                    let atom = self.read_bracket_atom()?;
                    self.attach(atom, previous, pending_bond.take().map(|(s, _)| s));
                    previous = Some(atom);
                }
                _ => {
                    let atom = self.read_organic_atom()?;
                    self.attach(atom, previous, pending_bond.take().map(|(s, _)| s));
                    previous = Some(atom);
                }
            }
        }

        if let Some((_, position)) = pending_bond {
            return Err(SmilesError::DanglingBond { position });
        }
        if let Some((_, position)) = branches.pop() {
            return Err(SmilesError::UnbalancedParenthesis { position });
        }
        if let Some(label) = self.rings.keys().min() {
            return Err(SmilesError::UnclosedRing { label: *label });
        }
        if self.graph.is_empty() {
            return Err(SmilesError::Empty);
        }

        for atom in 0..self.graph.atom_count() {
            if !self.bracketed[atom] {
                let hydrogens = implied_hydrogens(&self.graph, atom);
                self.graph.atom_mut(atom).hydrogens = hydrogens;
            }
            if let Some(anticlockwise) = self.chiral_tags[atom] {
                let neighbors = std::mem::take(&mut self.neighbor_order[atom]);
                self.graph.atom_mut(atom).chirality = Some(Chirality {
                    neighbors,
                    anticlockwise,
                });
            }
        }
        self.assign_double_bond_stereo();
        Ok(self.graph)
    }

    /// Turns `/` `\` markers around each double bond into a cis/trans relation between
    /// the first marked neighbor on each end.
    fn assign_double_bond_stereo(&mut self) {
        let marked_side = |graph: &MolGraph, end: usize, partner: usize| {
            self.directional.iter().find_map(|&(bond, from, slash)| {
                let b = graph.bond(bond);
                if b.atom1 != end && b.atom2 != end {
                    return None;
                }
                let neighbor = b.other(end);
                (neighbor != partner).then_some((neighbor, side(end, from, slash)))
            })
        };
        for index in 0..self.graph.bonds().len() {
            let bond = *self.graph.bond(index);
            if bond.order != BondOrder::Double {
                continue;
            }
            let first = marked_side(&self.graph, bond.atom1, bond.atom2);
            let second = marked_side(&self.graph, bond.atom2, bond.atom1);
            if let (Some((r1, up1)), Some((r2, up2))) = (first, second) {
                self.graph.bond_mut(index).stereo = Some(DoubleBondStereo {
                    neighbors: (r1, r2),
                    trans: up1 != up2,
                });
            }
        }
    }

    fn new_atom(&mut self, atom: Atom, bracketed: bool, chiral: Option<bool>) -> usize {
        let index = self.graph.add_atom(atom);
        self.bracketed.push(bracketed);
        self.chiral_tags.push(chiral);
        self.neighbor_order.push(Vec::new());
        index
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.graph.atom(a).aromatic && self.graph.atom(b).aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn attach(&mut self, atom: usize, previous: Option<usize>, symbol: Option<BondSymbol>) {
        if let Some(prev) = previous {
            let order = symbol.map_or_else(|| self.default_order(prev, atom), BondSymbol::order);
            let bond = self.graph.add_bond(prev, atom, order);
            if let (Some(bond), Some(slash)) = (bond, symbol.and_then(BondSymbol::direction)) {
                self.directional.push((bond, prev, slash));
            }
            self.neighbor_order[prev].push(NeighborRef::Atom(atom));
            // The preceding atom always comes first in the parity order.
            self.neighbor_order[atom].insert(0, NeighborRef::Atom(prev));
        }
    }

    fn read_ring_label(&mut self) -> Result<u16, SmilesError> {
        let position = self.pos;
        let c = self.peek().unwrap_or_default();
        if c == '%' {
            let tens = self.peek_at(1).and_then(|d| d.to_digit(10));
            let ones = self.peek_at(2).and_then(|d| d.to_digit(10));
            match (tens, ones) {
                (Some(t), Some(o)) => {
                    self.pos += 3;
                    Ok((t * 10 + o) as u16)
                }
                _ => Err(SmilesError::UnexpectedCharacter {
                    character: '%',
                    position,
                }),
            }
        } else {
            self.pos += 1;
            Ok(c.to_digit(10).unwrap_or_default() as u16)
        }
    }

    fn ring_bond(
        &mut self,
        atom: usize,
        label: u16,
        symbol: Option<BondSymbol>,
        position: usize,
    ) -> Result<(), SmilesError> {
        match self.rings.remove(&label) {
            None => {
                let slot = self.neighbor_order[atom].len();
                self.neighbor_order[atom].push(NeighborRef::ImplicitH);
                self.rings.insert(
                    label,
                    RingOpening {
                        atom,
                        bond: symbol,
                        slot,
                    },
                );
                Ok(())
            }
            Some(opening) => {
                if opening.atom == atom || self.graph.bond_between(opening.atom, atom).is_some() {
                    return Err(SmilesError::InvalidRingClosure { label, position });
                }
                let symbol = match (opening.bond, symbol) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(SmilesError::ConflictingRingBond { label });
                    }
                    (Some(a), _) | (None, Some(a)) => Some(a),
                    (None, None) => None,
                };
                let order = symbol.map_or_else(
                    || self.default_order(opening.atom, atom),
                    BondSymbol::order,
                );
                self.graph.add_bond(opening.atom, atom, order);
                self.neighbor_order[opening.atom][opening.slot] = NeighborRef::Atom(atom);
                self.neighbor_order[atom].push(NeighborRef::Atom(opening.atom));
                Ok(())
            }
        }
    }

    fn read_organic_atom(&mut self) -> Result<usize, SmilesError> {
        let position = self.pos;
        let c = self.peek().unwrap_or_default();
        let (symbol, aromatic, width) = match (c, self.peek_at(1)) {
            ('C', Some('l')) => ("Cl", false, 2),
            ('B', Some('r')) => ("Br", false, 2),
            ('B', _) => ("B", false, 1),
            ('C', _) => ("C", false, 1),
            ('N', _) => ("N", false, 1),
            ('O', _) => ("O", false, 1),
            ('P', _) => ("P", false, 1),
            ('S', _) => ("S", false, 1),
            ('F', _) => ("F", false, 1),
            ('I', _) => ("I", false, 1),
            ('b', _) => ("B", true, 1),
            ('c', _) => ("C", true, 1),
            ('n', _) => ("N", true, 1),
            ('o', _) => ("O", true, 1),
            ('p', _) => ("P", true, 1),
            ('s', _) => ("S", true, 1),
            ('*', _) => ("*", false, 1),
            _ => {
                return Err(SmilesError::UnexpectedCharacter {
                    character: c,
                    position,
                });
            }
        };
        let element = Element::from_symbol(symbol).ok_or(SmilesError::UnexpectedCharacter {
            character: c,
            position,
        })?;
        self.pos += width;
        let mut atom = Atom::new(element);
        atom.aromatic = aromatic;
        Ok(self.new_atom(atom, false, None))
    }

    fn read_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .parse()
            .ok()
    }

    fn read_bracket_atom(&mut self) -> Result<usize, SmilesError> {
        let position = self.pos;
        let invalid = |reason: &str| SmilesError::InvalidBracketAtom {
            position,
            reason: reason.to_string(),
        };
        self.pos += 1;

        let isotope = match self.read_number() {
            Some(n) => Some(u16::try_from(n).map_err(|_| invalid("isotope out of range"))?),
            None => None,
        };

        let (element, aromatic) = self.read_bracket_symbol().ok_or_else(|| invalid("unknown element"))?;

        let mut chiral = None;
        if self.peek() == Some('@') {
            self.pos += 1;
            let class: String = self.chars.iter().skip(self.pos).take(2).collect();
            if self.peek() == Some('@') {
                self.pos += 1;
                chiral = Some(false);
            } else if class == "TH" {
                self.pos += 2;
                chiral = match self.read_number() {
                    Some(1) => Some(true),
                    Some(2) => Some(false),
                    _ => return Err(invalid("unsupported tetrahedral class")),
                };
            } else if matches!(class.as_str(), "AL" | "SP" | "TB" | "OH") {
                return Err(invalid("only tetrahedral chirality is supported"));
            } else {
                chiral = Some(true);
            }
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some('H') {
            self.pos += 1;
            hydrogens = match self.read_number() {
                Some(n) => u8::try_from(n).map_err(|_| invalid("hydrogen count out of range"))?,
                None => 1,
            };
        }

        let mut charge: i32 = 0;
        if let Some(sign @ ('+' | '-')) = self.peek() {
            let unit = if sign == '+' { 1 } else { -1 };
            self.pos += 1;
            if let Some(n) = self.read_number() {
                charge = unit * n as i32;
            } else {
                charge = unit;
                while self.peek() == Some(sign) {
                    self.pos += 1;
                    charge += unit;
                }
            }
        }
        let charge = i8::try_from(charge).map_err(|_| invalid("charge out of range"))?;

        if self.peek() == Some(':') {
            self.pos += 1;
            self.read_number().ok_or_else(|| invalid("missing atom class"))?;
        }
        if self.peek() != Some(']') {
            return Err(invalid("expected ']'"));
        }
        self.pos += 1;

        let mut atom = Atom::new(element).with_charge(charge);
        atom.isotope = isotope;
        atom.aromatic = aromatic;
        atom.hydrogens = hydrogens;
        let index = self.new_atom(atom, true, chiral);
        if chiral.is_some() && hydrogens == 1 {
            self.neighbor_order[index].push(NeighborRef::ImplicitH);
        }
        Ok(index)
    }

    fn read_bracket_symbol(&mut self) -> Option<(Element, bool)> {
        let first = self.peek()?;
        if first == '*' {
            self.pos += 1;
            return Some((Element::WILDCARD, false));
        }
        if first.is_ascii_lowercase() {
            for width in [2usize, 1] {
                let Some(slice) = self.chars.get(self.pos..self.pos + width) else {
                    continue;
                };
                let candidate: String = slice.iter().collect();
                if !matches!(candidate.as_str(), "se" | "as" | "te" | "b" | "c" | "n" | "o" | "p" | "s")
                {
                    continue;
                }
                let mut symbol = candidate;
                symbol[..1].make_ascii_uppercase();
                if let Some(element) = Element::from_symbol(&symbol) {
                    self.pos += width;
                    return Some((element, true));
                }
            }
            return None;
        }
        if !first.is_ascii_uppercase() {
            return None;
        }
        if let Some(second) = self.peek_at(1).filter(|c| c.is_ascii_lowercase()) {
            let symbol: String = [first, second].iter().collect();
            if let Some(element) = Element::from_symbol(&symbol) {
                self.pos += 2;
                return Some((element, false));
            }
        }
        let element = Element::from_symbol(&first.to_string())?;
        self.pos += 1;
        Some((element, false))
    }
}

// ---------------------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------------------

struct Traversal {
    parent: Vec<Option<(usize, usize)>>,
    children: Vec<Vec<usize>>,
    ring_bonds: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl Traversal {
    /// Emission position of every atom.
    fn preorder(&self) -> Vec<usize> {
        let mut position = vec![0; self.parent.len()];
        let mut next = 0;
        for &root in &self.roots {
            let mut stack = vec![root];
            while let Some(atom) = stack.pop() {
                position[atom] = next;
                next += 1;
                stack.extend(self.children[atom].iter().rev());
            }
        }
        position
    }

    /// The atom a tree bond is written from, or `None` for ring-closure bonds.
    fn written_from(&self, a: usize, b: usize, bond: usize) -> Option<usize> {
        if self.parent[b] == Some((a, bond)) {
            Some(a)
        } else if self.parent[a] == Some((b, bond)) {
            Some(b)
        } else {
            None
        }
    }
}

fn traverse(graph: &MolGraph, ranks: &[usize]) -> Traversal {
    let n = graph.atom_count();
    let mut traversal = Traversal {
        parent: vec![None; n],
        children: vec![Vec::new(); n],
        ring_bonds: vec![Vec::new(); n],
        roots: Vec::new(),
    };
    let mut visited = vec![false; n];
    let mut bond_used = vec![false; graph.bonds().len()];

    let sorted_neighbors = |atom: usize| -> Vec<(usize, usize)> {
        let mut neighbors = graph.neighbors(atom).to_vec();
        neighbors.sort_by_key(|(n, _)| ranks[*n]);
        neighbors
    };

    let mut by_rank: Vec<usize> = (0..n).collect();
    by_rank.sort_by_key(|a| ranks[*a]);

    for root in by_rank {
        if visited[root] {
            continue;
        }
        traversal.roots.push(root);
        visited[root] = true;
        let mut stack = vec![(root, sorted_neighbors(root), 0usize)];

        while let Some((atom, neighbors, cursor)) = stack.last_mut() {
            let Some(&(next, bond)) = neighbors.get(*cursor) else {
                stack.pop();
                continue;
            };
            *cursor += 1;
            let atom = *atom;
            if bond_used[bond] {
                continue;
            }
            bond_used[bond] = true;
            if visited[next] {
                traversal.ring_bonds[atom].push(bond);
                traversal.ring_bonds[next].push(bond);
            } else {
                visited[next] = true;
                traversal.parent[next] = Some((atom, bond));
                traversal.children[atom].push(next);
                stack.push((next, sorted_neighbors(next), 0));
            }
        }
    }

    for (atom, bonds) in traversal.ring_bonds.iter_mut().enumerate() {
        bonds.sort_by_key(|b| ranks[graph.bond(*b).other(atom)]);
    }
    traversal
}

fn effective_aromatic(atom: &Atom) -> bool {
    atom.aromatic && can_be_aromatic(atom.element)
}

fn bond_symbol(graph: &MolGraph, bond: usize) -> &'static str {
    let b = graph.bond(bond);
    let both_aromatic =
        effective_aromatic(graph.atom(b.atom1)) && effective_aromatic(graph.atom(b.atom2));
    match b.order {
        BondOrder::Double => "=",
        BondOrder::Triple => "#",
        BondOrder::Aromatic if both_aromatic => "",
        BondOrder::Aromatic => ":",
        BondOrder::Single if both_aromatic => "-",
        BondOrder::Single => "",
    }
}

fn emitted_neighbor_order(graph: &MolGraph, t: &Traversal, atom: usize) -> Vec<NeighborRef> {
    let mut order = Vec::with_capacity(4);
    if let Some((parent, _)) = t.parent[atom] {
        order.push(NeighborRef::Atom(parent));
    }
    if graph.atom(atom).hydrogens == 1 {
        order.push(NeighborRef::ImplicitH);
    }
    for &bond in &t.ring_bonds[atom] {
        order.push(NeighborRef::Atom(graph.bond(bond).other(atom)));
    }
    for &child in &t.children[atom] {
        order.push(NeighborRef::Atom(child));
    }
    order
}

fn atom_token(graph: &MolGraph, t: &Traversal, atom: usize) -> String {
    let a = graph.atom(atom);
    let aromatic = effective_aromatic(a);

    let chiral_symbol = a.chirality.as_ref().and_then(|chirality| {
        let emitted = emitted_neighbor_order(graph, t, atom);
        let odd = permutation_is_odd(&chirality.neighbors, &emitted)?;
        let anticlockwise = chirality.anticlockwise != odd;
        Some(if anticlockwise { "@" } else { "@@" })
    });

    let symbol = if aromatic {
        a.element.symbol().to_ascii_lowercase()
    } else {
        a.element.symbol().to_string()
    };

    let bare = chiral_symbol.is_none()
        && a.isotope.is_none()
        && a.charge == 0
        && (is_organic_subset(a.element) || a.element == Element::WILDCARD)
        && (!aromatic || matches!(symbol.as_str(), "b" | "c" | "n" | "o" | "p" | "s"))
        && a.hydrogens == implied_hydrogens(graph, atom);
    if bare {
        return symbol;
    }

    let mut token = String::from("[");
    if let Some(isotope) = a.isotope {
        token.push_str(&isotope.to_string());
    }
    token.push_str(&symbol);
    if let Some(chiral) = chiral_symbol {
        token.push_str(chiral);
    }
    match a.hydrogens {
        0 => {}
        1 => token.push('H'),
        n => {
            token.push('H');
            token.push_str(&n.to_string());
        }
    }
    match a.charge {
        0 => {}
        1 => token.push('+'),
        -1 => token.push('-'),
        c if c > 0 => token.push_str(&format!("+{}", c)),
        c => token.push_str(&format!("-{}", -i16::from(c))),
    }
    token.push(']');
    token
}

fn ring_label(digit: usize) -> String {
    if digit < 10 {
        digit.to_string()
    } else {
        format!("%{}", digit)
    }
}

/// One end of a stereo double bond and the single bond chosen to carry its marker.
struct MarkedEnd {
    end: usize,
    bond: usize,
    from: usize,
    /// Side of the marked neighbor relative to the first reference neighbor's side.
    offset: bool,
}

/// Markers (`true` for `/`) for single bonds next to stereo double bonds, keyed by bond.
///
/// Double bonds are handled in emission order, and a marker already placed for an earlier
/// double bond fixes the orientation of the next one in a conjugated chain. A double bond
/// whose end has no tree single bond available is written without geometry.
fn bond_directions(graph: &MolGraph, t: &Traversal) -> HashMap<usize, bool> {
    let preorder = t.preorder();
    let mut stereo_bonds: Vec<(usize, usize)> = graph
        .bonds()
        .iter()
        .enumerate()
        .filter(|(_, bond)| bond.stereo.is_some())
        .filter_map(|(index, bond)| {
            let from = t.written_from(bond.atom1, bond.atom2, index)?;
            Some((preorder[from], index))
        })
        .collect();
    stereo_bonds.sort_unstable();

    let mut directions: HashMap<usize, bool> = HashMap::new();
    for (_, index) in stereo_bonds {
        let bond = *graph.bond(index);
        let Some(stereo) = bond.stereo else {
            continue;
        };
        let mut ends = [
            (bond.atom1, bond.atom2, stereo.neighbors.0, false),
            (bond.atom2, bond.atom1, stereo.neighbors.1, stereo.trans),
        ];
        if t.written_from(bond.atom1, bond.atom2, index) == Some(bond.atom2) {
            ends.swap(0, 1);
        }

        let marked: Option<Vec<MarkedEnd>> = ends
            .iter()
            .map(|&(end, partner, reference, flip)| {
                let mut candidates: Vec<(usize, usize, usize)> = graph
                    .neighbors(end)
                    .iter()
                    .filter(|(n, b)| *n != partner && graph.bond(*b).order == BondOrder::Single)
                    .filter_map(|&(n, b)| Some((n, b, t.written_from(end, n, b)?)))
                    .collect();
                candidates.sort_by_key(|(n, _, _)| preorder[*n]);
                let &(neighbor, single, from) = candidates
                    .iter()
                    .find(|(_, b, _)| directions.contains_key(b))
                    .or_else(|| candidates.first())?;
                Some(MarkedEnd {
                    end,
                    bond: single,
                    from,
                    offset: flip ^ (neighbor != reference),
                })
            })
            .collect();
        let Some(marked) = marked else {
            continue;
        };

        let base = marked
            .iter()
            .find_map(|m| {
                let slash = directions.get(&m.bond)?;
                Some(side(m.end, m.from, *slash) ^ m.offset)
            })
            .unwrap_or_else(|| side(marked[0].end, marked[0].from, true) ^ marked[0].offset);
        for m in &marked {
            directions
                .entry(m.bond)
                .or_insert_with(|| side(m.end, m.from, base ^ m.offset));
        }
    }
    directions
}

enum Emit {
    Text(&'static str),
    Atom(usize),
}

/// Writes one connected component with the given atom ranks.
fn write_ranked(graph: &MolGraph, ranks: &[usize]) -> String {
    let t = traverse(graph, ranks);
    let directions = bond_directions(graph, &t);

    let mut out = String::new();
    let mut open_digits: HashMap<usize, usize> = HashMap::new();
    let mut free_digits: Vec<bool> = vec![true; 100];

    for (component, &root) in t.roots.iter().enumerate() {
        if component > 0 {
            out.push('.');
        }
        let mut stack = vec![Emit::Atom(root)];
        while let Some(task) = stack.pop() {
            let atom = match task {
                Emit::Text(text) => {
                    out.push_str(text);
                    continue;
                }
                Emit::Atom(atom) => atom,
            };

            if let Some((_, bond)) = t.parent[atom] {
                match directions.get(&bond) {
                    Some(true) => out.push('/'),
                    Some(false) => out.push('\\'),
                    None => out.push_str(bond_symbol(graph, bond)),
                }
            }
            out.push_str(&atom_token(graph, &t, atom));

            for &bond in &t.ring_bonds[atom] {
                if let Some(digit) = open_digits.remove(&bond) {
                    free_digits[digit] = true;
                    out.push_str(&ring_label(digit));
                } else {
                    let digit = (1..free_digits.len())
                        .find(|d| free_digits[*d])
                        .unwrap_or(free_digits.len());
                    if digit < free_digits.len() {
                        free_digits[digit] = false;
                    }
                    open_digits.insert(bond, digit);
                    out.push_str(bond_symbol(graph, bond));
                    out.push_str(&ring_label(digit));
                }
            }

            if let Some((&last, rest)) = t.children[atom].split_last() {
                stack.push(Emit::Atom(last));
                for &child in rest.iter().rev() {
                    stack.push(Emit::Text(")"));
                    stack.push(Emit::Atom(child));
                    stack.push(Emit::Text("("));
                }
            }
        }
    }
    out
}

fn write_component(graph: &MolGraph) -> String {
    let ranks = canonical_ranks_by(graph, |ranks| write_ranked(graph, ranks));
    write_ranked(graph, &ranks)
}

/// Writes the canonical SMILES of a molecular graph.
///
/// Hydrogen counts must be final. Two graphs that differ only in atom order, or in the
/// Kekulé form of an aromatic ring, produce the same string.
pub fn to_canonical_smiles(graph: &MolGraph) -> String {
    let mut graph = graph.clone();
    for index in 0..graph.atom_count() {
        if !can_be_aromatic(graph.atom(index).element) {
            graph.atom_mut(index).aromatic = false;
        }
    }
    perceive_aromaticity(&mut graph);
    clear_non_stereocenters(&mut graph);
    clear_non_stereo_bonds(&mut graph);

    graph
        .components()
        .iter()
        .map(|atoms| write_component(&graph.subgraph(atoms)))
        .sorted()
        .join(".")
}
