//! Graph-invariant atom ranking.
//!
//! Atoms start from a tuple of local invariants and are refined by the ranks of their
//! neighbors until the partition stops splitting. [`symmetry_classes`] stops there;
//! [`canonical_ranks_by`] additionally breaks remaining ties one at a time so that every atom
//! receives a distinct rank.

use crate::core::models::molecule::MolGraph;

type Invariant = (u8, u16, i8, u8, usize, bool);

fn local_invariant(graph: &MolGraph, atom: usize) -> Invariant {
    let a = graph.atom(atom);
    (
        a.element.atomic_number(),
        a.isotope.unwrap_or(0),
        a.charge,
        a.hydrogens,
        graph.degree(atom),
        a.aromatic,
    )
}

fn dense_ranks<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|a, b| keys[*a].cmp(&keys[*b]));
    let mut ranks = vec![0; keys.len()];
    let mut current = 0;
    for (position, &index) in order.iter().enumerate() {
        if position > 0 && keys[index] != keys[order[position - 1]] {
            current += 1;
        }
        ranks[index] = current;
    }
    ranks
}

fn class_count(ranks: &[usize]) -> usize {
    ranks.iter().max().map_or(0, |m| m + 1)
}

fn refine(graph: &MolGraph, mut ranks: Vec<usize>) -> Vec<usize> {
    loop {
        let keys: Vec<(usize, Vec<(usize, u8)>)> = (0..graph.atom_count())
            .map(|atom| {
                let mut env: Vec<(usize, u8)> = graph
                    .neighbors(atom)
                    .iter()
                    .map(|&(n, b)| (ranks[n], graph.bond(b).order.rank_code()))
                    .collect();
                env.sort_unstable();
                (ranks[atom], env)
            })
            .collect();
        let refined = dense_ranks(&keys);
        if class_count(&refined) == class_count(&ranks) {
            return refined;
        }
        ranks = refined;
    }
}

/// Partitions atoms into classes of topologically equivalent atoms.
pub fn symmetry_classes(graph: &MolGraph) -> Vec<usize> {
    let invariants: Vec<Invariant> = (0..graph.atom_count())
        .map(|atom| local_invariant(graph, atom))
        .collect();
    refine(graph, dense_ranks(&invariants))
}

/// Atoms of the lowest-ranked class that still holds more than one atom.
fn first_tied_class(ranks: &[usize]) -> Option<Vec<usize>> {
    let mut sizes = vec![0usize; ranks.len()];
    for r in ranks {
        sizes[*r] += 1;
    }
    let tied_rank = (0..ranks.len()).find(|r| sizes[*r] > 1)?;
    Some((0..ranks.len()).filter(|a| ranks[*a] == tied_rank).collect())
}

fn break_tie(graph: &MolGraph, ranks: &[usize], chosen: usize) -> Vec<usize> {
    let keys: Vec<(usize, bool)> = (0..ranks.len())
        .map(|a| (ranks[a], a != chosen))
        .collect();
    refine(graph, dense_ranks(&keys))
}

fn complete(graph: &MolGraph, mut ranks: Vec<usize>) -> Vec<usize> {
    while let Some(tied) = first_tied_class(&ranks) {
        ranks = break_tie(graph, &ranks, tied[0]);
    }
    ranks
}

/// Assigns every atom a distinct rank. At each tie, every atom of the tied class is tried
/// and the one whose completed ranking scores lowest wins. Completion for scoring breaks
/// later ties by lowest atom index; equal scores keep the lowest index.
pub fn canonical_ranks_by<K, F>(graph: &MolGraph, mut score: F) -> Vec<usize>
where
    K: Ord,
    F: FnMut(&[usize]) -> K,
{
    let mut ranks = symmetry_classes(graph);
    while let Some(tied) = first_tied_class(&ranks) {
        let Some(best) = tied
            .iter()
            .map(|&candidate| break_tie(graph, &ranks, candidate))
            .min_by_key(|candidate| score(&complete(graph, candidate.clone())))
        else {
            break;
        };
        ranks = best;
    }
    ranks
}
