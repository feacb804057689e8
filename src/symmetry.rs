//! Topological symmetry classes.
//!
//! Two atoms share a class when iterated neighbourhood refinement cannot
//! tell them apart. No tie breaking is applied, so the result is a
//! partition rather than a canonical numbering. Stereo descriptors do not
//! take part.

use std::hash::{Hash, Hasher};

use petgraph::graph::NodeIndex;

use crate::bond::BondOrder;
use crate::mol::Mol;
use crate::traits::{
    HasAromaticity, HasAtomicNum, HasBondAromaticity, HasBondOrder, HasFormalCharge,
    HasHydrogenCount, HasIsotope,
};

struct Fnv1aHasher(u64);

impl Fnv1aHasher {
    fn new() -> Self {
        Self(0xcbf29ce484222325)
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(0x100000001b3);
        }
    }
}

#[derive(Hash)]
struct AtomInvariant {
    atomic_num: u8,
    degree: usize,
    hydrogen_count: u8,
    formal_charge: i8,
    is_aromatic: bool,
    isotope: u16,
    /// single, double, triple, aromatic
    bond_counts: [u8; 4],
}

fn atom_invariant<A, B>(mol: &Mol<A, B>, idx: NodeIndex) -> AtomInvariant
where
    A: HasAtomicNum + HasHydrogenCount + HasFormalCharge + HasAromaticity + HasIsotope,
    B: HasBondOrder + HasBondAromaticity,
{
    let atom = mol.atom(idx);
    let mut bond_counts = [0u8; 4];
    for edge in mol.bonds_of(idx) {
        let bond = mol.bond(edge);
        let slot = if bond.is_aromatic_bond() {
            3
        } else {
            match bond.bond_order() {
                BondOrder::Single => 0,
                BondOrder::Double => 1,
                BondOrder::Triple => 2,
            }
        };
        bond_counts[slot] = bond_counts[slot].saturating_add(1);
    }
    AtomInvariant {
        atomic_num: atom.atomic_num(),
        degree: mol.degree(idx),
        hydrogen_count: atom.hydrogen_count(),
        formal_charge: atom.formal_charge(),
        is_aromatic: atom.is_aromatic(),
        isotope: atom.isotope(),
        bond_counts,
    }
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut h = Fnv1aHasher::new();
    value.hash(&mut h);
    h.finish()
}

/// Dense ranks: equal values share a rank, ranks are `0..distinct`.
fn ranks_from_values(values: &[u64]) -> Vec<usize> {
    let mut sorted: Vec<u64> = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    values
        .iter()
        .map(|v| sorted.binary_search(v).unwrap_or(0))
        .collect()
}

fn count_distinct(ranks: &[usize]) -> usize {
    let mut sorted: Vec<usize> = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// One class per atom, indexed by `NodeIndex::index()`.
pub fn symmetry_classes<A, B>(mol: &Mol<A, B>) -> Vec<usize>
where
    A: HasAtomicNum + HasHydrogenCount + HasFormalCharge + HasAromaticity + HasIsotope,
    B: HasBondOrder + HasBondAromaticity,
{
    let initial: Vec<u64> = mol
        .atoms()
        .map(|a| hash_of(&atom_invariant(mol, a)))
        .collect();
    let mut ranks = ranks_from_values(&initial);
    let mut prev_distinct = count_distinct(&ranks);

    loop {
        let values: Vec<u64> = mol
            .atoms()
            .map(|node| {
                let mut neighbor_ranks: Vec<(usize, u8, bool)> = mol
                    .bonds_of(node)
                    .filter_map(|edge| {
                        let nb = mol.other_end(edge, node)?;
                        let bond = mol.bond(edge);
                        Some((
                            ranks[nb.index()],
                            bond.bond_order().as_u8(),
                            bond.is_aromatic_bond(),
                        ))
                    })
                    .collect();
                neighbor_ranks.sort_unstable();
                hash_of(&(ranks[node.index()], neighbor_ranks))
            })
            .collect();
        let new_ranks = ranks_from_values(&values);
        let distinct = count_distinct(&new_ranks);
        if distinct <= prev_distinct {
            return ranks;
        }
        ranks = new_ranks;
        prev_distinct = distinct;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn classes(smiles: &str) -> Vec<usize> {
        symmetry_classes(&from_smiles(smiles).unwrap())
    }

    #[test]
    fn ethane_carbons_match() {
        let c = classes("CC");
        assert_eq!(c[0], c[1]);
    }

    #[test]
    fn ethanol_atoms_differ() {
        let c = classes("CCO");
        assert_eq!(count_distinct(&c), 3);
    }

    #[test]
    fn methylcyclohexane_mirror_positions() {
        // C0 methyl, C1 ring ipso, C2..C6 ring
        let c = classes("CC1CCCCC1");
        assert_eq!(c[2], c[6]);
        assert_eq!(c[3], c[5]);
        assert_ne!(c[2], c[3]);
        assert_ne!(c[4], c[3]);
    }

    #[test]
    fn classes_ignore_stereo() {
        let a = classes("F[C@H](Cl)Br");
        let b = classes("F[C@@H](Cl)Br");
        assert_eq!(a, b);
    }

    #[test]
    fn benzene_is_uniform() {
        let c = classes("c1ccccc1");
        assert_eq!(count_distinct(&c), 1);
    }

    #[test]
    fn refinement_separates_by_distance() {
        let c = classes("OCCCCC");
        assert_eq!(count_distinct(&c), 6);
    }
}
