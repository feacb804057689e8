//! Baseline stereo perception from symmetry classes, before any of the
//! candidate analysis runs.

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::{Atom, AtomFlags};
use crate::bond::{Bond, BondFlags, BondOrder};
use crate::element;
use crate::mol::Mol;
use crate::rings::RingInfo;

/// What distinguishes one substituent slot from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SlotKey {
    Class(usize),
    Hydrogen,
    LonePair,
}

fn neighbor_key(mol: &Mol<Atom, Bond>, classes: &[usize], n: NodeIndex) -> SlotKey {
    let atom = mol.atom(n);
    if atom.atomic_num == element::H && atom.isotope == 0 && mol.degree(n) == 1 {
        SlotKey::Hydrogen
    } else {
        SlotKey::Class(classes[n.index()])
    }
}

/// One key per substituent, every implicit H included. With `across` set,
/// the double-bond partner is left out and no lone pair is added.
fn substituent_keys(
    mol: &Mol<Atom, Bond>,
    classes: &[usize],
    atom: NodeIndex,
    across: Option<NodeIndex>,
) -> Vec<SlotKey> {
    let mut keys: Vec<SlotKey> = mol
        .neighbors(atom)
        .filter(|&n| Some(n) != across)
        .map(|n| neighbor_key(mol, classes, n))
        .collect();
    let h = mol.atom(atom).hydrogen_count as usize;
    keys.extend(std::iter::repeat(SlotKey::Hydrogen).take(h));
    if across.is_none()
        && mol.total_degree(atom) == 3
        && element::has_lone_pair_stereo(mol.atom(atom).atomic_num)
    {
        keys.push(SlotKey::LonePair);
    }
    keys
}

fn all_distinct(mut keys: Vec<SlotKey>) -> bool {
    let len = keys.len();
    keys.sort_unstable();
    keys.dedup();
    keys.len() == len
}

/// Sum of bond orders including implicit hydrogens.
pub(crate) fn valence(mol: &Mol<Atom, Bond>, atom: NodeIndex) -> usize {
    let bonds: usize = mol
        .bonds_of(atom)
        .map(|e| mol.bond(e).order.as_u8() as usize)
        .sum();
    bonds + mol.atom(atom).hydrogen_count as usize
}

pub fn is_baseline_chiral(mol: &Mol<Atom, Bond>, classes: &[usize], atom: NodeIndex) -> bool {
    let a = mol.atom(atom);
    if a.is_aromatic || a.atomic_num == 0 {
        return false;
    }
    let keys = substituent_keys(mol, classes, atom, None);
    keys.len() == 4 && all_distinct(keys)
}

pub fn is_baseline_stereo_bond(mol: &Mol<Atom, Bond>, classes: &[usize], bond: EdgeIndex) -> bool {
    let b = mol.bond(bond);
    if b.order != BondOrder::Double || b.is_aromatic {
        return false;
    }
    let Some((a1, a2)) = mol.bond_endpoints(bond) else {
        return false;
    };
    let end_ok = |end: NodeIndex, partner: NodeIndex| {
        let keys = substituent_keys(mol, classes, end, Some(partner));
        match keys.len() {
            2 => keys[0] != keys[1],
            // imine nitrogen: the lone pair is the second substituent
            1 => {
                element::has_lone_pair_stereo(mol.atom(end).atomic_num)
                    && mol.total_degree(end) == 2
            }
            _ => false,
        }
    };
    end_ok(a1, a2) && end_ok(a2, a1)
}

/// Marks baseline-chiral atoms and stereo double bonds.
pub fn perceive_baseline(mol: &mut Mol<Atom, Bond>, classes: &[usize]) {
    let chiral: Vec<NodeIndex> = mol
        .atoms()
        .filter(|&a| is_baseline_chiral(mol, classes, a))
        .collect();
    for atom in chiral {
        mol.atom_mut(atom).flags.insert(AtomFlags::CHIRAL);
    }
    let stereo_bonds: Vec<EdgeIndex> = mol
        .bonds()
        .filter(|&b| is_baseline_stereo_bond(mol, classes, b))
        .collect();
    for bond in stereo_bonds {
        mol.bond_mut(bond).flags.insert(BondFlags::CHIRAL);
    }
}

/// A nitrogen keeps its chirality only when it cannot invert: quaternary,
/// or locked as a strained bridgehead that is not next to another
/// bridgehead or an aromatic atom.
pub fn is_chiral_nitrogen(mol: &Mol<Atom, Bond>, rings: &RingInfo, atom: NodeIndex) -> bool {
    let a = mol.atom(atom);
    if !a.flags.contains(AtomFlags::CHIRAL) {
        return false;
    }
    let degree = mol.degree(atom);
    // a multiple bond shows as valence beyond the H-inclusive degree
    if valence(mol, atom) > mol.total_degree(atom) || a.is_aromatic || degree < 3 {
        return false;
    }
    if degree == 4 && mol.total_hydrogens(atom) == 0 {
        return true;
    }
    if rings.ring_bond_count(atom) < 3 || !a.flags.contains(AtomFlags::STRAINED_BRIDGEHEAD) {
        return false;
    }
    !mol.neighbors(atom).any(|n| {
        let nb = mol.atom(n);
        nb.flags.contains(AtomFlags::STRAINED_BRIDGEHEAD) || nb.is_aromatic
    })
}

/// Un-marks every nitrogen that fails [`is_chiral_nitrogen`] and marks it
/// stereo-cleared.
pub fn apply_nitrogen_rule(mol: &mut Mol<Atom, Bond>, rings: &RingInfo) {
    let cleared: Vec<NodeIndex> = mol
        .atoms()
        .filter(|&a| mol.atom(a).atomic_num == element::N && !is_chiral_nitrogen(mol, rings, a))
        .collect();
    for atom in cleared {
        let flags = &mut mol.atom_mut(atom).flags;
        flags.remove(AtomFlags::CHIRAL);
        flags.insert(AtomFlags::STEREO_CLEARED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;
    use crate::symmetry::symmetry_classes;

    fn perceived(smiles: &str) -> Mol<Atom, Bond> {
        let mut mol = from_smiles(smiles).unwrap();
        let classes = symmetry_classes(&mol);
        perceive_baseline(&mut mol, &classes);
        mol
    }

    fn chiral_atoms(mol: &Mol<Atom, Bond>) -> Vec<usize> {
        mol.atoms()
            .filter(|&a| mol.atom(a).flags.contains(AtomFlags::CHIRAL))
            .map(|a| a.index())
            .collect()
    }

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn four_distinct_substituents() {
        assert_eq!(chiral_atoms(&perceived("CC(N)C(=O)O")), vec![1]);
        assert!(chiral_atoms(&perceived("CC(C)O")).is_empty());
        assert!(chiral_atoms(&perceived("C(F)(Cl)")).is_empty());
    }

    #[test]
    fn ring_cis_trans_atoms_are_not_baseline_chiral() {
        assert!(chiral_atoms(&perceived("CC1CCC(C)CC1")).is_empty());
    }

    #[test]
    fn sulfoxide_lone_pair_counts() {
        assert_eq!(chiral_atoms(&perceived("CS(=O)CC")), vec![1]);
        assert!(chiral_atoms(&perceived("CS(=O)C")).is_empty());
    }

    #[test]
    fn isotopic_hydrogen_is_distinct() {
        assert_eq!(chiral_atoms(&perceived("FC([2H])C")), vec![1]);
        assert!(chiral_atoms(&perceived("FC([H])C")).is_empty());
    }

    #[test]
    fn aromatic_atoms_are_never_chiral() {
        assert!(chiral_atoms(&perceived("Cc1ccccc1")).is_empty());
    }

    #[test]
    fn stereo_double_bonds() {
        let mol = perceived("CC=CC");
        let bond = mol.bond_between(n(1), n(2)).unwrap();
        assert!(mol.bond(bond).flags.contains(BondFlags::CHIRAL));

        let mol = perceived("CC(C)=CC");
        let bond = mol.bond_between(n(1), n(3)).unwrap();
        assert!(!mol.bond(bond).flags.contains(BondFlags::CHIRAL));

        let mol = perceived("C=CC");
        assert!(mol.bonds().all(|b| mol.bond(b).flags.is_empty()));
    }

    #[test]
    fn imine_counts_lone_pair() {
        let mol = perceived("CC(CC)=NO");
        let bond = mol.bond_between(n(1), n(4)).unwrap();
        assert!(mol.bond(bond).flags.contains(BondFlags::CHIRAL));
    }

    #[test]
    fn nitrogen_rule() {
        let mut amine = perceived("CN(CC)CCC");
        assert_eq!(chiral_atoms(&amine), vec![1]);
        let rings = RingInfo::perceive(&amine);
        apply_nitrogen_rule(&mut amine, &rings);
        assert!(chiral_atoms(&amine).is_empty());
        assert!(amine.atom(n(1)).flags.contains(AtomFlags::STEREO_CLEARED));

        let mut ammonium = perceived("C[N+](CC)(CCC)CCCC");
        let rings = RingInfo::perceive(&ammonium);
        apply_nitrogen_rule(&mut ammonium, &rings);
        assert_eq!(chiral_atoms(&ammonium), vec![1]);
    }

    #[test]
    fn bridgehead_nitrogen_needs_the_strained_flag() {
        let mut mol = perceived("CC1CN2CC(O)C1CC2");
        let rings = RingInfo::perceive(&mol);
        let n_idx = n(3);
        assert!(mol.atom(n_idx).flags.contains(AtomFlags::CHIRAL));
        assert!(!is_chiral_nitrogen(&mol, &rings, n_idx));
        mol.atom_mut(n_idx).flags.insert(AtomFlags::STRAINED_BRIDGEHEAD);
        assert!(is_chiral_nitrogen(&mol, &rings, n_idx));
    }

    #[test]
    fn protonated_bridgehead_nitrogen_is_not_mistaken_for_a_double_bond() {
        let mut mol = perceived("CC1C[NH+]2CC(O)C1CC2");
        let rings = RingInfo::perceive(&mol);
        let n_idx = n(3);
        assert!(mol.atom(n_idx).flags.contains(AtomFlags::CHIRAL));
        mol.atom_mut(n_idx).flags.insert(AtomFlags::STRAINED_BRIDGEHEAD);
        assert!(is_chiral_nitrogen(&mol, &rings, n_idx));
    }

    #[test]
    fn imine_nitrogen_is_never_chiral() {
        let mut mol = perceived("C1CC2CC1C=[N+]2C");
        let rings = RingInfo::perceive(&mol);
        let n_idx = n(6);
        mol.atom_mut(n_idx)
            .flags
            .insert(AtomFlags::CHIRAL | AtomFlags::STRAINED_BRIDGEHEAD);
        assert!(!is_chiral_nitrogen(&mol, &rings, n_idx));
    }
}
