//! Single-centre inversion test on the stereo reference copy.
//!
//! The reference is a copy of the molecule in which every candidate and
//! every chiral atom carries some descriptor. A candidate is stereogenic
//! when flipping its descriptor alone produces a graph that no longer
//! matches the reference.

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::atom::{Atom, AtomFlags};
use crate::bond::{Bond, BondFlags};
use crate::mol::{AtomParity, Mol};
use crate::substruct::SelfMatcher;

/// Drops every descriptor on `reference` that cannot matter to the
/// self-match: only chiral atoms, candidates, bridgeheads and stereo
/// double bonds of `mol` keep theirs.
pub fn retain_relevant_stereo(mol: &Mol<Atom, Bond>, reference: &mut Mol<Atom, Bond>) {
    let keep_atom = |center: NodeIndex| {
        let flags = mol.atom(center).flags;
        (flags.is_chiral() && !flags.contains(AtomFlags::STEREO_CLEARED))
            || flags.intersects(AtomFlags::CANDIDATE | AtomFlags::STRAINED_BRIDGEHEAD)
    };
    let atoms: Vec<_> = reference
        .tetrahedral_stereo()
        .iter()
        .filter(|s| keep_atom(s.center))
        .copied()
        .collect();
    reference.set_tetrahedral_stereo(atoms);
    let bonds: Vec<_> = reference
        .ez_stereo()
        .iter()
        .filter(|s| {
            mol.bond_between(s.bond.0, s.bond.1)
                .is_some_and(|e| mol.bond(e).flags.contains(BondFlags::CHIRAL))
        })
        .copied()
        .collect();
    reference.set_ez_stereo(bonds);
}

/// Gives an arbitrary descriptor to every candidate and every chiral atom
/// of a chiral-capable element that has none yet on `reference`.
pub fn assign_reference_stereo(
    mol: &Mol<Atom, Bond>,
    reference: &mut Mol<Atom, Bond>,
    chiral_elements: &[u8],
) {
    let targets: Vec<NodeIndex> = mol
        .atoms()
        .filter(|&a| {
            let atom = mol.atom(a);
            atom.flags.contains(AtomFlags::CANDIDATE)
                || (atom.flags.is_chiral()
                    && !atom.flags.contains(AtomFlags::STEREO_CLEARED)
                    && chiral_elements.contains(&atom.atomic_num))
        })
        .collect();
    for atom in targets {
        if reference.has_atom_stereo(atom) {
            continue;
        }
        if let Some(order) = reference.substituent_array(atom) {
            reference.set_atom_parity(atom, order, AtomParity::Right);
        }
    }
}

/// `true` when inverting `atom` alone breaks the self-match. An atom
/// without a descriptor on `reference` is never stereogenic.
pub fn is_stereogenic<M: SelfMatcher + ?Sized>(
    reference: &Mol<Atom, Bond>,
    matcher: &M,
    classes: &[usize],
    atom: NodeIndex,
) -> bool {
    let mut inverted = reference.clone();
    if !inverted.invert_atom_stereo(atom) {
        return false;
    }
    !matcher.self_match(reference, &inverted, classes)
}

/// Flags every non-bridgehead candidate that survives
/// [`is_stereogenic`] as a non-chiral stereocentre.
pub fn test_candidates<M: SelfMatcher + ?Sized>(
    mol: &mut Mol<Atom, Bond>,
    reference: &Mol<Atom, Bond>,
    matcher: &M,
    classes: &[usize],
    candidates: &[NodeIndex],
) {
    for &atom in candidates {
        if mol.atom(atom).flags.contains(AtomFlags::STRAINED_BRIDGEHEAD) {
            continue;
        }
        let stereogenic = is_stereogenic(reference, matcher, classes, atom);
        debug!(atom = atom.index(), stereogenic, "Inversion test.");
        if stereogenic {
            let flags = &mut mol.atom_mut(atom).flags;
            flags.insert(AtomFlags::NON_CHIRAL_STEREO);
            flags.remove(AtomFlags::STEREO_CLEARED);
        }
    }
}
