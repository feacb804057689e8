//! Ring-system pass after the single-inversion test.
//!
//! Single inversion cannot see centres that only matter jointly, nor
//! bridgeheads whose configuration is fixed by the cage around them. Each
//! ring system is revisited here and its candidates and bridgeheads are
//! confirmed or demoted.

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::atom::{Atom, AtomFlags};
use crate::bond::Bond;
use crate::mol::Mol;
use crate::rings::RingInfo;
use crate::substruct::SelfMatcher;

/// Marks `atom` as carrying no stereo and removes its descriptor from the
/// reference. A descriptor drawn on the molecule itself stays in place so
/// the classify stage can report it.
pub fn demote(mol: &mut Mol<Atom, Bond>, reference: &mut Mol<Atom, Bond>, atom: NodeIndex) {
    let flags = &mut mol.atom_mut(atom).flags;
    flags.insert(AtomFlags::STEREO_CLEARED);
    flags.remove(AtomFlags::NON_CHIRAL_STEREO);
    reference.remove_tetrahedral_stereo(atom);
    debug!(atom = atom.index(), "Demoted stereocentre.");
}

/// Looks for the first pair of neighbours of `center` in the same symmetry
/// class and searches outward from the first of them, never passing
/// through `center`. Succeeds when the search reaches a chiral atom or a
/// candidate. A centre without equivalent neighbours passes trivially.
pub fn symmetric_substituents_have_stereo(
    mol: &Mol<Atom, Bond>,
    classes: &[usize],
    center: NodeIndex,
) -> bool {
    let neighbors: Vec<NodeIndex> = mol.neighbors(center).collect();
    let start = neighbors.iter().enumerate().find_map(|(i, &a)| {
        neighbors[i + 1..]
            .iter()
            .any(|&b| classes[a.index()] == classes[b.index()])
            .then_some(a)
    });
    match start {
        Some(start) => stereo_reachable(mol, center, start),
        None => true,
    }
}

fn stereo_reachable(mol: &Mol<Atom, Bond>, blocked: NodeIndex, start: NodeIndex) -> bool {
    let mut visited = vec![false; mol.atom_count()];
    visited[blocked.index()] = true;
    visited[start.index()] = true;
    let mut stack = vec![start];
    while let Some(atom) = stack.pop() {
        let flags = mol.atom(atom).flags;
        if flags.is_chiral() || flags.contains(AtomFlags::CANDIDATE) {
            return true;
        }
        for n in mol.neighbors(atom) {
            if !visited[n.index()] {
                visited[n.index()] = true;
                stack.push(n);
            }
        }
    }
    false
}

/// Bridgeheads of one ring system together with the candidates around them.
struct RingSystemView {
    candidates: Vec<NodeIndex>,
    strained_heads: Vec<NodeIndex>,
    confirmed: Vec<NodeIndex>,
}

impl RingSystemView {
    fn collect(
        mol: &Mol<Atom, Bond>,
        rings: &RingInfo,
        candidates: &[NodeIndex],
        id: usize,
    ) -> Self {
        let candidates: Vec<NodeIndex> = candidates
            .iter()
            .copied()
            .filter(|&a| rings.ring_system(a) == id)
            .collect();
        let (strained_heads, rest): (Vec<_>, Vec<_>) = candidates
            .iter()
            .copied()
            .partition(|&a| mol.atom(a).flags.contains(AtomFlags::STRAINED_BRIDGEHEAD));
        let confirmed = rest
            .into_iter()
            .filter(|&a| mol.atom(a).flags.contains(AtomFlags::NON_CHIRAL_STEREO))
            .collect();
        Self {
            candidates,
            strained_heads,
            confirmed,
        }
    }
}

/// Runs the ring-system pass over every ring system of `mol`.
pub fn propagate<M: SelfMatcher + ?Sized>(
    mol: &mut Mol<Atom, Bond>,
    reference: &mut Mol<Atom, Bond>,
    rings: &RingInfo,
    classes: &[usize],
    matcher: &M,
    candidates: &[NodeIndex],
) {
    for id in 1..=rings.num_ring_systems() {
        let mut view = RingSystemView::collect(mol, rings, candidates, id);

        if let &[exo] = view.confirmed.as_slice() {
            if !view.strained_heads.is_empty()
                && !exo_survives_without_heads(mol, reference, classes, matcher, exo, &view)
            {
                demote(mol, reference, exo);
                view.confirmed.clear();
            }
        }

        let mut n_cleared = 0;
        if !view.confirmed.is_empty() {
            for &atom in &view.candidates {
                // cleared atoms stay cleared
                if mol
                    .atom(atom)
                    .flags
                    .intersects(AtomFlags::NON_CHIRAL_STEREO | AtomFlags::STEREO_CLEARED)
                {
                    continue;
                }
                if symmetric_substituents_have_stereo(mol, classes, atom) {
                    mol.atom_mut(atom).flags.insert(AtomFlags::NON_CHIRAL_STEREO);
                } else {
                    demote(mol, reference, atom);
                    n_cleared += 1;
                }
            }
        }

        if no_confirmed_left(view.confirmed.len(), n_cleared) {
            for &head in &view.strained_heads {
                reference.remove_tetrahedral_stereo(head);
            }
        }

        invert_caged(mol, reference, rings, classes, matcher, id);
    }
}

/// Bridgeheads lose their reference stereo when the candidate pass demoted
/// as many atoms as the ring system had confirmed centres.
fn no_confirmed_left(n_confirmed: usize, n_cleared: usize) -> bool {
    n_confirmed == n_cleared
}

/// Inverts the one confirmed centre of a ring system on a reference whose
/// non-chiral bridgeheads carry no stereo.
fn exo_survives_without_heads<M: SelfMatcher + ?Sized>(
    mol: &Mol<Atom, Bond>,
    reference: &Mol<Atom, Bond>,
    classes: &[usize],
    matcher: &M,
    exo: NodeIndex,
    view: &RingSystemView,
) -> bool {
    let mut base = reference.clone();
    for &head in &view.strained_heads {
        if !mol.atom(head).flags.is_chiral() {
            base.remove_tetrahedral_stereo(head);
        }
    }
    let mut inverted = base.clone();
    if !inverted.invert_atom_stereo(exo) {
        return true;
    }
    !matcher.self_match(&base, &inverted, classes)
}

/// Inverts every chiral bridgehead of ring system `id` at once. If the
/// cage still matches itself, those bridgeheads carry no stereo of their
/// own and are demoted together.
fn invert_caged<M: SelfMatcher + ?Sized>(
    mol: &mut Mol<Atom, Bond>,
    reference: &mut Mol<Atom, Bond>,
    rings: &RingInfo,
    classes: &[usize],
    matcher: &M,
    id: usize,
) {
    let in_system: Vec<NodeIndex> = mol
        .atoms()
        .filter(|&a| rings.ring_system(a) == id)
        .collect();
    if !in_system.iter().any(|&a| mol.atom(a).flags.is_chiral()) {
        return;
    }

    let mut base = reference.clone();
    let mut heads = Vec::new();
    for &atom in &in_system {
        let flags = mol.atom(atom).flags;
        if !flags.contains(AtomFlags::STRAINED_BRIDGEHEAD) {
            continue;
        }
        if flags.is_chiral() {
            heads.push(atom);
        } else {
            base.remove_tetrahedral_stereo(atom);
        }
    }

    let mut inverted = base.clone();
    let n_inverted = heads
        .iter()
        .filter(|&&h| inverted.invert_atom_stereo(h))
        .count();
    if n_inverted == 0 || !matcher.self_match(&base, &inverted, classes) {
        return;
    }

    debug!(ring_system = id, heads = heads.len(), "Caged bridgeheads carry no stereo.");
    for head in heads {
        demote(mol, reference, head);
        mol.atom_mut(head)
            .flags
            .remove(AtomFlags::CHIRAL | AtomFlags::CHIRAL_NOT_RECOGNIZED);
    }
}
