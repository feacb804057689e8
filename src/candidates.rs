//! Stereocentre candidate detection by counting neighbour symmetry classes.

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::atom::{Atom, AtomFlags};
use crate::bond::{Bond, BondFlags};
use crate::config::CandidateRule;
use crate::element;
use crate::error::ConfigError;
use crate::mol::Mol;
use crate::perception::valence;
use crate::rings::RingInfo;

/// A [`CandidateRule`] with its element symbol resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityRule {
    atomic_num: u8,
    min_heavy_degree: Option<usize>,
    heavy_degree: Option<usize>,
    total_degree: Option<usize>,
    formal_charge: Option<i8>,
    total_hydrogens: Option<usize>,
}

impl EligibilityRule {
    pub fn from_config(rule: &CandidateRule) -> Result<Self, ConfigError> {
        let atomic_num = element::atomic_num_from_symbol(&rule.element)
            .ok_or_else(|| ConfigError::UnknownElement(rule.element.clone()))?;
        Ok(Self {
            atomic_num,
            min_heavy_degree: rule.min_heavy_degree,
            heavy_degree: rule.heavy_degree,
            total_degree: rule.total_degree,
            formal_charge: rule.formal_charge,
            total_hydrogens: rule.total_hydrogens,
        })
    }

    pub fn admits(&self, mol: &Mol<Atom, Bond>, atom: NodeIndex) -> bool {
        let a = mol.atom(atom);
        if a.atomic_num != self.atomic_num {
            return false;
        }
        let heavy = mol.heavy_degree(atom);
        self.min_heavy_degree.map_or(true, |m| heavy >= m)
            && self.heavy_degree.map_or(true, |d| heavy == d)
            && self
                .total_degree
                .map_or(true, |d| mol.total_degree(atom) == d)
            && self.formal_charge.map_or(true, |c| a.formal_charge == c)
            && self
                .total_hydrogens
                .map_or(true, |h| mol.total_hydrogens(atom) == h)
    }
}

/// Outcome of the candidate scan over one molecule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateScan {
    pub candidates: Vec<NodeIndex>,
    /// Atoms already chiral when the scan started.
    pub n_chiral: usize,
    pub n_chiral_in_ring: usize,
    /// Spiro candidates whose neighbours fall into two classes.
    pub n_spiro: usize,
}

impl CandidateScan {
    /// With no chiral ring atom, at most one candidate and nothing that
    /// could couple to it, no candidate can turn out stereogenic.
    ///
    /// This misses coupled centres in a few caged topologies such as the
    /// spiro centre of `N1C[C@]12CN2`.
    pub fn allows_early_exit(&self, n_specified_stereo_bonds: usize) -> bool {
        if self.n_chiral_in_ring != 0 {
            return false;
        }
        self.candidates.is_empty()
            || (self.candidates.len() == 1
                && self.n_spiro == 0
                && self.n_chiral < 2
                && n_specified_stereo_bonds < 2)
    }
}

/// Distinct symmetry classes around `atom`, with an implicit H and a lone
/// pair each adding one when they are distinguishable.
pub fn n_sym_class(mol: &Mol<Atom, Bond>, classes: &[usize], atom: NodeIndex) -> usize {
    let mut seen: Vec<usize> = mol.neighbors(atom).map(|n| classes[n.index()]).collect();
    seen.sort_unstable();
    seen.dedup();
    let mut count = seen.len();

    let a = mol.atom(atom);
    if a.hydrogen_count > 0 {
        let mut explicit_h = mol
            .neighbors(atom)
            .filter(|&n| mol.atom(n).atomic_num == element::H)
            .peekable();
        let no_explicit = explicit_h.peek().is_none();
        if no_explicit || !explicit_h.any(|n| mol.atom(n).isotope == 0) {
            count += 1;
        }
    }

    let degree = mol.degree(atom);
    if a.atomic_num == element::S && degree == 3 && valence(mol, atom) == 4 {
        count += 1;
    }
    if a.atomic_num == element::N
        && a.flags.contains(AtomFlags::STRAINED_BRIDGEHEAD)
        && degree == 3
    {
        count += 1;
    }
    count
}

/// Double bonds that are stereo by perception and carry a descriptor.
pub fn specified_stereo_bond_count(mol: &Mol<Atom, Bond>) -> usize {
    mol.bonds()
        .filter(|&e| mol.bond(e).flags.contains(BondFlags::CHIRAL))
        .filter_map(|e| mol.bond_endpoints(e))
        .filter(|&(a, b)| mol.ez_stereo_for(a, b).is_some())
        .count()
}

/// Marks candidates with [`AtomFlags::CANDIDATE`]. An eligible atom whose
/// four neighbours are all distinct but was not perceived as chiral is
/// marked chiral here instead.
pub fn scan(
    mol: &mut Mol<Atom, Bond>,
    rings: &RingInfo,
    classes: &[usize],
    rules: &[EligibilityRule],
) -> CandidateScan {
    let mut out = CandidateScan::default();
    let atoms: Vec<NodeIndex> = mol.atoms().collect();
    for atom in atoms {
        let a = mol.atom(atom);
        if a.is_aromatic {
            continue;
        }
        if a.flags.is_chiral() {
            out.n_chiral += 1;
            if rings.is_ring_atom(atom) {
                out.n_chiral_in_ring += 1;
            }
            continue;
        }
        if !rules.iter().any(|r| r.admits(mol, atom)) {
            continue;
        }

        let n_sym = n_sym_class(mol, classes, atom);
        let bridgehead = a.flags.contains(AtomFlags::STRAINED_BRIDGEHEAD);
        if n_sym <= 2 && rings.ring_bond_count(atom) == 4 && !bridgehead {
            if n_sym == 2 {
                out.n_spiro += 1;
            }
            out.candidates.push(atom);
            continue;
        }
        match n_sym {
            4 => {
                mol.atom_mut(atom)
                    .flags
                    .insert(AtomFlags::CHIRAL | AtomFlags::CHIRAL_NOT_RECOGNIZED);
            }
            3 => out.candidates.push(atom),
            _ => {}
        }
    }
    for &atom in &out.candidates {
        mol.atom_mut(atom).flags.insert(AtomFlags::CANDIDATE);
    }
    debug!(
        candidates = out.candidates.len(),
        chiral = out.n_chiral,
        chiral_in_ring = out.n_chiral_in_ring,
        spiro = out.n_spiro,
        "Candidate scan complete."
    );
    out
}
