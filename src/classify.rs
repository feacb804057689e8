//! Counting stereo elements, the structure-flag decision table and the
//! check of an asserted flag against it.

use std::fmt;
use std::str::FromStr;

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::Serialize;
use tracing::debug;

use crate::atom::{Atom, AtomFlags};
use crate::bond::{Bond, BondFlags};
use crate::element;
use crate::error::{MismatchKind, StereoError, UnknownStructureFlag, WedgeProblem};
use crate::mol::Mol;
use crate::rings::RingInfo;
use crate::validate::{is_possible_axis, Findings};

/// Coarse stereo classification of a whole molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureFlag {
    NoStereo,
    SingleStereoisomer,
    SingleUnknownStereoisomer,
    MixtureOfEnantiomers,
    MixtureOfDiastereomers,
    UncertainStructure,
}

impl StructureFlag {
    pub const ALL: [StructureFlag; 6] = [
        StructureFlag::NoStereo,
        StructureFlag::SingleStereoisomer,
        StructureFlag::SingleUnknownStereoisomer,
        StructureFlag::MixtureOfEnantiomers,
        StructureFlag::MixtureOfDiastereomers,
        StructureFlag::UncertainStructure,
    ];

    /// Every spelling accepted by [`FromStr`]; the first is the display name.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            StructureFlag::NoStereo => &["No Stereo", "NS"],
            StructureFlag::SingleStereoisomer => {
                &["Single Known Stereoisomer", "Single Stereoisomer", "SI"]
            }
            StructureFlag::SingleUnknownStereoisomer => &["Single Unknown Stereoisomer", "SUI"],
            StructureFlag::MixtureOfEnantiomers => &["Mixture of Enantiomers", "ME"],
            StructureFlag::MixtureOfDiastereomers => {
                &["Mixture of Diastereomers", "Mixture of Stereoisomers", "MI"]
            }
            StructureFlag::UncertainStructure => &["Uncertain Structure"],
        }
    }
}

impl fmt::Display for StructureFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.names()[0])
    }
}

impl FromStr for StructureFlag {
    type Err = UnknownStructureFlag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        StructureFlag::ALL
            .into_iter()
            .find(|flag| flag.names().contains(&s))
            .ok_or_else(|| UnknownStructureFlag(s.to_string()))
    }
}

/// Totals and specified counts of each kind of stereo element. The
/// non-tetrahedral pair is kept apart here; the decision table adds it to
/// the chiral pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StereoCounts {
    pub chiral_total: usize,
    pub chiral_specified: usize,
    pub non_chiral_total: usize,
    pub non_chiral_specified: usize,
    pub double_bond_total: usize,
    pub double_bond_specified: usize,
    pub non_tetrahedral_total: usize,
    pub non_tetrahedral_specified: usize,
}

impl StereoCounts {
    fn chiral_folded(&self) -> (usize, usize) {
        (
            self.chiral_total + self.non_tetrahedral_total,
            self.chiral_specified + self.non_tetrahedral_specified,
        )
    }

    fn relative_specified(&self) -> bool {
        self.non_chiral_total == self.non_chiral_specified
            && self.double_bond_total == self.double_bond_specified
    }

    fn has_centers(&self) -> bool {
        self.chiral_folded().0 + self.non_chiral_total + self.double_bond_total > 0
    }
}

/// Outcome of classifying one molecule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub flag: StructureFlag,
    pub counts: StereoCounts,
    pub has_error: bool,
    pub success: bool,
    pub errors: Vec<StereoError>,
    /// The candidate analysis was skipped as unable to find anything.
    pub early_exit: bool,
}

/// Everything the classify stage needs besides the molecule.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyOptions {
    pub max_ring_size_without_bond_stereo: usize,
    pub expected_non_tetrahedral: Option<usize>,
    pub asserted: Option<StructureFlag>,
}

/// Charged chiral sulfur cannot hold a configuration.
fn clear_charged_sulfur(mol: &mut Mol<Atom, Bond>) {
    let charged: Vec<NodeIndex> = mol
        .atoms()
        .filter(|&a| {
            let atom = mol.atom(a);
            atom.atomic_num == element::S && atom.flags.is_chiral() && atom.formal_charge != 0
        })
        .collect();
    for atom in charged {
        mol.atom_mut(atom).flags.insert(AtomFlags::STEREO_CLEARED);
    }
}

/// Reports and removes descriptors left on stereo-cleared atoms.
pub fn clear_demoted_descriptors(mol: &mut Mol<Atom, Bond>, findings: &mut Findings) {
    let stale: Vec<NodeIndex> = mol
        .tetrahedral_stereo()
        .iter()
        .map(|s| s.center)
        .filter(|&c| {
            let flags = mol.atom(c).flags;
            flags.contains(AtomFlags::STEREO_CLEARED) && !flags.contains(AtomFlags::ATROPISOMERIC)
        })
        .collect();
    for center in stale {
        mol.remove_tetrahedral_stereo(center);
        findings.push(StereoError::InvalidWedge {
            atom: center.index(),
            problem: WedgeProblem::NoStereo,
        });
    }
}

fn in_small_ring(rings: &RingInfo, bond: EdgeIndex, max_ring_size: usize) -> bool {
    rings
        .bond_ring_size(bond)
        .is_some_and(|size| size <= max_ring_size)
}

/// Counts chiral atoms, non-chiral stereocentres, stereo double bonds and
/// atropisomeric axes of an annotated molecule.
pub fn count_stereo(
    mol: &Mol<Atom, Bond>,
    rings: &RingInfo,
    max_ring_size: usize,
) -> StereoCounts {
    let mut counts = StereoCounts::default();
    for atom in mol.atoms() {
        let flags = mol.atom(atom).flags;
        if flags.contains(AtomFlags::STEREO_CLEARED) {
            continue;
        }
        let specified = mol.has_atom_stereo(atom) as usize;
        if flags.is_chiral() {
            counts.chiral_total += 1;
            counts.chiral_specified += specified;
        }
        if flags.contains(AtomFlags::NON_CHIRAL_STEREO) {
            counts.non_chiral_total += 1;
            counts.non_chiral_specified += specified;
        }
    }
    for bond in mol.bonds() {
        let flags = mol.bond(bond).flags;
        if flags.contains(BondFlags::STEREO_CLEARED) || in_small_ring(rings, bond, max_ring_size) {
            continue;
        }
        if flags.contains(BondFlags::CHIRAL) {
            counts.double_bond_total += 1;
            let specified = mol
                .bond_endpoints(bond)
                .is_some_and(|(a, b)| mol.ez_stereo_for(a, b).is_some());
            counts.double_bond_specified += specified as usize;
        }
        if flags.contains(BondFlags::ATROPISOMERIC) {
            counts.non_tetrahedral_total += 1;
            counts.non_tetrahedral_specified += 1;
        }
    }
    counts
}

/// Raises the non-tetrahedral total to the expected number, unless the
/// molecule cannot hold that many axes.
fn apply_expected_non_tetrahedral(
    counts: &mut StereoCounts,
    mol: &Mol<Atom, Bond>,
    rings: &RingInfo,
    expected: Option<usize>,
    findings: &mut Findings,
) {
    let Some(expected) = expected else {
        return;
    };
    let possible = mol
        .bonds()
        .filter(|&b| is_possible_axis(mol, rings, b))
        .count();
    if expected > possible {
        findings.push(StereoError::TemplateInfeasible { expected, possible });
        return;
    }
    counts.non_tetrahedral_total = counts.non_tetrahedral_total.max(expected);
}

/// The structure flag implied by `counts`.
pub fn decide(counts: &StereoCounts, n_atoms: usize) -> StructureFlag {
    if !counts.relative_specified() {
        return StructureFlag::MixtureOfDiastereomers;
    }
    let (total, specified) = counts.chiral_folded();
    match total {
        0 if counts.non_chiral_total + counts.double_bond_total > 0 => {
            StructureFlag::SingleStereoisomer
        }
        0 if n_atoms == 0 => StructureFlag::UncertainStructure,
        0 => StructureFlag::NoStereo,
        1 if specified == 1 => StructureFlag::SingleStereoisomer,
        1 => StructureFlag::MixtureOfEnantiomers,
        _ if specified == total => StructureFlag::SingleStereoisomer,
        _ => StructureFlag::MixtureOfDiastereomers,
    }
}

/// How `asserted` contradicts `counts`, if it does.
pub fn mismatch(
    counts: &StereoCounts,
    n_atoms: usize,
    asserted: StructureFlag,
) -> Option<MismatchKind> {
    use StructureFlag::*;

    if !counts.has_centers() {
        let allowed = if n_atoms > 0 {
            matches!(asserted, NoStereo | UncertainStructure)
        } else {
            asserted == UncertainStructure
        };
        return (!allowed).then_some(MismatchKind::NoCentersButFlagged);
    }

    let (chiral_total, chiral_specified) = counts.chiral_folded();
    let relative = counts.relative_specified();
    match asserted {
        NoStereo => Some(MismatchKind::CentersDeclaredNoStereo),
        SingleStereoisomer if chiral_total != chiral_specified || !relative => {
            Some(MismatchKind::SingleNotFullySpecified)
        }
        MixtureOfEnantiomers if chiral_total == 0 => {
            Some(MismatchKind::EnantiomersWithoutChiralCenter)
        }
        MixtureOfEnantiomers if !relative => {
            Some(MismatchKind::EnantiomersWithUnspecifiedRelative)
        }
        MixtureOfDiastereomers
            if chiral_total == 0
                && relative
                && counts.non_chiral_specified / 2 + counts.double_bond_total == 1 =>
        {
            Some(MismatchKind::DiastereomersSingleRelativeCenter)
        }
        MixtureOfDiastereomers if chiral_total == 1 && relative => {
            Some(MismatchKind::DiastereomersShouldBeEnantiomers)
        }
        _ => None,
    }
}

/// Leaves only the descriptors that `flag` asserts to be known.
pub fn strip_descriptors(mol: &mut Mol<Atom, Bond>, flag: StructureFlag) {
    if flag == StructureFlag::SingleStereoisomer {
        return;
    }
    if flag != StructureFlag::MixtureOfEnantiomers {
        mol.clear_stereo();
        return;
    }
    let kept: Vec<_> = mol
        .tetrahedral_stereo()
        .iter()
        .filter(|s| {
            let flags = mol.atom(s.center).flags;
            flags.is_chiral() && !flags.contains(AtomFlags::NON_CHIRAL_STEREO)
        })
        .copied()
        .collect();
    mol.set_tetrahedral_stereo(kept);
    mol.set_ez_stereo(Vec::new());
}

/// Counts, decides, checks the asserted flag and strips descriptors.
pub fn assign_structure_flag(
    mol: &mut Mol<Atom, Bond>,
    rings: &RingInfo,
    options: &ClassifyOptions,
    findings: &mut Findings,
) -> (StructureFlag, StereoCounts) {
    let n_atoms = mol.atoms().filter(|&a| mol.atom(a).atomic_num != 0).count();
    clear_charged_sulfur(mol);
    clear_demoted_descriptors(mol, findings);

    let mut counts = count_stereo(mol, rings, options.max_ring_size_without_bond_stereo);
    apply_expected_non_tetrahedral(
        &mut counts,
        mol,
        rings,
        options.expected_non_tetrahedral,
        findings,
    );

    let flag = decide(&counts, n_atoms);
    debug!(%flag, ?counts, "Structure flag computed.");
    if let Some(asserted) = options.asserted {
        if let Some(kind) = mismatch(&counts, n_atoms, asserted) {
            findings.push(StereoError::ClassificationMismatch { kind });
        }
    }
    strip_descriptors(mol, flag);
    (flag, counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn counts(tc: usize, sc: usize, tn: usize, sn: usize, td: usize, sd: usize) -> StereoCounts {
        StereoCounts {
            chiral_total: tc,
            chiral_specified: sc,
            non_chiral_total: tn,
            non_chiral_specified: sn,
            double_bond_total: td,
            double_bond_specified: sd,
            ..StereoCounts::default()
        }
    }

    #[test]
    fn flag_names_round_trip_through_display() {
        for flag in StructureFlag::ALL {
            assert_eq!(flag.to_string().parse::<StructureFlag>(), Ok(flag));
        }
        assert_eq!("SI".parse(), Ok(StructureFlag::SingleStereoisomer));
        assert_eq!(
            "Mixture of Stereoisomers".parse(),
            Ok(StructureFlag::MixtureOfDiastereomers)
        );
        assert!("Racemate".parse::<StructureFlag>().is_err());
    }

    #[test]
    fn decision_table() {
        use StructureFlag::*;
        assert_eq!(decide(&counts(0, 0, 0, 0, 0, 0), 5), NoStereo);
        assert_eq!(decide(&counts(0, 0, 0, 0, 0, 0), 0), UncertainStructure);
        assert_eq!(decide(&counts(0, 0, 2, 2, 0, 0), 8), SingleStereoisomer);
        assert_eq!(decide(&counts(0, 0, 0, 0, 1, 1), 4), SingleStereoisomer);
        assert_eq!(decide(&counts(1, 1, 0, 0, 0, 0), 6), SingleStereoisomer);
        assert_eq!(decide(&counts(1, 0, 0, 0, 0, 0), 6), MixtureOfEnantiomers);
        assert_eq!(decide(&counts(2, 2, 0, 0, 0, 0), 6), SingleStereoisomer);
        assert_eq!(decide(&counts(2, 1, 0, 0, 0, 0), 6), MixtureOfDiastereomers);
        assert_eq!(decide(&counts(0, 0, 2, 0, 0, 0), 8), MixtureOfDiastereomers);
        assert_eq!(decide(&counts(3, 3, 0, 0, 1, 0), 8), MixtureOfDiastereomers);
    }

    #[test]
    fn non_tetrahedral_folds_into_chiral() {
        let c = StereoCounts {
            non_tetrahedral_total: 1,
            non_tetrahedral_specified: 1,
            ..StereoCounts::default()
        };
        assert_eq!(decide(&c, 10), StructureFlag::SingleStereoisomer);
        let c = StereoCounts {
            non_tetrahedral_total: 2,
            non_tetrahedral_specified: 1,
            ..StereoCounts::default()
        };
        assert_eq!(decide(&c, 10), StructureFlag::MixtureOfDiastereomers);
    }

    #[test]
    fn mismatch_kinds() {
        use MismatchKind::*;
        use StructureFlag::*;
        let none = counts(0, 0, 0, 0, 0, 0);
        assert_eq!(mismatch(&none, 4, SingleStereoisomer), Some(NoCentersButFlagged));
        assert_eq!(mismatch(&none, 4, NoStereo), None);
        assert_eq!(mismatch(&none, 0, NoStereo), Some(NoCentersButFlagged));
        assert_eq!(mismatch(&none, 0, UncertainStructure), None);

        let one = counts(1, 1, 0, 0, 0, 0);
        assert_eq!(mismatch(&one, 6, NoStereo), Some(CentersDeclaredNoStereo));
        assert_eq!(mismatch(&one, 6, SingleStereoisomer), None);
        assert_eq!(mismatch(&one, 6, SingleUnknownStereoisomer), None);
        assert_eq!(
            mismatch(&one, 6, MixtureOfDiastereomers),
            Some(DiastereomersShouldBeEnantiomers)
        );

        let open = counts(1, 0, 0, 0, 0, 0);
        assert_eq!(mismatch(&open, 6, SingleStereoisomer), Some(SingleNotFullySpecified));
        assert_eq!(mismatch(&open, 6, MixtureOfEnantiomers), None);

        let ring = counts(0, 0, 2, 2, 0, 0);
        assert_eq!(
            mismatch(&ring, 8, MixtureOfEnantiomers),
            Some(EnantiomersWithoutChiralCenter)
        );
        assert_eq!(
            mismatch(&ring, 8, MixtureOfDiastereomers),
            Some(DiastereomersSingleRelativeCenter)
        );

        let mixed = counts(2, 2, 2, 0, 0, 0);
        assert_eq!(
            mismatch(&mixed, 10, MixtureOfEnantiomers),
            Some(EnantiomersWithUnspecifiedRelative)
        );
        assert_eq!(mismatch(&mixed, 10, MixtureOfDiastereomers), None);
    }

    #[test]
    fn counting_skips_cleared_atoms_and_small_ring_bonds() {
        let mut mol = from_smiles("C[C@H](N)C1CC=CCC1/C=C/C").unwrap();
        let rings = RingInfo::perceive(&mol);
        mol.atom_mut(NodeIndex::new(1)).flags.insert(AtomFlags::CHIRAL);
        for e in mol.bonds().collect::<Vec<_>>() {
            if mol.bond(e).order == crate::bond::BondOrder::Double {
                mol.bond_mut(e).flags.insert(BondFlags::CHIRAL);
            }
        }
        let c = count_stereo(&mol, &rings, 7);
        assert_eq!((c.chiral_total, c.chiral_specified), (1, 1));
        assert_eq!((c.double_bond_total, c.double_bond_specified), (1, 1));

        mol.atom_mut(NodeIndex::new(1))
            .flags
            .insert(AtomFlags::STEREO_CLEARED);
        let c = count_stereo(&mol, &rings, 7);
        assert_eq!(c.chiral_total, 0);
    }

    #[test]
    fn demoted_descriptor_is_reported() {
        let mut mol = from_smiles("C[C@H](N)C(=O)O").unwrap();
        mol.atom_mut(NodeIndex::new(1))
            .flags
            .insert(AtomFlags::STEREO_CLEARED);
        let mut findings = Findings::default();
        clear_demoted_descriptors(&mut mol, &mut findings);
        assert_eq!(
            findings.errors(),
            [StereoError::InvalidWedge {
                atom: 1,
                problem: WedgeProblem::NoStereo
            }]
        );
        assert!(mol.tetrahedral_stereo().is_empty());
    }

    #[test]
    fn expected_axes_beyond_possible_are_infeasible() {
        let mol = from_smiles("CCO").unwrap();
        let rings = RingInfo::perceive(&mol);
        let mut c = StereoCounts::default();
        let mut findings = Findings::default();
        apply_expected_non_tetrahedral(&mut c, &mol, &rings, Some(1), &mut findings);
        assert_eq!(
            findings.errors(),
            [StereoError::TemplateInfeasible {
                expected: 1,
                possible: 0
            }]
        );
        assert_eq!(c.non_tetrahedral_total, 0);
    }

    #[test]
    fn expected_axis_counts_as_unspecified() {
        let mol = from_smiles("Cc1cccc(C)c1-c1c(C)cccc1O").unwrap();
        let rings = RingInfo::perceive(&mol);
        let mut c = StereoCounts::default();
        let mut findings = Findings::default();
        apply_expected_non_tetrahedral(&mut c, &mol, &rings, Some(1), &mut findings);
        assert!(findings.errors().is_empty());
        assert_eq!((c.non_tetrahedral_total, c.non_tetrahedral_specified), (1, 0));
        assert_eq!(decide(&c, 16), StructureFlag::MixtureOfEnantiomers);
    }

    #[test]
    fn stripping_follows_the_flag() {
        let template = || {
            let mut mol = from_smiles("C[C@H](N)C[C@H]1CC[C@@H](C)CC1").unwrap();
            mol.atom_mut(NodeIndex::new(1)).flags.insert(AtomFlags::CHIRAL);
            for i in [4, 7] {
                mol.atom_mut(NodeIndex::new(i))
                    .flags
                    .insert(AtomFlags::NON_CHIRAL_STEREO);
            }
            mol
        };
        let mut mol = template();
        strip_descriptors(&mut mol, StructureFlag::SingleStereoisomer);
        assert_eq!(mol.tetrahedral_stereo().len(), 3);

        let mut mol = template();
        strip_descriptors(&mut mol, StructureFlag::MixtureOfEnantiomers);
        let left: Vec<_> = mol.tetrahedral_stereo().iter().map(|s| s.center.index()).collect();
        assert_eq!(left, vec![1]);

        let mut mol = template();
        strip_descriptors(&mut mol, StructureFlag::MixtureOfDiastereomers);
        assert!(mol.tetrahedral_stereo().is_empty());
    }
}
