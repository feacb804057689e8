use petgraph::graph::NodeIndex;

use stereoflag::{
    from_smiles, Atom, AtomFlags, Bond, BondFlags, ClassificationResult, MismatchKind, Mol,
    StereoClassifier, StereoConfig, StereoError, StructureFlag, Wedge, WedgeKind,
};
use stereoflag::error::WedgeProblem;

fn classifier() -> StereoClassifier {
    StereoClassifier::new(StereoConfig::default()).unwrap()
}

fn classify(
    smiles: &str,
    asserted: Option<StructureFlag>,
) -> (Mol<Atom, Bond>, ClassificationResult) {
    let mut mol = from_smiles(smiles).unwrap();
    let result = classifier().classify(&mut mol, asserted);
    (mol, result)
}

fn flags(mol: &Mol<Atom, Bond>, i: usize) -> AtomFlags {
    mol.atom(NodeIndex::new(i)).flags
}

fn non_chiral_atoms(mol: &Mol<Atom, Bond>) -> Vec<usize> {
    mol.atoms()
        .filter(|&a| mol.atom(a).flags.contains(AtomFlags::NON_CHIRAL_STEREO))
        .map(|a| a.index())
        .collect()
}

// ---------------------------------------------------------------------------
// Acyclic chiral centre
// ---------------------------------------------------------------------------

#[test]
fn specified_alanine_is_a_single_stereoisomer() {
    let (_, result) = classify("C[C@H](N)C(=O)O", Some(StructureFlag::SingleStereoisomer));
    assert_eq!(result.flag, StructureFlag::SingleStereoisomer);
    assert_eq!(result.counts.chiral_total, 1);
    assert_eq!(result.counts.chiral_specified, 1);
    assert!(result.success);
    assert!(!result.has_error);
}

// ---------------------------------------------------------------------------
// Ring cis/trans
// ---------------------------------------------------------------------------

#[test]
fn dimethylcyclohexane_with_relative_stereo() {
    let (mol, result) = classify("C[C@H]1CC[C@@H](C)CC1", None);
    for i in [1, 4] {
        assert!(flags(&mol, i).contains(AtomFlags::NON_CHIRAL_STEREO));
        assert!(!flags(&mol, i).is_chiral());
    }
    assert_eq!(result.flag, StructureFlag::SingleStereoisomer);
    assert_eq!(result.counts.non_chiral_total, 2);
    assert_eq!(result.counts.non_chiral_specified, 2);
    assert_eq!(result.counts.chiral_total, 0);
    assert_eq!(mol.tetrahedral_stereo().len(), 2);
}

#[test]
fn dimethylcyclohexane_without_stereo() {
    let (mol, result) = classify("CC1CCC(C)CC1", None);
    assert!(flags(&mol, 1).contains(AtomFlags::NON_CHIRAL_STEREO));
    assert!(flags(&mol, 4).contains(AtomFlags::NON_CHIRAL_STEREO));
    assert_eq!(result.flag, StructureFlag::MixtureOfDiastereomers);
    assert_eq!(result.counts.non_chiral_specified, 0);
    assert!(result.success);
}

#[test]
fn meso_pseudoasymmetric_centre_is_non_chiral() {
    let (mol, _) = classify("C[C@H](F)C(C)[C@H](F)C", None);
    assert_eq!(non_chiral_atoms(&mol), [3]);
}

// ---------------------------------------------------------------------------
// Centres coupled through the ring
// ---------------------------------------------------------------------------

#[test]
fn trifluorocyclohexane_centres_are_coupled() {
    let (mol, result) = classify("FC1CC(F)CC(F)C1", None);
    assert_eq!(non_chiral_atoms(&mol), [1, 3, 6]);
    assert_eq!(result.flag, StructureFlag::MixtureOfDiastereomers);
    assert_eq!(result.counts.non_chiral_total, 3);
    assert_eq!(result.counts.non_chiral_specified, 0);
}

#[test]
fn drawn_trifluorocyclohexane_isomers_are_single() {
    for smiles in [
        "F[C@H]1C[C@H](F)C[C@H](F)C1",
        "F[C@H]1C[C@@H](F)C[C@H](F)C1",
    ] {
        let (mol, result) = classify(smiles, None);
        assert_eq!(non_chiral_atoms(&mol), [1, 3, 6], "{smiles}");
        assert_eq!(result.flag, StructureFlag::SingleStereoisomer, "{smiles}");
        assert!(result.errors.is_empty(), "{smiles}");
    }
}

#[test]
fn gem_dimethyl_atoms_beside_a_spiro_centre_are_demoted() {
    let (mol, result) = classify("CC1([C@]2(C(CC=C2)(C)C)C=CC1)C", None);
    for i in [1, 3] {
        let f = flags(&mol, i);
        assert!(f.contains(AtomFlags::STEREO_CLEARED), "atom {i}");
        assert!(!f.contains(AtomFlags::NON_CHIRAL_STEREO), "atom {i}");
    }
    assert!(flags(&mol, 2).contains(AtomFlags::NON_CHIRAL_STEREO));
    assert_eq!(result.flag, StructureFlag::SingleStereoisomer);
    assert!(result.errors.is_empty());
}

// ---------------------------------------------------------------------------
// Spiro centre with equivalent arms
// ---------------------------------------------------------------------------

#[test]
fn symmetric_spiro_centre_is_not_stereogenic() {
    let (mol, result) = classify("C1CC2(C1)CCCC2", None);
    let spiro = flags(&mol, 2);
    assert!(spiro.contains(AtomFlags::CANDIDATE));
    assert!(!spiro.contains(AtomFlags::NON_CHIRAL_STEREO));
    assert!(!result.early_exit);
    assert_eq!(result.flag, StructureFlag::NoStereo);
    assert!(result.errors.is_empty());
}

// ---------------------------------------------------------------------------
// Caged bridgeheads
// ---------------------------------------------------------------------------

#[test]
fn adamantane_bridgeheads_carry_no_stereo() {
    let (mol, result) = classify("CC12CC(CC(C2)(O)C3)CC3C1", Some(StructureFlag::NoStereo));
    for head in [3, 10] {
        let f = flags(&mol, head);
        assert!(f.contains(AtomFlags::STRAINED_BRIDGEHEAD));
        assert!(f.contains(AtomFlags::STEREO_CLEARED));
    }
    assert_eq!(result.flag, StructureFlag::NoStereo);
    assert_eq!(result.counts.chiral_total, 0);
    assert!(result.success);
}

#[test]
fn drawn_adamantane_bridgehead_stereo_is_reported() {
    let (mol, result) = classify("CC12C[C@H](CC(C2)(O)C3)C[C@@H]3C1", None);
    assert_eq!(result.flag, StructureFlag::NoStereo);
    assert!(result.has_error);
    assert!(!result.success);
    assert_eq!(
        result.errors,
        [
            StereoError::InvalidWedge {
                atom: 3,
                problem: WedgeProblem::NoStereo
            },
            StereoError::InvalidWedge {
                atom: 10,
                problem: WedgeProblem::NoStereo
            },
        ]
    );
    assert!(mol.tetrahedral_stereo().is_empty());
}

#[test]
fn exo_centre_on_unsubstituted_cage_is_reported() {
    let (mol, result) = classify("O[13C@H]1C(C2)CC3CC1CC2C3", None);
    assert_eq!(result.flag, StructureFlag::NoStereo);
    assert!(matches!(
        result.errors[..],
        [StereoError::InvalidWedge { atom: 1, .. }]
    ));
    assert!(!mol.atom(NodeIndex::new(1)).flags.contains(AtomFlags::NON_CHIRAL_STEREO));
    assert!(mol.tetrahedral_stereo().is_empty());
}

#[test]
fn exo_centre_on_substituted_cage_is_kept() {
    let (_, result) = classify("O[13C@H]1[C@@H](C2)C[C@@H]3C[C@H]1C[C@@]2(C)C3", None);
    assert_eq!(result.flag, StructureFlag::SingleStereoisomer);
    assert_eq!(result.counts.chiral_total, 2);
    assert_eq!(result.counts.non_chiral_total, 3);
}

#[test]
fn norbornane_bridgeheads_are_flagged() {
    let (mol, _) = classify("C1CC2CCC1C2", None);
    assert!(flags(&mol, 2).contains(AtomFlags::STRAINED_BRIDGEHEAD));
    assert!(flags(&mol, 5).contains(AtomFlags::STRAINED_BRIDGEHEAD));
}

// ---------------------------------------------------------------------------
// Atropisomer
// ---------------------------------------------------------------------------

#[test]
fn biaryl_wedge_marks_an_atropisomeric_axis() {
    let mut mol = from_smiles("Cc1cccc(C)c1-c1c(C)cccc1O").unwrap();
    let ring_bond = mol
        .bond_between(NodeIndex::new(7), NodeIndex::new(1))
        .unwrap();
    mol.bond_mut(ring_bond).wedge = Some(Wedge {
        begin: NodeIndex::new(7),
        kind: WedgeKind::Up,
    });
    let result = classifier().classify(&mut mol, Some(StructureFlag::SingleStereoisomer));

    let axis = mol
        .bond_between(NodeIndex::new(7), NodeIndex::new(8))
        .unwrap();
    assert!(mol.bond(axis).flags.contains(BondFlags::ATROPISOMERIC));
    assert!(flags(&mol, 7).contains(AtomFlags::ATROPISOMERIC));
    assert!(flags(&mol, 8).contains(AtomFlags::ATROPISOMERIC));
    assert_eq!(result.counts.non_tetrahedral_total, 1);
    assert_eq!(result.counts.non_tetrahedral_specified, 1);
    assert_eq!(result.flag, StructureFlag::SingleStereoisomer);
    assert!(result.errors.is_empty());
}

#[test]
fn wedge_on_plain_sp3_atom_is_invalid() {
    let mut mol = from_smiles("CC(C)(C)O").unwrap();
    let bond = mol
        .bond_between(NodeIndex::new(1), NodeIndex::new(4))
        .unwrap();
    mol.bond_mut(bond).wedge = Some(Wedge {
        begin: NodeIndex::new(1),
        kind: WedgeKind::Down,
    });
    let result = classifier().classify(&mut mol, None);
    assert!(result.has_error);
    assert!(matches!(
        result.errors[..],
        [StereoError::InvalidWedge { atom: 1, .. }]
    ));
}

// ---------------------------------------------------------------------------
// Asserted flag contradicting the counts
// ---------------------------------------------------------------------------

#[test]
fn asserted_single_stereoisomer_with_unspecified_ring_centres() {
    let (_, result) = classify("CC1CCC(C)CC1", Some(StructureFlag::SingleStereoisomer));
    assert_eq!(result.flag, StructureFlag::MixtureOfDiastereomers);
    assert!(result.has_error);
    assert!(!result.success);
    assert_eq!(
        result.errors,
        [StereoError::ClassificationMismatch {
            kind: MismatchKind::SingleNotFullySpecified
        }]
    );
}

#[test]
fn single_unknown_stereoisomer_is_never_a_mismatch() {
    for smiles in ["CC1CCC(C)CC1", "CC(N)C(=O)O", "C[C@H](N)C(=O)O"] {
        let (_, result) =
            classify(smiles, Some(StructureFlag::SingleUnknownStereoisomer));
        assert!(result.success, "{smiles}");
    }
}

#[test]
fn expected_axis_beyond_possible_is_reported() {
    let mut mol = from_smiles("CCO").unwrap();
    let result = classifier().classify_with_expected(&mut mol, None, Some(1));
    assert_eq!(
        result.errors,
        [StereoError::TemplateInfeasible {
            expected: 1,
            possible: 0
        }]
    );
}
