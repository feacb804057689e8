use petgraph::graph::{EdgeIndex, NodeIndex};
use tracing::{debug, info, instrument};

use crate::atom::{Atom, AtomFlags};
use crate::bond::{Bond, BondFlags};
use crate::candidates::{scan, specified_stereo_bond_count, EligibilityRule};
use crate::classify::{
    assign_structure_flag, ClassificationResult, ClassifyOptions, StereoCounts, StructureFlag,
};
use crate::config::StereoConfig;
use crate::error::ConfigError;
use crate::inversion::{assign_reference_stereo, retain_relevant_stereo, test_candidates};
use crate::mol::Mol;
use crate::perception::{apply_nitrogen_rule, perceive_baseline};
use crate::propagate::propagate;
use crate::rings::RingInfo;
use crate::rules::Rule;
use crate::substruct::{SelfMatcher, Vf2SelfMatcher};
use crate::symmetry::symmetry_classes;
use crate::template::{apply_templates, StrainedCycleTemplate};
use crate::validate::{
    check_double_bonds, check_non_chiral_descriptors, check_unsupported_chirality, check_wavy_bonds,
    check_wedges, Findings,
};

/// Runs the configured rules over one molecule at a time.
///
/// Templates and eligibility rules are parsed once in [`new`](Self::new);
/// everything a classification writes lives on the molecule passed in, so
/// one classifier can be shared between threads.
///
/// # Examples
///
/// ```
/// use stereoflag::{from_smiles, StereoClassifier, StereoConfig, StructureFlag};
///
/// let classifier = StereoClassifier::new(StereoConfig::default()).unwrap();
/// let mut mol = from_smiles("C[C@H](N)C(=O)O").unwrap();
/// let result = classifier.classify(&mut mol, Some(StructureFlag::SingleStereoisomer));
/// assert_eq!(result.flag, StructureFlag::SingleStereoisomer);
/// assert!(result.success);
/// ```
#[derive(Debug)]
pub struct StereoClassifier<M: SelfMatcher = Vf2SelfMatcher> {
    config: StereoConfig,
    templates: Vec<StrainedCycleTemplate>,
    eligibility: Vec<EligibilityRule>,
    chiral_elements: Vec<u8>,
    matcher: M,
}

impl StereoClassifier {
    pub fn new(config: StereoConfig) -> Result<Self, ConfigError> {
        Self::with_matcher(config, Vf2SelfMatcher)
    }
}

impl<M: SelfMatcher> StereoClassifier<M> {
    /// Builds a classifier that answers self-match queries with `matcher`.
    pub fn with_matcher(config: StereoConfig, matcher: M) -> Result<Self, ConfigError> {
        config.validate()?;
        let templates = config
            .strained_cycles
            .iter()
            .map(|s| StrainedCycleTemplate::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        let eligibility = config
            .candidate_rules
            .iter()
            .map(EligibilityRule::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        let chiral_elements = config.chiral_atomic_nums()?;
        info!(
            rules = config.rules.len(),
            templates = templates.len(),
            "Stereo classifier ready."
        );
        Ok(Self {
            config,
            templates,
            eligibility,
            chiral_elements,
            matcher,
        })
    }

    pub fn config(&self) -> &StereoConfig {
        &self.config
    }

    /// Classifies `mol` in place, using the configured expected number of
    /// non-tetrahedral centres.
    pub fn classify(
        &self,
        mol: &mut Mol<Atom, Bond>,
        asserted: Option<StructureFlag>,
    ) -> ClassificationResult {
        self.classify_with_expected(mol, asserted, self.config.expected_non_tetrahedral)
    }

    /// Annotates `mol`, validates its stereo, strips the descriptors the
    /// computed flag does not vouch for and returns the flag. With
    /// `asserted` set, a contradicting assertion is reported as an error.
    #[instrument(skip_all, fields(atoms = mol.atom_count()))]
    pub fn classify_with_expected(
        &self,
        mol: &mut Mol<Atom, Bond>,
        asserted: Option<StructureFlag>,
        expected_non_tetrahedral: Option<usize>,
    ) -> ClassificationResult {
        reset_annotations(mol);
        let rings = RingInfo::perceive(mol);
        let classes = symmetry_classes(mol);
        let mut findings = Findings::default();
        let mut early_exit = false;
        let mut outcome = None;

        for &rule in &self.config.rules {
            debug!(rule = rule.name(), "Running rule.");
            match rule {
                Rule::FlagStereocenters => {
                    early_exit = self.flag_stereocenters(mol, &rings, &classes);
                }
                Rule::CheckWedges => {
                    check_wedges(mol, &rings, self.config.metal_max_degree, &mut findings);
                    check_unsupported_chirality(mol, &self.chiral_elements, &mut findings);
                    check_non_chiral_descriptors(mol, &mut findings);
                }
                Rule::CheckWavyBonds => check_wavy_bonds(mol, &mut findings),
                Rule::CheckDoubleBonds => check_double_bonds(mol, &mut findings),
                Rule::AssignStructureFlag => {
                    let options = ClassifyOptions {
                        max_ring_size_without_bond_stereo: self
                            .config
                            .max_ring_size_without_bond_stereo,
                        expected_non_tetrahedral,
                        asserted,
                    };
                    outcome = Some(assign_structure_flag(mol, &rings, &options, &mut findings));
                }
            }
        }

        // the rule order check guarantees a classify rule
        let (flag, counts) =
            outcome.unwrap_or((StructureFlag::UncertainStructure, StereoCounts::default()));
        let errors = findings.into_errors();
        ClassificationResult {
            flag,
            counts,
            has_error: !errors.is_empty(),
            success: errors.is_empty(),
            errors,
            early_exit,
        }
    }

    /// Marks chiral atoms, candidates and non-chiral stereocentres.
    /// Returns `true` when the candidate analysis was skipped.
    fn flag_stereocenters(
        &self,
        mol: &mut Mol<Atom, Bond>,
        rings: &RingInfo,
        classes: &[usize],
    ) -> bool {
        perceive_baseline(mol, classes);
        apply_nitrogen_rule(mol, rings);

        let mut reference = mol.clone();
        apply_templates(&self.templates, mol, &mut reference, rings);
        let found = scan(mol, rings, classes, &self.eligibility);
        if found.allows_early_exit(specified_stereo_bond_count(mol)) {
            debug!("No candidate can be stereogenic; skipping inversion tests.");
            return true;
        }

        retain_relevant_stereo(mol, &mut reference);
        assign_reference_stereo(mol, &mut reference, &self.chiral_elements);
        test_candidates(mol, &reference, &self.matcher, classes, &found.candidates);
        propagate(
            mol,
            &mut reference,
            rings,
            classes,
            &self.matcher,
            &found.candidates,
        );
        false
    }
}

fn reset_annotations(mol: &mut Mol<Atom, Bond>) {
    let atoms: Vec<NodeIndex> = mol.atoms().collect();
    for atom in atoms {
        mol.atom_mut(atom).flags = AtomFlags::empty();
    }
    let bonds: Vec<EdgeIndex> = mol.bonds().collect();
    for bond in bonds {
        mol.bond_mut(bond).flags = BondFlags::empty();
    }
}
