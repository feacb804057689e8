use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::smiles::SmilesError;

/// Why a wedge or tetrahedral descriptor was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WedgeProblem {
    /// The atom is neither chiral, a non-chiral stereocentre nor atropisomeric.
    NotChiral,
    /// The atom was demoted earlier and may not carry stereo.
    NoStereo,
    /// A wavy bond touches a stereocentre.
    WavyOnStereocenter,
}

impl fmt::Display for WedgeProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WedgeProblem::NotChiral => "is not chiral but has wedge bonds",
            WedgeProblem::NoStereo => "has no stereo and may not have wedge bonds",
            WedgeProblem::WavyOnStereocenter => "is a stereocenter and may not have wavy bonds",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedReason {
    Element,
    Aromatic,
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnsupportedReason::Element => "element cannot carry tetrahedral stereo",
            UnsupportedReason::Aromatic => "atom is aromatic",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BondStereoProblem {
    /// Cis/trans declared on a double bond that cannot have it.
    Symmetric,
    /// The declared configuration disagrees with the coordinates.
    Geometry,
    /// A substituent is collinear with the double bond.
    Linear,
}

impl fmt::Display for BondStereoProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BondStereoProblem::Symmetric => "double bond is not stereogenic",
            BondStereoProblem::Geometry => "declared cis/trans disagrees with the coordinates",
            BondStereoProblem::Linear => "substituent is linear to the double bond",
        })
    }
}

/// The seven ways an asserted structure flag can contradict the counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    NoCentersButFlagged,
    CentersDeclaredNoStereo,
    SingleNotFullySpecified,
    EnantiomersWithoutChiralCenter,
    EnantiomersWithUnspecifiedRelative,
    DiastereomersSingleRelativeCenter,
    DiastereomersShouldBeEnantiomers,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MismatchKind::NoCentersButFlagged => {
                "molecule has no stereo centers and must be flagged as such"
            }
            MismatchKind::CentersDeclaredNoStereo => {
                "molecule has stereo centers and can not be 'No Stereo'"
            }
            MismatchKind::SingleNotFullySpecified => {
                "a single stereoisomer must have every stereo center specified"
            }
            MismatchKind::EnantiomersWithoutChiralCenter => {
                "molecule has no chiral centers and can not be a mixture of enantiomers"
            }
            MismatchKind::EnantiomersWithUnspecifiedRelative => {
                "ring atoms and double bonds of a mixture of enantiomers must be specified"
            }
            MismatchKind::DiastereomersSingleRelativeCenter => {
                "a single relative stereo element has to be drawn without stereo"
            }
            MismatchKind::DiastereomersShouldBeEnantiomers => {
                "one chiral atom with everything else specified is a mixture of enantiomers"
            }
        })
    }
}

/// Per-molecule problems. None of these abort a classification; they are
/// collected into [`ClassificationResult::errors`](crate::ClassificationResult).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StereoError {
    #[error("atom {atom} {problem}")]
    InvalidWedge { atom: usize, problem: WedgeProblem },

    #[error("chirality on atom {atom} not supported: {reason}")]
    UnsupportedChirality {
        atom: usize,
        reason: UnsupportedReason,
    },

    #[error("bond {begin}={end}: {problem}")]
    InconsistentBondStereo {
        begin: usize,
        end: usize,
        problem: BondStereoProblem,
    },

    #[error("structure flag mismatch: {kind}")]
    ClassificationMismatch { kind: MismatchKind },

    #[error("expected {expected} non-tetrahedral centers but only {possible} are possible")]
    TemplateInfeasible { expected: usize, possible: usize },
}

/// A structure-flag name that matches none of the known spellings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown structure flag '{0}'")]
pub struct UnknownStructureFlag(pub String);

/// Errors raised while loading configuration or building a classifier.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid strained-cycle template '{smiles}': {source}")]
    Template {
        smiles: String,
        #[source]
        source: SmilesError,
    },

    #[error("unknown element symbol '{0}'")]
    UnknownElement(String),

    #[error("invalid rule order: {0}")]
    RuleOrder(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_atom() {
        let err = StereoError::InvalidWedge {
            atom: 3,
            problem: WedgeProblem::NotChiral,
        };
        assert_eq!(err.to_string(), "atom 3 is not chiral but has wedge bonds");
    }

    #[test]
    fn serializes_with_type_tag() {
        let err = StereoError::ClassificationMismatch {
            kind: MismatchKind::SingleNotFullySpecified,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "classification_mismatch");
        assert_eq!(json["kind"], "single_not_fully_specified");
    }

    #[test]
    fn template_error_keeps_source() {
        use std::error::Error as _;
        let err = ConfigError::Template {
            smiles: "C1CC".into(),
            source: SmilesError::UnclosedRing { digit: 1 },
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("C1CC"));
    }
}
