use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::element;
use crate::error::ConfigError;
use crate::rules::{validate_rule_order, Rule};

/// The configuration shipped with the crate.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Element eligibility for the stereocentre candidate scan. Every
/// constraint that is set must hold.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CandidateRule {
    pub element: String,
    pub min_heavy_degree: Option<usize>,
    pub heavy_degree: Option<usize>,
    pub total_degree: Option<usize>,
    pub formal_charge: Option<i8>,
    pub total_hydrogens: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StereoConfig {
    pub rules: Vec<Rule>,
    pub chiral_elements: Vec<String>,
    pub metal_max_degree: usize,
    pub max_ring_size_without_bond_stereo: usize,
    /// Template SMILES with stereo on every bridgehead.
    pub strained_cycles: Vec<String>,
    pub candidate_rules: Vec<CandidateRule>,
    #[serde(default)]
    pub expected_non_tetrahedral: Option<usize>,
}

impl StereoConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        config.validate()?;
        info!(
            path = %path.display(),
            rules = config.rules.len(),
            templates = config.strained_cycles.len(),
            "Loaded stereo configuration."
        );
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: "<string>".to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the rule order and that every element symbol is known.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_rule_order(&self.rules)?;
        let symbols = self
            .chiral_elements
            .iter()
            .chain(self.candidate_rules.iter().map(|r| &r.element));
        for symbol in symbols {
            if element::atomic_num_from_symbol(symbol).is_none() {
                return Err(ConfigError::UnknownElement(symbol.clone()));
            }
        }
        Ok(())
    }

    /// Atomic numbers of [`chiral_elements`](Self::chiral_elements).
    pub fn chiral_atomic_nums(&self) -> Result<Vec<u8>, ConfigError> {
        self.chiral_elements
            .iter()
            .map(|s| {
                element::atomic_num_from_symbol(s)
                    .ok_or_else(|| ConfigError::UnknownElement(s.clone()))
            })
            .collect()
    }
}

/// Mirrors [`DEFAULT_CONFIG_TOML`].
impl Default for StereoConfig {
    fn default() -> Self {
        let rule = |element: &str| CandidateRule {
            element: element.to_string(),
            min_heavy_degree: None,
            heavy_degree: None,
            total_degree: None,
            formal_charge: None,
            total_hydrogens: None,
        };
        Self {
            rules: vec![
                Rule::FlagStereocenters,
                Rule::CheckWedges,
                Rule::CheckWavyBonds,
                Rule::CheckDoubleBonds,
                Rule::AssignStructureFlag,
            ],
            chiral_elements: ["C", "N", "P", "S"].map(String::from).to_vec(),
            metal_max_degree: 4,
            max_ring_size_without_bond_stereo: 7,
            strained_cycles: [
                "C1C[C@H]2CC[C@@H]1C2",
                "C1C[C@H]2CC[C@@H]1CC2",
                "C1[C@H]2C[C@@H]1C2",
                "C1[C@@H]2C[C@@H]3C[C@H]1C[C@H](C2)C3",
            ]
            .map(String::from)
            .to_vec(),
            candidate_rules: vec![
                CandidateRule {
                    min_heavy_degree: Some(3),
                    total_degree: Some(4),
                    ..rule("C")
                },
                CandidateRule {
                    min_heavy_degree: Some(3),
                    formal_charge: Some(0),
                    ..rule("S")
                },
                CandidateRule {
                    heavy_degree: Some(4),
                    formal_charge: Some(1),
                    total_hydrogens: Some(0),
                    ..rule("N")
                },
            ],
            expected_non_tetrahedral: None,
        }
    }
}
