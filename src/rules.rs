//! The closed set of pipeline rules and what each one is allowed to do.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What a rule does to the molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Writes annotations, never reports.
    Transform,
    /// Reports problems and removes the offending descriptors.
    Validate,
    /// Produces the structure flag.
    Classify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    FlagStereocenters,
    CheckWedges,
    CheckWavyBonds,
    CheckDoubleBonds,
    AssignStructureFlag,
}

impl Rule {
    pub fn capability(self) -> Capability {
        match self {
            Rule::FlagStereocenters => Capability::Transform,
            Rule::CheckWedges | Rule::CheckWavyBonds | Rule::CheckDoubleBonds => {
                Capability::Validate
            }
            Rule::AssignStructureFlag => Capability::Classify,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rule::FlagStereocenters => "flag-stereocenters",
            Rule::CheckWedges => "check-wedges",
            Rule::CheckWavyBonds => "check-wavy-bonds",
            Rule::CheckDoubleBonds => "check-double-bonds",
            Rule::AssignStructureFlag => "assign-structure-flag",
        }
    }
}

/// Rejects orders the pipeline cannot run: duplicates, a classify rule
/// that is missing or not last, or a validate rule that runs before the
/// stereocentres are flagged.
pub fn validate_rule_order(rules: &[Rule]) -> Result<(), ConfigError> {
    for (i, rule) in rules.iter().enumerate() {
        if rules[..i].contains(rule) {
            return Err(ConfigError::RuleOrder(format!(
                "'{}' is listed twice",
                rule.name()
            )));
        }
    }

    let classify: Vec<usize> = rules
        .iter()
        .enumerate()
        .filter(|(_, r)| r.capability() == Capability::Classify)
        .map(|(i, _)| i)
        .collect();
    match classify.as_slice() {
        [i] if *i + 1 == rules.len() => {}
        [] => {
            return Err(ConfigError::RuleOrder(
                "no classify rule configured".to_string(),
            ))
        }
        _ => {
            return Err(ConfigError::RuleOrder(
                "the classify rule must be last".to_string(),
            ))
        }
    }

    let flag_at = rules.iter().position(|r| *r == Rule::FlagStereocenters);
    let first_validate = rules
        .iter()
        .position(|r| r.capability() == Capability::Validate);
    if let Some(v) = first_validate {
        if flag_at.map_or(true, |f| f > v) {
            return Err(ConfigError::RuleOrder(format!(
                "'{}' must run after '{}'",
                rules[v].name(),
                Rule::FlagStereocenters.name()
            )));
        }
    }
    Ok(())
}
