//! Factor configuration document.
//!
//! The document declares, per factor, either a single predicate (boolean
//! factor, domain `{false, true}`) or an explicit list of
//! `{value, predicate}` entries (enum factor). Top level carries the step
//! variable used for action extraction, an optional end-of-test flag, an
//! optional global test-applicability rule, and an optional idle-step
//! sentinel.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::factor::{Factor, FactorKind, FactorSet};
use crate::value::FactorValue;

/// Placeholder token a test rule may use to reference the end flag.
pub const END_FLAG_PLACEHOLDER: &str = "end_flag";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error reading configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required top-level field 'step_var'")]
    MissingStepVar,

    #[error("'{value}' is not a valid identifier for {field} (use [A-Za-z_][A-Za-z0-9_]*)")]
    BadIdentifier { field: String, value: String },

    #[error("duplicate factor name '{0}'")]
    DuplicateFactor(String),

    #[error("factor '{0}' must declare either 'ltl' or a non-empty 'values' list, not both")]
    MalformedFactor(String),

    #[error("factor '{factor}' declares value {value} more than once")]
    DuplicateValue { factor: String, value: String },

    #[error("factor '{factor}' has a non-integer enum value: {value}")]
    NonIntegerValue { factor: String, value: String },

    #[error("configuration declares no factors")]
    NoFactors,
}

/// Normalized configuration: the factor set plus the model-interface
/// fields every downstream component reads.
#[derive(Debug, Clone)]
pub struct FactorConfig {
    pub factors: FactorSet,
    /// Model variable reporting the action taken in each state.
    pub step_var: String,
    /// Model variable that is true once a scenario is complete, if any.
    pub end_flag: Option<String>,
    /// Global test-applicability rule conjoined into every formula.
    /// May reference the end flag through the `end_flag` placeholder.
    pub test_rule: String,
    /// Step value treated as "no action" and dropped from step lists.
    pub idle_step: String,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    factors: Vec<RawFactor>,
    step_var: Option<String>,
    end_flag: Option<String>,
    test_rule: Option<String>,
    idle_step: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFactor {
    name: String,
    /// Backing model variable; defaults to the factor name.
    var: Option<String>,
    /// Boolean factor: single predicate, negated for `false`.
    ltl: Option<String>,
    /// Enum factor: explicit value/predicate entries.
    values: Option<Vec<RawValueEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawValueEntry {
    value: serde_json::Value,
    ltl: String,
}

impl FactorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawDocument = serde_json::from_str(json)?;
        normalize(raw)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Test rule with the end-flag placeholder substituted, when a flag
    /// is configured.
    pub fn resolved_test_rule(&self) -> String {
        match &self.end_flag {
            Some(flag) => self.test_rule.replace(END_FLAG_PLACEHOLDER, flag),
            None => self.test_rule.clone(),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    if is_identifier(value) {
        Ok(())
    } else {
        Err(ConfigError::BadIdentifier {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

fn normalize(raw: RawDocument) -> Result<FactorConfig, ConfigError> {
    if raw.factors.is_empty() {
        return Err(ConfigError::NoFactors);
    }

    let step_var = raw.step_var.ok_or(ConfigError::MissingStepVar)?;
    check_identifier("step_var", &step_var)?;
    if let Some(flag) = &raw.end_flag {
        check_identifier("end_flag", flag)?;
    }

    let mut factors = Vec::new();
    let mut seen_names = std::collections::HashSet::new();

    for rf in raw.factors {
        check_identifier("factor name", &rf.name)?;
        if !seen_names.insert(rf.name.clone()) {
            return Err(ConfigError::DuplicateFactor(rf.name));
        }
        let backing_var = match rf.var {
            Some(v) => {
                check_identifier("factor var", &v)?;
                v
            }
            None => rf.name.clone(),
        };
        factors.push(normalize_factor(rf.name, backing_var, rf.ltl, rf.values)?);
    }

    Ok(FactorConfig {
        factors: FactorSet::new(factors),
        step_var,
        end_flag: raw.end_flag,
        test_rule: raw.test_rule.unwrap_or_else(|| "TRUE".to_string()),
        idle_step: raw.idle_step.unwrap_or_else(|| "none".to_string()),
    })
}

fn normalize_factor(
    name: String,
    backing_var: String,
    ltl: Option<String>,
    values: Option<Vec<RawValueEntry>>,
) -> Result<Factor, ConfigError> {
    match (ltl, values) {
        (Some(base), None) => {
            // Boolean factor: the declared predicate holds for `true`,
            // its negation for `false`.
            let mut predicates = BTreeMap::new();
            predicates.insert(FactorValue::Bool(true), base.clone());
            predicates.insert(FactorValue::Bool(false), format!("!({base})"));
            Ok(Factor {
                name,
                kind: FactorKind::Bool,
                domain: vec![FactorValue::Bool(false), FactorValue::Bool(true)],
                predicates,
                backing_var,
            })
        }
        (None, Some(entries)) if !entries.is_empty() => {
            let mut domain = Vec::new();
            let mut predicates = BTreeMap::new();
            for entry in entries {
                let value = match entry.value.as_i64() {
                    Some(i) if !entry.value.is_boolean() => FactorValue::Int(i),
                    _ => {
                        return Err(ConfigError::NonIntegerValue {
                            factor: name,
                            value: entry.value.to_string(),
                        })
                    }
                };
                if domain.contains(&value) {
                    return Err(ConfigError::DuplicateValue {
                        factor: name,
                        value: value.to_string(),
                    });
                }
                domain.push(value);
                predicates.insert(value, entry.ltl);
            }
            Ok(Factor {
                name,
                kind: FactorKind::Enum,
                domain,
                predicates,
                backing_var,
            })
        }
        _ => Err(ConfigError::MalformedFactor(name)),
    }
}
