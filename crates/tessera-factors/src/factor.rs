use std::collections::BTreeMap;

use crate::value::FactorValue;

/// The kind of a factor's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorKind {
    /// Domain is exactly `{false, true}`.
    Bool,
    /// Domain is an explicitly declared ordered set of integers.
    Enum,
}

/// One testing dimension: a named domain of values, each value tied to a
/// temporal predicate over the transition model.
#[derive(Debug, Clone)]
pub struct Factor {
    /// Unique identifier within a configuration.
    pub name: String,
    pub kind: FactorKind,
    /// Declared domain, in declaration order. First value is the default
    /// fill used by row-building strategies. Never empty.
    pub domain: Vec<FactorValue>,
    /// Per-value temporal predicate over the model.
    pub predicates: BTreeMap<FactorValue, String>,
    /// Model variable this factor is read back from in a witness state.
    pub backing_var: String,
}

impl Factor {
    /// The predicate declared for a value, if the value is in the domain.
    pub fn predicate_for(&self, value: &FactorValue) -> Option<&str> {
        self.predicates.get(value).map(String::as_str)
    }

    pub fn contains(&self, value: &FactorValue) -> bool {
        self.domain.contains(value)
    }

    /// Default fill value: the first of the declared domain.
    pub fn default_value(&self) -> FactorValue {
        self.domain[0]
    }
}

/// The ordered collection of all factors in a configuration.
///
/// Factor names are unique; order is declaration order and drives the
/// IPO streaming strategy's notion of "first two factors".
#[derive(Debug, Clone, Default)]
pub struct FactorSet {
    factors: Vec<Factor>,
}

impl FactorSet {
    pub fn new(factors: Vec<Factor>) -> Self {
        Self { factors }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Factor> {
        self.factors.iter()
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Factor> {
        self.factors.iter().find(|f| f.name == name)
    }

    /// Factor names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.factors.iter().map(|f| f.name.as_str()).collect()
    }
}
