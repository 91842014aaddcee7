use std::collections::{BTreeMap, BTreeSet};

use crate::factor::FactorSet;
use crate::value::FactorValue;

/// A full assignment: every factor name mapped to one value from its
/// domain. BTreeMap keeps iteration order canonical.
pub type Row = BTreeMap<String, FactorValue>;

/// Canonical identifier for a full assignment, used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(Vec<(String, FactorValue)>);

impl RowKey {
    pub fn of(row: &Row) -> Self {
        // Row iterates sorted by factor name already.
        RowKey(row.iter().map(|(n, v)| (n.clone(), *v)).collect())
    }
}

/// An unordered combination of two factor/value bindings.
///
/// Construction canonicalizes by factor name so `{(a,x),(b,y)}` and
/// `{(b,y),(a,x)}` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    first: (String, FactorValue),
    second: (String, FactorValue),
}

impl Pair {
    /// Build a canonical pair. The two factor names must differ.
    pub fn new(
        factor_a: impl Into<String>,
        value_a: FactorValue,
        factor_b: impl Into<String>,
        value_b: FactorValue,
    ) -> Self {
        let a = (factor_a.into(), value_a);
        let b = (factor_b.into(), value_b);
        debug_assert_ne!(a.0, b.0, "a pair binds two distinct factors");
        if a.0 <= b.0 {
            Pair { first: a, second: b }
        } else {
            Pair { first: b, second: a }
        }
    }

    pub fn first(&self) -> (&str, &FactorValue) {
        (&self.first.0, &self.first.1)
    }

    pub fn second(&self) -> (&str, &FactorValue) {
        (&self.second.0, &self.second.1)
    }

    /// Both bindings, in canonical order.
    pub fn bindings(&self) -> [(&str, &FactorValue); 2] {
        [self.first(), self.second()]
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}={} & {}={}",
            self.first.0,
            self.first.1.model_text(),
            self.second.0,
            self.second.1.model_text()
        )
    }
}

/// The full 2-way requirement universe: every unordered factor pair
/// crossed with both domains. Size is `sum over i<j of |dom_i|*|dom_j|`.
pub fn pair_universe(factors: &FactorSet) -> BTreeSet<Pair> {
    let all: Vec<_> = factors.iter().collect();
    let mut universe = BTreeSet::new();
    for i in 0..all.len() {
        for j in (i + 1)..all.len() {
            for vi in &all[i].domain {
                for vj in &all[j].domain {
                    universe.insert(Pair::new(all[i].name.clone(), *vi, all[j].name.clone(), *vj));
                }
            }
        }
    }
    universe
}

/// All pairs present in a full row.
pub fn pairs_in_row(row: &Row) -> BTreeSet<Pair> {
    let entries: Vec<_> = row.iter().collect();
    let mut pairs = BTreeSet::new();
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            pairs.insert(Pair::new(
                entries[i].0.clone(),
                *entries[i].1,
                entries[j].0.clone(),
                *entries[j].1,
            ));
        }
    }
    pairs
}

/// Does the row bind both of the pair's factors to the pair's values?
pub fn row_satisfies(row: &Row, pair: &Pair) -> bool {
    pair.bindings()
        .iter()
        .all(|(name, value)| row.get(*name) == Some(*value))
}
