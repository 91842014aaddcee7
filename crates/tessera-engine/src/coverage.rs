//! Pair-universe bookkeeping for one generation run.
//!
//! Invariants maintained at every step:
//! - `todo` and `infeasible_pairs` are disjoint;
//! - a pair leaves `todo` exactly once, either by being satisfied by an
//!   accepted row or by being proven infeasible;
//! - at termination every pair of the universe is in exactly one of
//!   {covered by a retained test, infeasible}. `verify_partition` checks
//!   this as a post-condition and aborts loudly on any contradiction.

use std::collections::{BTreeSet, HashSet};

use tessera_factors::{pair_universe, pairs_in_row, FactorSet, Pair, Row, RowKey};

#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    #[error("pair {0} is recorded infeasible yet satisfied by a retained test")]
    Contradiction(Pair),

    #[error("pair {0} is neither covered nor infeasible at termination")]
    Unclassified(Pair),
}

/// Mutable coverage bookkeeping. Owned exclusively by the runner for the
/// duration of one run; strategies get a shared borrow.
#[derive(Debug)]
pub struct CoverageState {
    universe: BTreeSet<Pair>,
    todo: BTreeSet<Pair>,
    infeasible_pairs: BTreeSet<Pair>,
    seen_row_keys: HashSet<RowKey>,
    infeasible_row_keys: HashSet<RowKey>,
}

impl CoverageState {
    pub fn new(factors: &FactorSet) -> Self {
        let universe = pair_universe(factors);
        Self {
            todo: universe.clone(),
            universe,
            infeasible_pairs: BTreeSet::new(),
            seen_row_keys: HashSet::new(),
            infeasible_row_keys: HashSet::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.todo.is_empty()
    }

    pub fn todo(&self) -> &BTreeSet<Pair> {
        &self.todo
    }

    pub fn universe(&self) -> &BTreeSet<Pair> {
        &self.universe
    }

    pub fn infeasible_pairs(&self) -> &BTreeSet<Pair> {
        &self.infeasible_pairs
    }

    /// Universe minus the proven-infeasible pairs.
    pub fn feasible_pairs(&self) -> BTreeSet<Pair> {
        self.universe
            .difference(&self.infeasible_pairs)
            .cloned()
            .collect()
    }

    /// Record a pair-level infeasibility proof.
    pub fn mark_pair_infeasible(&mut self, pair: &Pair) {
        self.todo.remove(pair);
        self.infeasible_pairs.insert(pair.clone());
    }

    /// Retire from `todo` every pair the row satisfies. Returns how many
    /// pairs were newly retired.
    pub fn retire_covered(&mut self, row: &Row) -> usize {
        let mut retired = 0;
        for pair in pairs_in_row(row) {
            if self.todo.remove(&pair) {
                retired += 1;
            }
        }
        retired
    }

    /// Record a row's key; true when the row has not been seen before.
    pub fn note_row_seen(&mut self, row: &Row) -> bool {
        self.seen_row_keys.insert(RowKey::of(row))
    }

    /// Record a higher-order infeasibility: the exact row is
    /// unsatisfiable although none of its pairs individually is.
    pub fn mark_row_infeasible(&mut self, row: &Row) {
        self.infeasible_row_keys.insert(RowKey::of(row));
    }

    pub fn is_row_infeasible(&self, row: &Row) -> bool {
        self.infeasible_row_keys.contains(&RowKey::of(row))
    }

    /// Terminal consistency check over the retained rows.
    pub fn verify_partition(&self, rows: &[&Row]) -> Result<(), PartitionError> {
        let mut covered = BTreeSet::new();
        for row in rows {
            covered.extend(pairs_in_row(row));
        }
        for pair in &self.universe {
            let is_covered = covered.contains(pair);
            let is_infeasible = self.infeasible_pairs.contains(pair);
            if is_covered && is_infeasible {
                return Err(PartitionError::Contradiction(pair.clone()));
            }
            if !is_covered && !is_infeasible {
                return Err(PartitionError::Unclassified(pair.clone()));
            }
        }
        Ok(())
    }
}
