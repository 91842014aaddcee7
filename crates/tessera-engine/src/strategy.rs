//! Pluggable row-proposal strategies.
//!
//! A strategy decides WHAT to ask the oracle next; the runner owns all
//! classification and bookkeeping. Strategies are stateless except for
//! their own streaming position, so swapping one never changes the
//! coverage accounting.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use tessera_factors::{pairs_in_row, FactorSet, FactorValue, Pair, Row};

use crate::coverage::CoverageState;

/// One oracle interaction proposed by a strategy.
#[derive(Debug, Clone)]
pub enum Proposal {
    /// Probe the pair formula directly; a witness yields a full row.
    ProbePair(Pair),
    /// Probe a complete candidate row built around `origin`.
    ProbeRow { row: Row, origin: Pair },
}

pub trait RowStrategy {
    fn name(&self) -> &'static str;

    /// Next proposal, or None when the strategy has nothing left to
    /// offer. Only called while `state` still has todo pairs.
    fn propose(
        &mut self,
        state: &CoverageState,
        factors: &FactorSet,
        rng: &mut ChaCha8Rng,
    ) -> Option<Proposal>;
}

fn random_todo_pair(state: &CoverageState, rng: &mut ChaCha8Rng) -> Option<Pair> {
    let todo = state.todo();
    if todo.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..todo.len());
    todo.iter().nth(idx).cloned()
}

/// The candidate row pinning a pair's two factors, all others at their
/// domain's first value.
fn default_filled_row(pair: &Pair, factors: &FactorSet) -> Row {
    let mut row = Row::new();
    for factor in factors.iter() {
        row.insert(factor.name.clone(), factor.default_value());
    }
    for (name, value) in pair.bindings() {
        row.insert(name.to_string(), *value);
    }
    row
}

fn todo_gain(state: &CoverageState, row: &Row) -> usize {
    pairs_in_row(row)
        .iter()
        .filter(|p| state.todo().contains(*p))
        .count()
}

/// Random pair from todo, other factors default-filled, probed as a full
/// row. When that exact row is already known infeasible the pair is
/// probed directly instead, so it still gets classified.
#[derive(Debug, Default)]
pub struct DefaultFillStrategy;

impl RowStrategy for DefaultFillStrategy {
    fn name(&self) -> &'static str {
        "default-fill"
    }

    fn propose(
        &mut self,
        state: &CoverageState,
        factors: &FactorSet,
        rng: &mut ChaCha8Rng,
    ) -> Option<Proposal> {
        let pair = random_todo_pair(state, rng)?;
        let row = default_filled_row(&pair, factors);
        if state.is_row_infeasible(&row) {
            Some(Proposal::ProbePair(pair))
        } else {
            Some(Proposal::ProbeRow { row, origin: pair })
        }
    }
}

/// Random pair from todo, probed directly; the runner extracts the whole
/// row from the witness.
#[derive(Debug, Default)]
pub struct DirectStrategy;

impl RowStrategy for DirectStrategy {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn propose(
        &mut self,
        state: &CoverageState,
        _factors: &FactorSet,
        rng: &mut ChaCha8Rng,
    ) -> Option<Proposal> {
        random_todo_pair(state, rng).map(Proposal::ProbePair)
    }
}

/// In-parameter-order streaming for exactly three factors.
///
/// Phase 1 walks every combination of the first two factors' domains and
/// greedily picks the third factor's value with the highest todo gain.
/// Phase 2 (completion) targets leftover todo pairs one at a time,
/// building a row that avoids every known-infeasible pair and row key,
/// degrading to a direct pair probe when no such row exists.
#[derive(Debug)]
pub struct IpoStreamStrategy {
    stream: Vec<(FactorValue, FactorValue)>,
    position: usize,
    first: String,
    second: String,
}

impl IpoStreamStrategy {
    /// Only defined for exactly three factors; the stream runs over the
    /// first two in declaration order.
    pub fn for_factors(factors: &FactorSet) -> Option<Self> {
        if factors.len() != 3 {
            return None;
        }
        let all: Vec<_> = factors.iter().collect();
        let mut stream = Vec::new();
        for v1 in &all[0].domain {
            for v2 in &all[1].domain {
                stream.push((*v1, *v2));
            }
        }
        Some(Self {
            stream,
            position: 0,
            first: all[0].name.clone(),
            second: all[1].name.clone(),
        })
    }

    fn stream_next(&mut self, state: &CoverageState, factors: &FactorSet) -> Option<Proposal> {
        while self.position < self.stream.len() {
            let (v1, v2) = self.stream[self.position];
            self.position += 1;

            let origin = Pair::new(self.first.clone(), v1, self.second.clone(), v2);
            if state.infeasible_pairs().contains(&origin) {
                continue;
            }
            match best_completion(state, factors, &origin) {
                Some(row) if todo_gain(state, &row) > 0 => {
                    return Some(Proposal::ProbeRow { row, origin });
                }
                Some(_) => continue,
                // Every completion is already ruled out; classify the
                // origin pair on its own.
                None if state.todo().contains(&origin) => {
                    return Some(Proposal::ProbePair(origin));
                }
                None => continue,
            }
        }
        None
    }
}

/// Highest-gain row containing `pair` that avoids known-infeasible pairs
/// and row keys. None when every candidate is ruled out.
fn best_completion(state: &CoverageState, factors: &FactorSet, pair: &Pair) -> Option<Row> {
    let free = factors
        .iter()
        .find(|f| f.name != pair.first().0 && f.name != pair.second().0)?;

    let mut best: Option<(usize, Row)> = None;
    for value in &free.domain {
        let mut row = Row::new();
        row.insert(free.name.clone(), *value);
        for (name, v) in pair.bindings() {
            row.insert(name.to_string(), *v);
        }
        let blocked = pairs_in_row(&row)
            .iter()
            .any(|p| state.infeasible_pairs().contains(p))
            || state.is_row_infeasible(&row);
        if blocked {
            continue;
        }
        let gain = todo_gain(state, &row);
        if best.as_ref().map_or(true, |(g, _)| gain > *g) {
            best = Some((gain, row));
        }
    }
    best.map(|(_, row)| row)
}

impl RowStrategy for IpoStreamStrategy {
    fn name(&self) -> &'static str {
        "ipo-stream"
    }

    fn propose(
        &mut self,
        state: &CoverageState,
        factors: &FactorSet,
        rng: &mut ChaCha8Rng,
    ) -> Option<Proposal> {
        if let Some(proposal) = self.stream_next(state, factors) {
            return Some(proposal);
        }
        // Completion phase.
        let pair = random_todo_pair(state, rng)?;
        match best_completion(state, factors, &pair) {
            Some(row) => Some(Proposal::ProbeRow { row, origin: pair }),
            None => Some(Proposal::ProbePair(pair)),
        }
    }
}
