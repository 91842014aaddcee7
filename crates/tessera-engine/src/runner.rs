//! One generation run: propose, submit, classify, until every pair is
//! either covered or proven infeasible; then minimize and materialize.
//!
//! Errors are never locally recovered. A formula, oracle, trace, or
//! bookkeeping failure aborts the run with the offending context; there
//! is no partial-success mode.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use tracing::{debug, info};

use tessera_factors::{FactorConfig, Pair, Row};
use tessera_oracle::formula;
use tessera_oracle::trace::{extract_row, extract_steps, parse_trace, State};
use tessera_oracle::{FormulaError, Oracle, OracleError, TraceError, Verdict};

use crate::artifacts::{ArtifactError, ArtifactWriter};
use crate::coverage::{CoverageState, PartitionError};
use crate::minimize::{greedy_minimize, MinimizeError};
use crate::rng::run_rng;
use crate::strategy::{Proposal, RowStrategy};

/// One retained test: the row, its witness states, and the extracted
/// step sequence.
#[derive(Debug, Clone)]
pub struct Test {
    pub row: Row,
    pub states: Vec<State>,
    pub steps: Vec<String>,
}

/// Run-level knobs. Artifacts are written only when an output directory
/// is given.
#[derive(Debug, Clone, Default)]
pub struct GenerationConfig {
    pub seed: u64,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("trace rejected for formula {formula}: {source}")]
    Trace {
        formula: String,
        source: TraceError,
    },

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Minimize(#[from] MinimizeError),

    #[error(transparent)]
    Artifacts(#[from] ArtifactError),

    #[error("strategy '{0}' produced no proposal while pairs remain unclassified")]
    StrategyStalled(&'static str),
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Every distinct feasible row discovered, in discovery order.
    pub tests: Vec<Test>,
    /// Indices into `tests` retained by the minimizer, in selection order.
    pub selected: Vec<usize>,
    pub feasible_pairs: BTreeSet<Pair>,
    pub infeasible_pairs: BTreeSet<Pair>,
}

/// Drive one full generation run with the given strategy and oracle.
pub fn run_generation<O: Oracle, S: RowStrategy>(
    cfg: &FactorConfig,
    oracle: &mut O,
    strategy: &mut S,
    run: &GenerationConfig,
) -> Result<RunReport, RunError> {
    let mut state = CoverageState::new(&cfg.factors);
    let mut rng = run_rng(run.seed);
    let mut tests: Vec<Test> = Vec::new();

    info!(
        strategy = strategy.name(),
        universe = state.universe().len(),
        seed = run.seed,
        "starting generation run"
    );

    while !state.is_done() {
        let proposal = strategy
            .propose(&state, &cfg.factors, &mut rng)
            .ok_or(RunError::StrategyStalled(strategy.name()))?;

        match proposal {
            Proposal::ProbePair(pair) => {
                let phi = formula::for_pair(cfg, &pair)?;
                match oracle.submit(&phi)? {
                    Verdict::Feasible { raw } => {
                        let states = parse_trace(&raw);
                        // The witness fixes every factor, not just the
                        // probed pair.
                        let row = extract_row(&states, cfg).map_err(|source| RunError::Trace {
                            formula: phi,
                            source,
                        })?;
                        accept_row(cfg, &mut state, &mut tests, row, states);
                    }
                    Verdict::Infeasible => {
                        debug!(%pair, "pair proven infeasible");
                        state.mark_pair_infeasible(&pair);
                    }
                }
            }
            Proposal::ProbeRow { row, origin } => {
                let phi = formula::for_row(cfg, &row)?;
                match oracle.submit(&phi)? {
                    Verdict::Feasible { raw } => {
                        let states = parse_trace(&raw);
                        if states.is_empty() {
                            return Err(RunError::Trace {
                                formula: phi,
                                source: TraceError::MissingWitness,
                            });
                        }
                        accept_row(cfg, &mut state, &mut tests, row, states);
                    }
                    Verdict::Infeasible => {
                        debug!(%origin, "candidate row infeasible, diagnosing");
                        diagnose_row(cfg, oracle, &mut state, &row)?;
                    }
                }
            }
        }
    }

    let rows: Vec<&Row> = tests.iter().map(|t| &t.row).collect();
    state.verify_partition(&rows)?;

    let feasible_pairs = state.feasible_pairs();
    let selected = greedy_minimize(&rows, &feasible_pairs)?;

    if let Some(dir) = &run.output_dir {
        let mut writer = ArtifactWriter::new(dir)?;
        let mut keep = HashSet::new();
        for (idx, test) in tests.iter().enumerate() {
            let name = writer.write_steps(&test.row, &test.steps)?;
            if selected.contains(&idx) {
                keep.insert(name);
            }
        }
        writer.write_summaries(&feasible_pairs, state.infeasible_pairs())?;
        let pruned = writer.prune(&keep)?;
        debug!(pruned, "pruned artifacts outside the minimized suite");
    }

    info!(
        discovered = tests.len(),
        retained = selected.len(),
        feasible = feasible_pairs.len(),
        infeasible = state.infeasible_pairs().len(),
        "generation run complete"
    );

    Ok(RunReport {
        tests,
        selected,
        feasible_pairs,
        infeasible_pairs: state.infeasible_pairs().clone(),
    })
}

/// Book a feasible row: always retire its pairs; append a test only when
/// the row key is new.
fn accept_row(
    cfg: &FactorConfig,
    state: &mut CoverageState,
    tests: &mut Vec<Test>,
    row: Row,
    states: Vec<State>,
) {
    let retired = state.retire_covered(&row);
    if state.note_row_seen(&row) {
        let steps = extract_steps(&states, &cfg.step_var, &cfg.idle_step);
        debug!(retired, steps = steps.len(), "retaining new row");
        tests.push(Test { row, states, steps });
    } else {
        debug!(retired, "duplicate row, pairs retired without a new test");
    }
}

/// Localize a full-row infeasibility: probe each of the row's still-open
/// pairs on its own. Witnesses from these probes are discarded, the open
/// pairs stay in todo for future discovery. When no pair is individually
/// infeasible the row key is recorded as a higher-order infeasibility so
/// the same row is never rebuilt.
fn diagnose_row<O: Oracle>(
    cfg: &FactorConfig,
    oracle: &mut O,
    state: &mut CoverageState,
    row: &Row,
) -> Result<(), RunError> {
    let mut any_infeasible = false;
    for pair in tessera_factors::pairs_in_row(row) {
        if !state.todo().contains(&pair) {
            continue;
        }
        let phi = formula::for_pair(cfg, &pair)?;
        match oracle.submit(&phi)? {
            Verdict::Infeasible => {
                debug!(%pair, "diagnosis: pair infeasible");
                state.mark_pair_infeasible(&pair);
                any_infeasible = true;
            }
            Verdict::Feasible { .. } => {}
        }
    }
    if !any_infeasible {
        debug!("diagnosis: no single pair at fault, recording row key");
        state.mark_row_infeasible(row);
    }
    Ok(())
}
