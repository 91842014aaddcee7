//! Gateway to the external model checker.
//!
//! The checker decides satisfiability by refutation: we ask it to check
//! the NEGATION of the formula of interest. A `-- specification ... is
//! false` verdict means the negation fails, so the formula is satisfiable
//! (**feasible**) and the accompanying counterexample is its witness.
//! `... is true` means the formula is unsatisfiable (**infeasible**).
//! Anything else is a protocol error; the gateway never guesses, and a
//! timeout is its own condition — absence of a witness within a bound is
//! not a proof of unsatisfiability.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use std::io::Write;

use tracing::debug;
use wait_timeout::ChildExt;

use crate::formula::{check_balanced, negate, FormulaError};

/// The checker's answer for one formula.
#[derive(Debug, Clone)]
pub enum Verdict {
    /// The formula is satisfiable; `raw` is the checker's trace dump.
    Feasible { raw: String },
    /// The formula is unsatisfiable.
    Infeasible,
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("malformed formula rejected before submission: {0}")]
    Formula(#[from] FormulaError),

    #[error("checker timed out after {timeout:?} on formula: {formula}")]
    Timeout { timeout: Duration, formula: String },

    #[error("could not parse checker verdict for formula: {formula}\nraw output:\n{output}")]
    Protocol { formula: String, output: String },

    #[error("I/O error driving the checker: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstract capability: submit a formula, get a verdict and witness.
///
/// Abstracted behind a trait so the test suite can substitute a
/// deterministic mock and exercise the coverage engine without any
/// checker binary installed.
pub trait Oracle {
    /// Decide satisfiability of `formula` against the model.
    /// The gateway negates the formula internally before submission.
    fn submit(&mut self, formula: &str) -> Result<Verdict, OracleError>;
}

/// Configuration for the nuXmv-style checker subprocess.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Path to the checker binary; `nuXmv` from PATH when None.
    pub bin_path: Option<PathBuf>,
    /// Path to the transition model file.
    pub model_path: PathBuf,
    /// Wall-clock bound per invocation.
    pub timeout: Duration,
}

impl CheckerConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            bin_path: None,
            model_path: model_path.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_bin_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bin_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Real oracle backed by a nuXmv-compatible binary.
pub struct NuXmvOracle {
    config: CheckerConfig,
}

/// Outcome of scanning checker output for verdict lines.
#[derive(Debug, PartialEq, Eq)]
enum VerdictScan {
    /// Exactly one verdict value was reported.
    One(bool),
    /// No verdict line found.
    Missing,
    /// Both `true` and `false` verdicts appeared.
    Conflicting,
}

/// Scan combined stdout+stderr for `-- specification ... is (true|false)`
/// lines, case-insensitively.
fn scan_verdict(output: &str) -> VerdictScan {
    let mut saw_true = false;
    let mut saw_false = false;
    for line in output.lines() {
        let lowered = line.trim().to_lowercase();
        if !lowered.starts_with("-- specification") {
            continue;
        }
        if lowered.contains(" is false") {
            saw_false = true;
        } else if lowered.contains(" is true") {
            saw_true = true;
        }
    }
    match (saw_true, saw_false) {
        (true, false) => VerdictScan::One(true),
        (false, true) => VerdictScan::One(false),
        (false, false) => VerdictScan::Missing,
        (true, true) => VerdictScan::Conflicting,
    }
}

impl NuXmvOracle {
    pub fn new(config: CheckerConfig) -> Self {
        Self { config }
    }

    /// Whether a checker binary can be found at all.
    pub fn is_available() -> bool {
        which::which("nuXmv").is_ok()
    }

    /// Check that the model declares every variable the configuration
    /// binds to. Meant to run once, before the first query.
    pub fn validate_contract(
        &self,
        cfg: &tessera_factors::FactorConfig,
    ) -> Result<(), crate::validate::ContractError> {
        crate::validate::validate_model_file(&self.config.model_path, cfg)
    }

    fn bin(&self) -> PathBuf {
        self.config
            .bin_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("nuXmv"))
    }

    /// The command script for one query: load the model, build it, check
    /// the negated formula, dump the trace verbosely, quit.
    fn script_for(&self, negated: &str) -> String {
        format!(
            "read_model -i \"{}\"\n\
             go\n\
             check_ltlspec -p \"{}\"\n\
             show_traces -v\n\
             quit\n",
            self.config.model_path.display(),
            negated,
        )
    }
}

impl Oracle for NuXmvOracle {
    fn submit(&mut self, formula: &str) -> Result<Verdict, OracleError> {
        check_balanced(formula)?;
        let negated = negate(formula);

        // The script file lives exactly as long as this call; the handle's
        // drop removes it on every exit path, including errors below.
        let mut script = tempfile::NamedTempFile::new()?;
        script.write_all(self.script_for(&negated).as_bytes())?;
        script.flush()?;

        debug!(formula, "submitting negated formula to checker");

        let mut child = Command::new(self.bin())
            .arg("-source")
            .arg(script.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let output = match child.wait_timeout(self.config.timeout)? {
            Some(_) => child.wait_with_output()?,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(OracleError::Timeout {
                    timeout: self.config.timeout,
                    formula: formula.to_string(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = format!("{stdout}\n{stderr}");

        match scan_verdict(&combined) {
            // Negation refuted: the original formula has a witness.
            VerdictScan::One(false) => {
                debug!("verdict: feasible");
                Ok(Verdict::Feasible { raw: combined })
            }
            // Negation holds: the original formula is unsatisfiable.
            VerdictScan::One(true) => {
                debug!("verdict: infeasible");
                Ok(Verdict::Infeasible)
            }
            VerdictScan::Missing | VerdictScan::Conflicting => Err(OracleError::Protocol {
                formula: formula.to_string(),
                output: combined,
            }),
        }
    }
}
