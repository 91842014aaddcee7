//! Deterministic in-process oracle for tests.
//!
//! Verdicts are driven by substring matching on the submitted formula:
//! a conflict fires when every one of its tokens appears, and each
//! feasible verdict synthesizes a single-state witness from the default
//! variable assignments plus the bindings whose trigger token appears.

use crate::gateway::{Oracle, OracleError, Verdict};

/// Scriptable oracle. Records every submitted formula for inspection.
#[derive(Debug, Default)]
pub struct MockOracle {
    conflicts: Vec<Vec<String>>,
    defaults: Vec<(String, String)>,
    bindings: Vec<(String, Vec<(String, String)>)>,
    pub queries: Vec<String>,
}

impl MockOracle {
    /// An oracle that answers every query feasibly with `defaults` as the
    /// witness state.
    pub fn feasible(defaults: &[(&str, &str)]) -> Self {
        Self::default().with_defaults(defaults)
    }

    pub fn with_defaults(mut self, defaults: &[(&str, &str)]) -> Self {
        self.defaults = defaults
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    /// Declare a conjunction of tokens as unsatisfiable: any formula
    /// containing all of them is answered `Infeasible`.
    pub fn with_conflict(mut self, tokens: &[&str]) -> Self {
        self.conflicts
            .push(tokens.iter().map(|t| t.to_string()).collect());
        self
    }

    /// When `token` appears in a feasible formula, the witness state
    /// reports `assignments` on top of the defaults.
    pub fn with_binding(mut self, token: &str, assignments: &[(&str, &str)]) -> Self {
        self.bindings.push((
            token.to_string(),
            assignments
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self
    }

    fn witness_for(&self, formula: &str) -> String {
        let mut state: Vec<(String, String)> = self.defaults.clone();
        for (token, assignments) in &self.bindings {
            if !formula.contains(token.as_str()) {
                continue;
            }
            for (var, value) in assignments {
                match state.iter_mut().find(|(v, _)| v == var) {
                    Some(slot) => slot.1 = value.clone(),
                    None => state.push((var.clone(), value.clone())),
                }
            }
        }
        let mut raw = String::from("-- specification placeholder is false\n  -> State: 1.1 <-\n");
        for (var, value) in state {
            raw.push_str(&format!("    {var} = {value}\n"));
        }
        raw
    }
}

impl Oracle for MockOracle {
    fn submit(&mut self, formula: &str) -> Result<Verdict, OracleError> {
        self.queries.push(formula.to_string());
        let conflicted = self
            .conflicts
            .iter()
            .any(|tokens| tokens.iter().all(|t| formula.contains(t.as_str())));
        if conflicted {
            Ok(Verdict::Infeasible)
        } else {
            Ok(Verdict::Feasible {
                raw: self.witness_for(formula),
            })
        }
    }
}
