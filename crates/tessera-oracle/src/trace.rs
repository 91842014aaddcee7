//! Line-oriented parser for the checker's raw trace text.
//!
//! Grammar:
//! - a line starting with `-> State` begins a new state;
//! - `identifier = value` lines populate the pending state;
//! - a `Trace number:` marker terminates parsing — only the first
//!   counterexample matters, later dumps are ignored.
//!
//! Parsing is a pure function from raw text to a committed state
//! sequence; extraction modes (step sequence, summarizing row) are
//! separate passes over that sequence.

use std::collections::BTreeMap;

use tessera_factors::{FactorConfig, FactorKind, FactorValue, Row};

/// One trace state: raw variable name to raw textual value.
pub type State = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("checker reported a witness but the trace contains no parsable state")]
    MissingWitness,

    #[error("backing variable '{var}' for factor '{factor}' is absent from the witness state")]
    MissingVariable { factor: String, var: String },

    #[error("factor '{factor}' extracted value '{value}', outside its declared domain")]
    DomainViolation { factor: String, value: String },
}

fn is_state_delimiter(line: &str) -> bool {
    line.trim_start().starts_with("-> State")
}

fn is_trace_boundary(line: &str) -> bool {
    line.contains("Trace number:")
}

fn parse_assignment(line: &str) -> Option<(String, String)> {
    let (lhs, rhs) = line.split_once('=')?;
    let name = lhs.trim();
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return None;
    }
    Some((name.to_string(), rhs.trim().to_string()))
}

/// Parse raw checker output into the committed state sequence of the
/// first trace. Variables keep the value from the state they were
/// reported in; the checker only prints changed variables per state, so
/// each committed state inherits the previous one's assignments.
pub fn parse_trace(raw: &str) -> Vec<State> {
    let mut states = Vec::new();
    let mut current = State::new();
    let mut pending: Option<State> = None;

    for line in raw.lines() {
        if is_trace_boundary(line) {
            break;
        }
        if is_state_delimiter(line) {
            if let Some(p) = pending.take() {
                current.extend(p);
                states.push(current.clone());
            }
            pending = Some(State::new());
            continue;
        }
        if let (Some(p), Some((name, value))) = (pending.as_mut(), parse_assignment(line)) {
            p.insert(name, value);
        }
    }
    if let Some(p) = pending {
        current.extend(p);
        states.push(current);
    }
    states
}

fn normalize_step(raw: &str) -> String {
    raw.trim().trim_matches('"').to_lowercase()
}

/// Step-sequence extraction: the step variable's normalized value per
/// state, with the idle sentinel dropped. States that do not report the
/// step variable contribute nothing.
pub fn extract_steps(states: &[State], step_var: &str, idle_step: &str) -> Vec<String> {
    let mut steps = Vec::new();
    for state in states {
        if let Some(raw) = state.get(step_var) {
            let step = normalize_step(raw);
            if step != idle_step {
                steps.push(step);
            }
        }
    }
    steps
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_uppercase().as_str() {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}

/// Select the state a row is summarized from: the last state where the
/// end flag holds, else the very last state.
fn summary_state<'a>(states: &'a [State], end_flag: Option<&str>) -> Option<&'a State> {
    if let Some(flag) = end_flag {
        if let Some(state) = states
            .iter()
            .rev()
            .find(|s| s.get(flag).and_then(|v| parse_bool(v)) == Some(true))
        {
            return Some(state);
        }
    }
    states.last()
}

/// Row extraction: coerce every factor's backing variable from the
/// summary state. A missing variable or an out-of-domain value is fatal —
/// it signals a broken factor/model binding, never something to patch up
/// with a default.
pub fn extract_row(states: &[State], cfg: &FactorConfig) -> Result<Row, TraceError> {
    let state = summary_state(states, cfg.end_flag.as_deref()).ok_or(TraceError::MissingWitness)?;

    let mut row = Row::new();
    for factor in cfg.factors.iter() {
        let raw = state
            .get(&factor.backing_var)
            .ok_or_else(|| TraceError::MissingVariable {
                factor: factor.name.clone(),
                var: factor.backing_var.clone(),
            })?;

        let value = match factor.kind {
            FactorKind::Bool => parse_bool(raw).map(FactorValue::Bool),
            FactorKind::Enum => raw.trim().parse::<i64>().ok().map(FactorValue::Int),
        }
        .ok_or_else(|| TraceError::DomainViolation {
            factor: factor.name.clone(),
            value: raw.clone(),
        })?;

        if !factor.contains(&value) {
            return Err(TraceError::DomainViolation {
                factor: factor.name.clone(),
                value: raw.clone(),
            });
        }
        row.insert(factor.name.clone(), value);
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "\
-- specification !( phi ) is false
-- as demonstrated by the following execution sequence
Trace Description: LTL Counterexample
Trace Type: Counterexample
  -> State: 1.1 <-
    step = none
    items = 0
    done = FALSE
  -> State: 1.2 <-
    step = \"add\"
    items = 3
  -> State: 1.3 <-
    step = checkout
    done = TRUE
<!-- ################### Trace number: 1 ################### -->
  -> State: 9.9 <-
    step = ignored
";

    fn sample_cfg() -> FactorConfig {
        FactorConfig::from_json(
            r#"{
                "step_var": "step",
                "end_flag": "done",
                "factors": [
                    { "name": "b_items", "var": "items", "values": [
                        { "value": 0, "ltl": "F(items = 0)" },
                        { "value": 3, "ltl": "F(items = 3)" }
                    ]},
                    { "name": "d_done", "var": "done", "ltl": "F(done = TRUE)" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_trace_commits_three_states() {
        let states = parse_trace(RAW);
        assert_eq!(states.len(), 3);
        assert_eq!(states[0].get("step").unwrap(), "none");
        // States inherit unchanged variables from earlier states.
        assert_eq!(states[1].get("done").unwrap(), "FALSE");
        assert_eq!(states[2].get("items").unwrap(), "3");
    }

    #[test]
    fn test_parse_trace_stops_at_boundary() {
        let states = parse_trace(RAW);
        assert!(states.iter().all(|s| s.get("step").unwrap() != "ignored"));
    }

    #[test]
    fn test_parse_trace_empty_input() {
        assert!(parse_trace("").is_empty());
        assert!(parse_trace("no states here").is_empty());
    }

    #[test]
    fn test_extract_steps_normalizes_and_skips_idle() {
        let states = parse_trace(RAW);
        let steps = extract_steps(&states, "step", "none");
        assert_eq!(steps, vec!["add", "checkout"]);
    }

    #[test]
    fn test_extract_row_prefers_end_flag_state() {
        let states = parse_trace(RAW);
        let cfg = sample_cfg();
        let row = extract_row(&states, &cfg).unwrap();
        assert_eq!(row.get("b_items"), Some(&FactorValue::Int(3)));
        assert_eq!(row.get("d_done"), Some(&FactorValue::Bool(true)));
    }

    #[test]
    fn test_extract_row_falls_back_to_last_state() {
        let raw = "\
  -> State: 1.1 <-
    items = 0
    done = FALSE
";
        let cfg = sample_cfg();
        let row = extract_row(&parse_trace(raw), &cfg).unwrap();
        assert_eq!(row.get("b_items"), Some(&FactorValue::Int(0)));
        assert_eq!(row.get("d_done"), Some(&FactorValue::Bool(false)));
    }

    #[test]
    fn test_extract_row_missing_variable_is_fatal() {
        let raw = "\
  -> State: 1.1 <-
    done = TRUE
";
        let cfg = sample_cfg();
        let err = extract_row(&parse_trace(raw), &cfg).unwrap_err();
        assert!(matches!(err, TraceError::MissingVariable { .. }));
    }

    #[test]
    fn test_extract_row_out_of_domain_is_fatal() {
        let raw = "\
  -> State: 1.1 <-
    items = 7
    done = TRUE
";
        let cfg = sample_cfg();
        let err = extract_row(&parse_trace(raw), &cfg).unwrap_err();
        assert!(matches!(err, TraceError::DomainViolation { .. }));
    }

    #[test]
    fn test_extract_row_non_boolean_text_is_fatal() {
        let raw = "\
  -> State: 1.1 <-
    items = 3
    done = maybe
";
        let cfg = sample_cfg();
        let err = extract_row(&parse_trace(raw), &cfg).unwrap_err();
        assert!(matches!(err, TraceError::DomainViolation { .. }));
    }

    #[test]
    fn test_extract_row_no_states() {
        let cfg = sample_cfg();
        let err = extract_row(&[], &cfg).unwrap_err();
        assert!(matches!(err, TraceError::MissingWitness));
    }
}
