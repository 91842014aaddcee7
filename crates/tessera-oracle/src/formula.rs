//! Pure builders turning factor assignments into temporal formulas.
//!
//! Every builder conjoins the global test-applicability rule and the enum
//! domain guard, so a witness trace can never report a backing variable
//! outside its declared domain. Parenthesis balance is validated before a
//! formula leaves this module; an unbalanced formula is a programming
//! contract violation, never something to hand to the checker.

use tessera_factors::{FactorConfig, FactorKind, FactorValue, Pair, Row};

#[derive(Debug, thiserror::Error)]
pub enum FormulaError {
    #[error("unbalanced parentheses (balance {balance}) in formula: {formula}")]
    Unbalanced { balance: i64, formula: String },

    #[error("unknown factor '{0}' in formula request")]
    UnknownFactor(String),

    #[error("factor '{factor}' has no declared predicate for value {value}")]
    UnknownValue { factor: String, value: FactorValue },
}

/// Validate parenthesis balance. Called on every formula before it is
/// returned to a caller.
pub fn check_balanced(formula: &str) -> Result<(), FormulaError> {
    let mut balance: i64 = 0;
    for ch in formula.chars() {
        match ch {
            '(' => balance += 1,
            ')' => {
                balance -= 1;
                if balance < 0 {
                    return Err(FormulaError::Unbalanced {
                        balance,
                        formula: formula.to_string(),
                    });
                }
            }
            _ => {}
        }
    }
    if balance != 0 {
        return Err(FormulaError::Unbalanced {
            balance,
            formula: formula.to_string(),
        });
    }
    Ok(())
}

/// Wrap a formula in `!(...)`, unless it is already wrapped exactly so.
pub fn negate(formula: &str) -> String {
    let trimmed = formula.trim();
    if trimmed.starts_with("!(") && trimmed.ends_with(')') {
        // Only skip the wrap when the leading "!(" closes at the very end.
        let inner = &trimmed[2..trimmed.len() - 1];
        if check_balanced(inner).is_ok() {
            return trimmed.to_string();
        }
    }
    format!("!({trimmed})")
}

/// The declared predicate for one factor value.
pub fn for_value(
    cfg: &FactorConfig,
    factor_name: &str,
    value: &FactorValue,
) -> Result<String, FormulaError> {
    let factor = cfg
        .factors
        .get(factor_name)
        .ok_or_else(|| FormulaError::UnknownFactor(factor_name.to_string()))?;
    let predicate = factor
        .predicate_for(value)
        .ok_or_else(|| FormulaError::UnknownValue {
            factor: factor_name.to_string(),
            value: *value,
        })?;
    check_balanced(predicate)?;
    Ok(predicate.to_string())
}

/// Domain guard: forces every enum factor's backing variable to stay
/// within its declared domain, so a satisfying trace cannot take an
/// undeclared value that row extraction would then reject.
fn domain_guard(cfg: &FactorConfig) -> String {
    let mut parts = Vec::new();
    for factor in cfg.factors.iter() {
        if factor.kind != FactorKind::Enum {
            continue;
        }
        let alternatives = factor
            .domain
            .iter()
            .map(|v| format!("{} = {}", factor.backing_var, v.model_text()))
            .collect::<Vec<_>>()
            .join(" | ");
        parts.push(format!("G({alternatives})"));
    }
    if parts.is_empty() {
        "TRUE".to_string()
    } else {
        parts.join(" & ")
    }
}

/// Formula for a single pair: both per-value predicates, the test rule,
/// the domain guard, and (when an end flag is declared) a reachability
/// guard requiring the flag to eventually hold together with both
/// predicates.
pub fn for_pair(cfg: &FactorConfig, pair: &Pair) -> Result<String, FormulaError> {
    let (name_a, value_a) = pair.first();
    let (name_b, value_b) = pair.second();
    let p_a = for_value(cfg, name_a, value_a)?;
    let p_b = for_value(cfg, name_b, value_b)?;

    let core = format!("({p_a}) & ({p_b})");
    let rule = cfg.resolved_test_rule();
    let guard = domain_guard(cfg);

    let formula = match &cfg.end_flag {
        Some(flag) => format!("(({rule}) & ({guard}) & ({core}) & (F(({flag}) & {core})))"),
        None => format!("(({rule}) & ({guard}) & ({core}))"),
    };
    check_balanced(&formula)?;
    Ok(formula)
}

/// Formula for a full row: test rule, domain guard, and the conjunction
/// of every factor's per-value predicate.
pub fn for_row(cfg: &FactorConfig, row: &Row) -> Result<String, FormulaError> {
    let bindings: Vec<(&str, &FactorValue)> =
        row.iter().map(|(n, v)| (n.as_str(), v)).collect();
    for_partial(cfg, &bindings)
}

/// Formula for a partial assignment: the row pattern restricted to a
/// subset of factors. Used when re-probing after a full-row failure.
pub fn for_partial(
    cfg: &FactorConfig,
    bindings: &[(&str, &FactorValue)],
) -> Result<String, FormulaError> {
    let mut parts = Vec::new();
    for (name, value) in bindings {
        parts.push(format!("({})", for_value(cfg, name, value)?));
    }
    let core = if parts.is_empty() {
        "TRUE".to_string()
    } else {
        parts.join(" & ")
    };
    let rule = cfg.resolved_test_rule();
    let guard = domain_guard(cfg);

    let formula = format!("(({rule}) & ({guard}) & ({core}))");
    check_balanced(&formula)?;
    Ok(formula)
}
