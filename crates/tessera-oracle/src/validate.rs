//! Model-contract validation.
//!
//! Before any query is issued, the transition model must declare the
//! variables the configuration binds to: the step variable, the end flag
//! (when configured), and every factor's backing variable. The check is
//! restricted to the model's variable sections so an identifier buried in
//! a comment or formula does not satisfy the contract.

use tessera_factors::FactorConfig;

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("could not read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("model declares no VAR section")]
    MissingVarSection,

    #[error("model is missing required variable declarations: {}", .0.join(", "))]
    MissingIdentifiers(Vec<String>),
}

const SECTION_KEYWORDS: &[&str] = &[
    "VAR", "IVAR", "FROZENVAR", "DEFINE", "ASSIGN", "TRANS", "INIT", "INVAR", "LTLSPEC",
    "CTLSPEC", "FAIRNESS", "MODULE",
];

fn is_section_header(line: &str) -> Option<&'static str> {
    let first = line.trim().split_whitespace().next()?;
    SECTION_KEYWORDS.iter().find(|k| **k == first).copied()
}

/// Concatenated text of the model's VAR/IVAR/FROZENVAR sections.
fn variable_sections(model_text: &str) -> String {
    let mut collected = String::new();
    let mut in_vars = false;
    for line in model_text.lines() {
        match is_section_header(line) {
            Some("VAR") | Some("IVAR") | Some("FROZENVAR") => {
                in_vars = true;
                continue;
            }
            Some(_) => {
                in_vars = false;
                continue;
            }
            None => {}
        }
        if in_vars {
            collected.push_str(line);
            collected.push('\n');
        }
    }
    collected
}

/// Standalone-identifier search: the name must not be part of a longer
/// word.
fn has_identifier(text: &str, ident: &str) -> bool {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let mut start = 0;
    while let Some(pos) = text[start..].find(ident) {
        let abs = start + pos;
        let before_ok = abs == 0 || !text[..abs].chars().next_back().map_or(false, is_word);
        let after = abs + ident.len();
        let after_ok = after >= text.len() || !text[after..].chars().next().map_or(false, is_word);
        if before_ok && after_ok {
            return true;
        }
        start = abs + 1;
    }
    false
}

/// Verify the model text declares every variable the configuration
/// references.
pub fn validate_model_contract(model_text: &str, cfg: &FactorConfig) -> Result<(), ContractError> {
    let vars = variable_sections(model_text);
    if vars.trim().is_empty() {
        return Err(ContractError::MissingVarSection);
    }

    let mut required: Vec<(String, String)> = vec![("step_var".into(), cfg.step_var.clone())];
    if let Some(flag) = &cfg.end_flag {
        required.push(("end_flag".into(), flag.clone()));
    }
    for factor in cfg.factors.iter() {
        required.push((format!("factor '{}'", factor.name), factor.backing_var.clone()));
    }

    let missing: Vec<String> = required
        .into_iter()
        .filter(|(_, ident)| !has_identifier(&vars, ident))
        .map(|(label, ident)| format!("{label}='{ident}'"))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ContractError::MissingIdentifiers(missing))
    }
}

/// Convenience wrapper reading the model from disk.
pub fn validate_model_file(
    path: impl AsRef<std::path::Path>,
    cfg: &FactorConfig,
) -> Result<(), ContractError> {
    let text = std::fs::read_to_string(path)?;
    validate_model_contract(&text, cfg)
}
