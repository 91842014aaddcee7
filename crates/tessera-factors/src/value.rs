use serde::{Deserialize, Serialize};

/// A concrete value a factor can take.
///
/// Booleans and integers share the domain slot, so the distinction is an
/// explicit tag rather than an implicit coercion. Ordering is total:
/// booleans sort before integers, which keeps `RowKey` canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FactorValue {
    Bool(bool),
    Int(i64),
}

impl FactorValue {
    /// Render the value the way the model checker spells it
    /// (`TRUE`/`FALSE` for booleans, decimal for integers).
    pub fn model_text(&self) -> String {
        match self {
            FactorValue::Bool(true) => "TRUE".to_string(),
            FactorValue::Bool(false) => "FALSE".to_string(),
            FactorValue::Int(i) => i.to_string(),
        }
    }

    /// Numeric code used in artifact filenames: booleans map to 1/0,
    /// integers are verbatim.
    pub fn filename_code(&self) -> String {
        match self {
            FactorValue::Bool(true) => "1".to_string(),
            FactorValue::Bool(false) => "0".to_string(),
            FactorValue::Int(i) => i.to_string(),
        }
    }
}

impl std::fmt::Display for FactorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactorValue::Bool(b) => write!(f, "{b}"),
            FactorValue::Int(i) => write!(f, "{i}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_text() {
        assert_eq!(FactorValue::Bool(true).model_text(), "TRUE");
        assert_eq!(FactorValue::Bool(false).model_text(), "FALSE");
        assert_eq!(FactorValue::Int(-3).model_text(), "-3");
    }

    #[test]
    fn test_filename_code() {
        assert_eq!(FactorValue::Bool(true).filename_code(), "1");
        assert_eq!(FactorValue::Bool(false).filename_code(), "0");
        assert_eq!(FactorValue::Int(5).filename_code(), "5");
    }

    #[test]
    fn test_ordering_total_within_kind() {
        assert!(FactorValue::Bool(false) < FactorValue::Bool(true));
        assert!(FactorValue::Int(3) < FactorValue::Int(4));
        // Cross-kind order is fixed so sorting mixed sets is stable.
        assert!(FactorValue::Bool(true) < FactorValue::Int(0));
    }
}
