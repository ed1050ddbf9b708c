//! Formula variable validation
//!
//! Used when a formula is authored: every variable it mentions must be a
//! key of another field in the same template.

use crate::error::{FormulaError, FormulaResult};
use crate::tokenizer::tokenize;
use crate::variables::KeySet;

/// Variable names referenced by a formula, in order of first appearance
pub fn referenced_variables(formula: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for token in tokenize(formula) {
        if token.is_variable() && !names.contains(&token.text) {
            names.push(token.text);
        }
    }
    names
}

/// Check that every variable in `formula` is one of `available_keys`.
///
/// Returns the first unknown variable as [`FormulaError::UnknownVariable`].
/// Malformed formulas are not rejected here; only their variables are
/// checked.
///
/// # Example
/// ```rust
/// use branch_report_formula::{validate_formula_variables, FormulaError};
///
/// assert!(validate_formula_variables("A + B", &["A", "B", "C"]).is_ok());
/// assert_eq!(
///     validate_formula_variables("A + Z", &["A", "B"]),
///     Err(FormulaError::UnknownVariable("Z".into()))
/// );
/// ```
pub fn validate_formula_variables<K>(formula: &str, available_keys: &K) -> FormulaResult<()>
where
    K: KeySet + ?Sized,
{
    match tokenize(formula)
        .into_iter()
        .find(|t| t.is_variable() && !available_keys.contains_key(&t.text))
    {
        Some(unknown) => Err(FormulaError::UnknownVariable(unknown.text)),
        None => Ok(()),
    }
}

/// Validation verdict in the shape returned to the template editor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormulaValidation {
    pub valid: bool,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

impl FormulaValidation {
    /// A passing verdict
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }
}

impl From<FormulaResult<()>> for FormulaValidation {
    fn from(result: FormulaResult<()>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self {
                valid: false,
                error: Some(e.to_string()),
            },
        }
    }
}
