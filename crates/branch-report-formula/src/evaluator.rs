//! Formula evaluator
//!
//! Reduces postfix expressions to a number and ties the pipeline together:
//! tokenize, resolve and reorder, then evaluate.
//!
//! There are three entry points with increasing leniency:
//! - [`try_evaluate_formula`] reports malformed formulas as errors
//! - [`evaluate_formula_outcome`] keeps the error but marks it soft
//! - [`evaluate_formula`] always returns a number, `0.0` on failure

use crate::error::{FormulaError, FormulaResult};
use crate::postfix::{to_postfix, PostfixItem};
use crate::tokenizer::tokenize;
use crate::variables::Variables;

/// Result of a lenient evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaOutcome {
    /// The formula evaluated normally
    Computed(f64),
    /// The formula was malformed; displayed as `0`
    SoftFailed(FormulaError),
}

impl FormulaOutcome {
    /// The number to display for this outcome
    pub fn value(&self) -> f64 {
        match self {
            FormulaOutcome::Computed(n) => *n,
            FormulaOutcome::SoftFailed(_) => 0.0,
        }
    }

    /// Whether the value is a stand-in for a failed evaluation
    pub fn is_soft_failure(&self) -> bool {
        matches!(self, FormulaOutcome::SoftFailed(_))
    }

    /// The suppressed error, if any
    pub fn error(&self) -> Option<&FormulaError> {
        match self {
            FormulaOutcome::SoftFailed(e) => Some(e),
            FormulaOutcome::Computed(_) => None,
        }
    }
}

impl From<FormulaResult<f64>> for FormulaOutcome {
    fn from(result: FormulaResult<f64>) -> Self {
        match result {
            Ok(n) => FormulaOutcome::Computed(n),
            Err(e) => FormulaOutcome::SoftFailed(e),
        }
    }
}

/// Evaluate a postfix expression.
///
/// An empty expression evaluates to `0.0`. An operator without two operands,
/// or operands left over at the end, is an error.
pub fn evaluate_postfix(items: &[PostfixItem]) -> FormulaResult<f64> {
    let mut stack: Vec<f64> = Vec::with_capacity(items.len());

    for item in items {
        match *item {
            PostfixItem::Number(n) => stack.push(n),
            PostfixItem::Operator(op) => {
                // Right operand is on top
                let (b, a) = match (stack.pop(), stack.pop()) {
                    (Some(b), Some(a)) => (b, a),
                    _ => {
                        return Err(FormulaError::MissingOperand {
                            operator: op.symbol(),
                        })
                    }
                };
                stack.push(op.apply(a, b));
            }
        }
    }

    match stack.as_slice() {
        [] => Ok(0.0),
        [value] => Ok(*value),
        rest => Err(FormulaError::DanglingOperand {
            count: rest.len() - 1,
        }),
    }
}

/// Evaluate a formula, reporting malformed input as an error.
///
/// Variables missing from `values` count as `0.0`, and division by zero
/// yields `0.0`; neither is an error.
///
/// # Example
/// ```rust
/// use branch_report_formula::try_evaluate_formula;
///
/// let values = [("A", 1000.0), ("B", 600.0)];
/// assert_eq!(try_evaluate_formula("(A - B) / A", &values).unwrap(), 0.4);
/// assert!(try_evaluate_formula("(A - B", &values).is_err());
/// ```
pub fn try_evaluate_formula<V>(formula: &str, values: &V) -> FormulaResult<f64>
where
    V: Variables + ?Sized,
{
    let tokens = tokenize(formula);
    let postfix = to_postfix(&tokens, values)?;
    tracing::trace!(formula, postfix = ?postfix, "converted formula to postfix");
    evaluate_postfix(&postfix)
}

/// Evaluate a formula, keeping any failure as [`FormulaOutcome::SoftFailed`]
pub fn evaluate_formula_outcome<V>(formula: &str, values: &V) -> FormulaOutcome
where
    V: Variables + ?Sized,
{
    let outcome = FormulaOutcome::from(try_evaluate_formula(formula, values));
    if let FormulaOutcome::SoftFailed(e) = &outcome {
        tracing::debug!(formula, error = %e, "formula evaluation failed, using 0");
    }
    outcome
}

/// Evaluate a formula for display. Never fails: malformed formulas give `0.0`.
///
/// # Example
/// ```rust
/// use branch_report_formula::evaluate_formula;
/// use std::collections::HashMap;
///
/// let mut values = HashMap::new();
/// values.insert("A".to_string(), 5.0);
/// assert_eq!(evaluate_formula("A + B", &values), 5.0);
/// assert_eq!(evaluate_formula("A / B", &values), 0.0);
/// assert_eq!(evaluate_formula("", &values), 0.0);
/// ```
pub fn evaluate_formula<V>(formula: &str, values: &V) -> f64
where
    V: Variables + ?Sized,
{
    evaluate_formula_outcome(formula, values).value()
}
