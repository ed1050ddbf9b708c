//! # branch-report-formula
//!
//! Formula engine for computed report fields.
//!
//! This crate provides:
//! - Tokenizing formula text (`"(A - B) / A"` → tokens)
//! - Infix to postfix conversion with variable resolution
//! - Postfix evaluation with safe division
//! - Validation that a formula only references known field keys
//! - Dependency ordering of formulas that read other formulas
//!
//! The engine is stateless. Every call takes the formula and a fresh
//! variable table, and nothing is cached between calls.
//!
//! ## Example
//!
//! ```rust
//! use branch_report_formula::{evaluate_formula, validate_formula_variables};
//! use std::collections::HashMap;
//!
//! let values: HashMap<String, f64> =
//!     [("A".to_string(), 1000.0), ("B".to_string(), 600.0)].into_iter().collect();
//!
//! assert_eq!(evaluate_formula("A - B", &values), 400.0);
//! assert!(validate_formula_variables("A - B", &["A", "B"]).is_ok());
//! ```

pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod postfix;
pub mod token;
pub mod tokenizer;
pub mod validator;
pub mod variables;

pub use dependency::{DependencyGraph, EvaluationOrder};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{
    evaluate_formula, evaluate_formula_outcome, evaluate_postfix, try_evaluate_formula,
    FormulaOutcome,
};
pub use postfix::{to_postfix, PostfixItem};
pub use token::{Operator, Token, TokenKind};
pub use tokenizer::tokenize;
pub use validator::{referenced_variables, validate_formula_variables, FormulaValidation};
pub use variables::{KeySet, Variables};
