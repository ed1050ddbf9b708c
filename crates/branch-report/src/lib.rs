//! # branch-report
//!
//! Numeric report templates for branch data collection.
//!
//! An admin defines a template of fields, some of which are computed from
//! the others by formula (`profit = A - B`). Branch users fill in the
//! remaining values, and the formula fields are recalculated for display.
//!
//! ## Features
//!
//! - Template authoring with formula validation against the template's keys
//! - Entry lifecycle: draft, submitted, locked
//! - Entry calculation with soft-failing formulas (a broken formula shows 0)
//! - Period summaries across branches
//!
//! ## Example
//!
//! ```rust
//! use branch_report::prelude::*;
//!
//! let mut template = ReportTemplate::new("t1", "Weekly Sales");
//! template.add_field(NewField::value("Gross", "gross")).unwrap();
//! template.add_field(NewField::value("Returns", "returns")).unwrap();
//! template
//!     .add_field(NewField::value("Net", "net").with_formula("gross - returns"))
//!     .unwrap();
//!
//! let mut entry = Entry::new("e1", "branch-1");
//! entry.set_value("t1-f1", 500.0).unwrap();
//! entry.set_value("t1-f2", 20.0).unwrap();
//!
//! assert_eq!(entry.calculate(&template).value("net"), Some(480.0));
//! ```

pub mod calculation;
pub mod prelude;
pub mod summary;

// Re-export calculation types
pub use calculation::{
    CalculatedEntry, CalculatedRow, CalculationOptions, CalculationStats, EntryCalculationExt,
};
pub use summary::{summarize, PeriodSummary, SummaryRow};

// Re-export core types
pub use branch_report_core::{
    calculate_field, calculate_field_outcome, key_values, normalize_key, parse_input, Entry,
    EntryStatus, Error, NewField, ReportTemplate, Result, Section, TemplateField,
};

// Re-export formula types
pub use branch_report_formula::{
    evaluate_formula, evaluate_formula_outcome, referenced_variables, tokenize,
    try_evaluate_formula, validate_formula_variables, FormulaError, FormulaOutcome,
    FormulaResult, FormulaValidation, KeySet, Token, TokenKind, Variables,
};
