//! Prelude module - common imports for branch-report users
//!
//! ```rust
//! use branch_report::prelude::*;
//! ```

pub use crate::{
    // Calculation types
    CalculatedEntry,
    CalculationOptions,
    CalculationStats,
    // Main types
    Entry,
    // Extension traits
    EntryCalculationExt,
    EntryStatus,
    // Error types
    Error,
    FormulaError,
    FormulaOutcome,
    NewField,
    PeriodSummary,
    ReportTemplate,
    Result,
    TemplateField,
};

pub use crate::{evaluate_formula, summarize, validate_formula_variables};
