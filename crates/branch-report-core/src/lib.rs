//! # branch-report-core
//!
//! Core data structures for branch reporting.
//!
//! This crate provides the types the formula engine is fed from:
//! - [`ReportTemplate`] and [`TemplateField`] - numeric report definitions
//! - [`Entry`] - one branch's values for a period, with its submission status
//! - [`calculate_field`] - the displayed value of a field, computed or stored
//!
//! ## Example
//!
//! ```rust
//! use branch_report_core::{calculate_field, Entry, ReportTemplate};
//!
//! let template = ReportTemplate::monthly_report();
//! let mut entry = Entry::new("entry-1", "branch-1");
//! entry.set_value("revenue", 1000.0).unwrap();
//! entry.set_value("expenses", 600.0).unwrap();
//!
//! let margin = template.field_by_key("D").unwrap();
//! assert_eq!(calculate_field(&template, &entry, margin), 0.4);
//! ```

pub mod calculate;
pub mod entry;
pub mod error;
pub mod field;
pub mod template;

// Re-exports for convenience
pub use calculate::{calculate_field, calculate_field_outcome, key_values};
pub use entry::{parse_input, Entry, EntryStatus};
pub use error::{Error, Result};
pub use field::{normalize_key, NewField, TemplateField};
pub use template::{ReportTemplate, Section};
