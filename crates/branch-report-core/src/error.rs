//! Error types for branch-report-core

use crate::entry::EntryStatus;
use branch_report_formula::FormulaError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing templates or entries
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Field label is missing or blank
    #[error("Label is required")]
    LabelRequired,

    /// Child fields must carry a key
    #[error("Key is required for child fields")]
    KeyRequired,

    /// Key does not match the identifier grammar
    #[error("Invalid field key: {0}")]
    InvalidKey(String),

    /// Another field in the template already uses this key
    #[error("Field key already exists: {0}")]
    DuplicateKey(String),

    /// Field id not present in the template
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Parent id does not refer to a section of the template
    #[error("Invalid parent field: {0}")]
    InvalidParent(String),

    /// Sections group other fields and cannot be computed
    #[error("Section fields cannot have a formula")]
    SectionFormula,

    /// Another field's formula still reads this key
    #[error("Field key {key} is used in the formula of {field}")]
    KeyReferenced { key: String, field: String },

    /// Field still has child fields
    #[error("Cannot delete field with child fields. Delete children first.")]
    HasChildren,

    /// Formula rejected by the formula engine
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// Raw input could not be read as a number
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Entry is locked and cannot be edited
    #[error("Entry is locked")]
    Locked,

    /// Non-formula fields without a value block submission
    #[error("Missing required values: {}", .0.join(", "))]
    MissingValues(Vec<String>),

    /// Status change not allowed from the current status
    #[error("Cannot {action} entry in status {status}")]
    InvalidTransition {
        action: &'static str,
        status: EntryStatus,
    },
}
