//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula validation or strict evaluation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Formula references a key that is not defined in its template
    #[error("Unknown field: {0}")]
    UnknownVariable(String),

    /// A `)` without a matching `(`, or a `(` that is never closed
    #[error("Unbalanced parenthesis at token {position}")]
    UnbalancedParenthesis { position: usize },

    /// An operator did not have two operands to work on
    #[error("Operator '{operator}' is missing an operand")]
    MissingOperand { operator: char },

    /// Operands were left over after the last operator was applied
    #[error("Expression leaves {count} unused operands")]
    DanglingOperand { count: usize },

    /// Formula reads a field whose value depends on the formula itself
    #[error("Circular reference through field {0}")]
    CircularReference(String),

    /// A token whose text does not match its kind
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}
