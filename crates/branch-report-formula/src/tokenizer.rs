//! Formula tokenizer
//!
//! Splits formula text into [`Token`]s with a single regex scan. Anything
//! the pattern does not match (whitespace, `%`, `^`, stray punctuation) is
//! skipped, so tokenizing never fails.

use crate::token::{Token, TokenKind};
use lazy_regex::regex;

/// Tokenize a formula string
///
/// # Example
/// ```rust
/// use branch_report_formula::{tokenize, TokenKind};
///
/// let tokens = tokenize("(A - B) / A");
/// assert_eq!(tokens.len(), 7);
/// assert_eq!(tokens[0].kind, TokenKind::LeftParen);
/// assert_eq!(tokens[1].text, "A");
/// ```
pub fn tokenize(formula: &str) -> Vec<Token> {
    // Alternation order gives literals priority over operators, parentheses
    // and identifiers. ASCII classes only: `\d` would admit non-ASCII digits
    // that `f64::from_str` rejects.
    let pattern = regex!(r"[0-9]+(?:\.[0-9]*)?|[-+*/]|[()]|[A-Za-z_][A-Za-z0-9_]*");

    pattern
        .find_iter(formula)
        .map(|m| Token::new(classify(m.as_str()), m.as_str()))
        .collect()
}

fn classify(text: &str) -> TokenKind {
    match text.as_bytes().first() {
        Some(b'0'..=b'9') => TokenKind::Number,
        Some(b'+' | b'-' | b'*' | b'/') => TokenKind::Operator,
        Some(b'(') => TokenKind::LeftParen,
        Some(b')') => TokenKind::RightParen,
        _ => TokenKind::Variable,
    }
}
