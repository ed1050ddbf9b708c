//! Infix to postfix conversion
//!
//! Variables are resolved to numbers first, then the token stream is
//! reordered with the shunting-yard algorithm.

use crate::error::{FormulaError, FormulaResult};
use crate::token::{Operator, Token, TokenKind};
use crate::variables::Variables;
use std::fmt;

/// An element of a postfix (reverse Polish) expression
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostfixItem {
    Number(f64),
    Operator(Operator),
}

impl fmt::Display for PostfixItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostfixItem::Number(n) => write!(f, "{}", n),
            PostfixItem::Operator(op) => write!(f, "{}", op),
        }
    }
}

/// Token after variable resolution
#[derive(Debug, Clone, Copy, PartialEq)]
enum Resolved {
    Number(f64),
    Operator(Operator),
    LeftParen,
    RightParen,
}

/// Operator stack entry; `(` remembers its token index for error reporting
#[derive(Debug, Clone, Copy)]
enum Pending {
    Operator(Operator),
    LeftParen(usize),
}

/// Convert infix tokens to postfix, resolving variables from `values`.
///
/// Variables missing from `values` resolve to `0.0`. Parentheses must
/// balance; anything else about operand placement is left to the
/// evaluator.
pub fn to_postfix<V>(tokens: &[Token], values: &V) -> FormulaResult<Vec<PostfixItem>>
where
    V: Variables + ?Sized,
{
    let resolved = tokens
        .iter()
        .map(|token| resolve(token, values))
        .collect::<FormulaResult<Vec<_>>>()?;

    let mut output = Vec::with_capacity(resolved.len());
    let mut stack: Vec<Pending> = Vec::new();

    for (position, item) in resolved.into_iter().enumerate() {
        match item {
            Resolved::Number(n) => output.push(PostfixItem::Number(n)),
            Resolved::Operator(op) => {
                while let Some(&Pending::Operator(top)) = stack.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    output.push(PostfixItem::Operator(top));
                    stack.pop();
                }
                stack.push(Pending::Operator(op));
            }
            Resolved::LeftParen => stack.push(Pending::LeftParen(position)),
            Resolved::RightParen => loop {
                match stack.pop() {
                    Some(Pending::Operator(op)) => output.push(PostfixItem::Operator(op)),
                    Some(Pending::LeftParen(_)) => break,
                    None => return Err(FormulaError::UnbalancedParenthesis { position }),
                }
            },
        }
    }

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Operator(op) => output.push(PostfixItem::Operator(op)),
            Pending::LeftParen(position) => {
                return Err(FormulaError::UnbalancedParenthesis { position })
            }
        }
    }

    Ok(output)
}

fn resolve<V>(token: &Token, values: &V) -> FormulaResult<Resolved>
where
    V: Variables + ?Sized,
{
    Ok(match token.kind {
        TokenKind::Number => Resolved::Number(
            token
                .text
                .parse()
                .map_err(|_| FormulaError::InvalidToken(token.text.clone()))?,
        ),
        TokenKind::Variable => Resolved::Number(values.get_value(&token.text).unwrap_or(0.0)),
        TokenKind::Operator => Resolved::Operator(
            token
                .operator()
                .ok_or_else(|| FormulaError::InvalidToken(token.text.clone()))?,
        ),
        TokenKind::LeftParen => Resolved::LeftParen,
        TokenKind::RightParen => Resolved::RightParen,
    })
}
