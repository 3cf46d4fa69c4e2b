//! Stylesheet syntax errors.

use pigment_carton::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::Position;

/// Syntax error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ErrorCode {
    UnclosedBlock,
    UnexpectedCloseBrace,
    UnclosedString,
    UnclosedComment,
    UnclosedBracket,
    UnknownWord,
}

impl ErrorCode {
    pub const fn message(self) -> &'static str {
        match self {
            Self::UnclosedBlock => "Unclosed block",
            Self::UnexpectedCloseBrace => "Unexpected }",
            Self::UnclosedString => "Unclosed string",
            Self::UnclosedComment => "Unclosed comment",
            Self::UnclosedBracket => "Unclosed bracket",
            Self::UnknownWord => "Unknown word",
        }
    }
}

/// Error raised while parsing stylesheet source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{}{} at {}:{}",
    .code.message(),
    detail_suffix(.detail),
    .position.line,
    .position.column
)]
pub struct ParseError {
    pub code: ErrorCode,
    pub position: Position,
    /// Offending text, when it helps
    pub detail: Option<CompactString>,
}

impl ParseError {
    pub fn new(code: ErrorCode, position: Position) -> Self {
        Self {
            code,
            position,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<CompactString>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

fn detail_suffix(detail: &Option<CompactString>) -> String {
    match detail {
        Some(detail) => format!(" `{detail}`"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParseError::new(ErrorCode::UnclosedBlock, Position::new(4, 1, 5));
        assert_eq!(err.to_string(), "Unclosed block at 1:5");

        let err = ParseError::new(ErrorCode::UnknownWord, Position::new(0, 2, 3)).with_detail("red");
        assert_eq!(err.to_string(), "Unknown word `red` at 2:3");
    }
}
