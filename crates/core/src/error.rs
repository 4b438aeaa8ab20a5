use serde::Serialize;
use std::fmt;

use crate::ast::Position;

/// Which stage of parsing rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Raised by the scanner while classifying characters.
    Lexical,
    /// Raised by the tree builder while assembling directives.
    Syntax,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Lexical => f.write_str("lexical"),
            ErrorCategory::Syntax => f.write_str("syntax"),
        }
    }
}

/// The specific reason a parse failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    // Lexical
    IllegalCharacter,
    InvalidEscape,
    UnterminatedString,
    UnterminatedComment,
    InvalidLineContinuation,
    // Syntax
    UnexpectedCloseBrace,
    UnterminatedBlock,
    ExpectedDirective,
    UnexpectedToken,
    UnterminatedExpression,
    UnexpectedCloseParen,
    NestingTooDeep,
}

impl ParseErrorKind {
    pub fn category(self) -> ErrorCategory {
        match self {
            ParseErrorKind::IllegalCharacter
            | ParseErrorKind::InvalidEscape
            | ParseErrorKind::UnterminatedString
            | ParseErrorKind::UnterminatedComment
            | ParseErrorKind::InvalidLineContinuation => ErrorCategory::Lexical,
            ParseErrorKind::UnexpectedCloseBrace
            | ParseErrorKind::UnterminatedBlock
            | ParseErrorKind::ExpectedDirective
            | ParseErrorKind::UnexpectedToken
            | ParseErrorKind::UnterminatedExpression
            | ParseErrorKind::UnexpectedCloseParen
            | ParseErrorKind::NestingTooDeep => ErrorCategory::Syntax,
        }
    }
}

/// A lexical or syntax error. The first error aborts the parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, at: Position, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            line: at.line,
            column: at.column,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Serialize to the JSON shape used by tooling. Always includes the
    /// category so consumers need not know the kind table.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "category": self.category(),
            "column":   self.column,
            "kind":     self.kind,
            "line":     self.line,
            "message":  self.message,
        })
    }
}
