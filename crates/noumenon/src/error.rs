//! Error types for the language processor.
//!
//! The parser is the only fallible stage: lexical problems surface as
//! `UNKNOWN`/`EOF` tokens and turn into parse errors at the next `eat`, and
//! runtime type mismatches degrade to Null instead of failing (diagnostics
//! for undefined variables go to the stderr channel of the active
//! [`PrintWriter`](crate::PrintWriter)).

use std::fmt;

/// A parse failure with its source position.
///
/// Rendered as `"<row>:<col>: <message>"`, which the command-line driver
/// prefixes with `driver: `.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    row: u32,
    col: u32,
    message: String,
}

impl ParseError {
    pub(crate) fn new(row: u32, col: u32, message: impl Into<String>) -> Self {
        Self {
            row,
            col,
            message: message.into(),
        }
    }

    /// Row of the cursor when the error was raised, starting at 1.
    #[must_use]
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Column of the cursor when the error was raised.
    #[must_use]
    pub fn col(&self) -> u32 {
        self.col
    }

    /// The message without the position prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.row, self.col, self.message)
    }
}

impl std::error::Error for ParseError {}
