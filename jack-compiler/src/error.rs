//! Compiler error type
//!
//! One enum covers the whole pipeline; the variant is the error kind from
//! the user's point of view. Everything but I/O carries the source line.

use std::fmt;

#[derive(Debug)]
pub enum JackError {
    Io(std::io::Error),
    /// Malformed token: unterminated string or comment, oversized integer
    /// constant, character outside the token alphabet.
    Lexical { line: usize, message: String },
    /// Token stream does not match the grammar.
    Syntax { line: usize, message: String },
    /// Undeclared variable use or duplicate declaration.
    Semantic { line: usize, message: String },
}

impl std::error::Error for JackError {}

impl fmt::Display for JackError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Lexical { line, message } => write!(f, "lexical error (line {line}): {message}"),
            Self::Syntax { line, message } => write!(f, "syntax error (line {line}): {message}"),
            Self::Semantic { line, message } => {
                write!(f, "semantic error (line {line}): {message}")
            }
        }
    }
}

impl From<std::io::Error> for JackError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}
