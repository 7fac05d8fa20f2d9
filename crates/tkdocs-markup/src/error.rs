use std::fmt;

use thiserror::Error;

/// A 1-based position in `.tkd` source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePos {
    pub line: usize,
    pub col: usize,
}

impl SourcePos {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl Default for SourcePos {
    fn default() -> Self {
        Self { line: 1, col: 1 }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Malformed token or inconsistent indentation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tkd lex error at {line}:{col}: {message}")]
pub struct LexError {
    pub message: String,
    /// 1-based source line number where the error occurred.
    pub line: usize,
    /// 1-based source column number where the error occurred.
    pub col: usize,
}

impl LexError {
    pub(crate) fn new(msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self { message: msg.into(), line, col }
    }

    pub fn pos(&self) -> SourcePos {
        SourcePos::new(self.line, self.col)
    }
}

/// Grammar violation in an otherwise well-formed token stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tkd parse error at {line}:{col}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl ParseError {
    pub(crate) fn new(msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self { message: msg.into(), line, col }
    }

    pub fn pos(&self) -> SourcePos {
        SourcePos::new(self.line, self.col)
    }
}

/// Anything that can go wrong turning source text into a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    pub fn pos(&self) -> SourcePos {
        match self {
            SyntaxError::Lex(e) => e.pos(),
            SyntaxError::Parse(e) => e.pos(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SyntaxError::Lex(e) => &e.message,
            SyntaxError::Parse(e) => &e.message,
        }
    }
}
