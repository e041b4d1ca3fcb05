//! Error types for the Optocad front end.
//!
//! Every fatal condition met while reading, lexing or parsing a script is
//! reported as an [`OptocadError`]. Lexical and grammatical problems carry a
//! [`SyntaxError`] pointing at the exact source span.

use std::fmt::Write as _;

use thiserror::Error;

/// Result type alias using [`OptocadError`].
pub type Result<T> = std::result::Result<T, OptocadError>;

/// Unified error type for all Optocad operations.
#[derive(Error, Debug)]
pub enum OptocadError {
    // ============ Script Errors ============
    /// Lexical or grammatical error in the script
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    // ============ I/O Errors ============
    /// Error reading a line from the script source
    #[error("Failed to read line {line} of '{filename}': {source}")]
    ReadError {
        filename: String,
        line: usize,
        #[source]
        source: std::io::Error,
    },

    /// Error opening a script file
    #[error("Failed to read script file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl OptocadError {
    /// The syntax error, if this is one.
    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            Self::Syntax(err) => Some(err),
            _ => None,
        }
    }
}

/// A located error in Optocad source, in the style of compiler diagnostics.
///
/// Columns are 1-based and tab compensated, with `end_column` one past the
/// last offending column.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{filename}:{line}:{start_column}: {message}")]
pub struct SyntaxError {
    /// Human readable description
    pub message: String,
    /// Name of the script source
    pub filename: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// First offending column (1-indexed)
    pub start_column: usize,
    /// One past the last offending column
    pub end_column: usize,
    /// The offending text
    pub text: String,
    /// The source line, tabs expanded, if it was available
    pub context: Option<String>,
}

impl SyntaxError {
    /// Create a syntax error without source context.
    pub fn new(
        message: impl Into<String>,
        filename: impl Into<String>,
        line: usize,
        start_column: usize,
        end_column: usize,
        text: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            filename: filename.into(),
            line,
            start_column,
            end_column,
            text: text.into(),
            context: None,
        }
    }

    /// Attach the source line the error points into.
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    /// Render the error for a console, with a caret under the offending span.
    ///
    /// ```text
    /// script.opt:1:5: missing value
    ///     m1 x=
    ///         ^
    /// ```
    pub fn render(&self) -> String {
        let mut out = self.to_string();
        if let Some(context) = &self.context {
            let indent = self.start_column.saturating_sub(1);
            let width = self.end_column.saturating_sub(self.start_column).max(1);
            // Writing into a String cannot fail.
            let _ = write!(
                out,
                "\n    {}\n    {}{}",
                context,
                " ".repeat(indent),
                "^".repeat(width)
            );
        }
        out
    }
}
