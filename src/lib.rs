//! # Optoifocad
//!
//! Front end for Optocad optical-setup scripts.
//!
//! This library provides:
//! - A line-oriented lexer with tab-aware source columns
//! - A packrat parser with support for left recursive rules
//! - A typed syntax tree of commands, actions and arithmetic expressions
//! - Compiler-style syntax errors located at the offending token
//!
//! ## Architecture
//!
//! - [`optocad::lexer`] - Pull-based tokenizer over any `BufRead`
//! - [`optocad::memo`] - Memo table and seed-growing for packrat parsing
//! - [`optocad::parser`] - The Optocad grammar
//! - [`optocad::ast`] - Syntax tree types
//! - [`error`] - Error types
//!
//! ## Usage
//!
//! ```
//! let script = optoifocad::parse("m1 1, 2, r=3**2\n+ 4\n").unwrap();
//! assert_eq!(script.len(), 1);
//! assert_eq!(script.commands[0].secondary_surfaces.len(), 1);
//! ```
//!
//! ## Parsing Method
//!
//! The parser memoizes every production per token position, so backtracking
//! never re-parses the same input twice. Left recursive productions such as
//! `expr -> expr '+' expr1` are grown from a seed: the first round fails the
//! recursive call and takes a non-recursive alternative, then each further
//! round reuses the previous result until the match stops getting longer.

pub mod error;
pub mod optocad;

// Re-export main types for convenience
pub use error::{OptocadError, Result, SyntaxError};
pub use optocad::{Command, Parser, Script};

/// Parse an in-memory Optocad script.
pub fn parse(text: &str) -> Result<Script> {
    optocad::parse_str("<string>", text)
}
