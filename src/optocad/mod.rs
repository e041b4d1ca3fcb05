//! Optocad script front end.
//!
//! Optocad scripts describe optical setups as one command per line: a
//! directive followed by comma-separated positional and keyword
//! parameters. A line starting with `+` adds a secondary surface to the
//! command before it.
//!
//! # Grammar Overview
//!
//! ```text
//! start            = script_line* ENDMARKER
//! script_line      = command COMMENT? NEWLINE | COMMENT? NEWLINE
//! command          = NAME command_params | '+' command_params
//! command_params   = value_list ',' kwarg_list ','?
//!                  | value_list ','?
//!                  | kwarg_list ','?
//! value_list       = positional_value (',' positional_value)*
//! kwarg_list       = kwarg_list ','+ kwarg_list | key_value
//! positional_value = value !'='
//! value            = action | expr
//! key_value        = NAME '=' value
//! action           = action action
//!                  | '{' action '}' NUMBER?
//!                  | '[' action ']' | '(' action ')'
//!                  | NAME of the letters c d h i n r s t v
//! expr             = expr ('+' | '-') expr1 | expr1
//! expr1            = expr1 ('*' | '/' | '//') expr2 | expr2
//! expr2            = ('+' | '-') expr2 | expr3
//! expr3            = expr4 '**' expr2 | expr4
//! expr4            = '(' expr ')' | NUMBER !NUMBER | NAME | STRING
//! ```
//!
//! A trailing comma is only accepted at the end of a line.
//!
//! # Example
//!
//! ```text
//! # Folded cavity
//! m1 1, 2, r=-0.5
//! + 0.1, n=1.45
//! l1 {cr}2, f=l1.P*2
//! ```

pub mod ast;
pub mod lexer;
pub mod memo;
pub mod parser;
pub mod token;
pub mod trace;

pub use ast::*;
pub use lexer::{tokenize, Lexer, LexerConfig, DEFAULT_TAB_SIZE};
pub use parser::{Parser, Rule};
pub use token::{Literal, Number, Token, TokenKind};
pub use trace::{LogTracer, Tracer};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{OptocadError, Result};

/// Parse an in-memory script, naming it `filename` in errors.
pub fn parse_str(filename: &str, text: &str) -> Result<Script> {
    Parser::new(Lexer::from_text(filename, text)).parse()
}

/// Parse a script read line by line from `reader`.
pub fn parse_reader<R: BufRead>(filename: &str, reader: R, config: LexerConfig) -> Result<Script> {
    Parser::new(Lexer::new(reader, filename, config)).parse()
}

/// Parse a script file.
pub fn parse_file(path: &Path) -> Result<Script> {
    let file = File::open(path).map_err(|e| OptocadError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    log::debug!("parsing {}", path.display());
    parse_reader(
        &path.display().to_string(),
        BufReader::new(file),
        LexerConfig::default(),
    )
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_parse_reader_with_tab_size() {
        let config = LexerConfig::new().with_tab_size(8);
        let err = parse_reader("tabbed.opt", Cursor::new("m1\tx=\n"), config).unwrap_err();
        let err = err.as_syntax().unwrap();
        assert_eq!(err.filename, "tabbed.opt");
        assert_eq!((err.line, err.start_column), (1, 12));
    }

    #[test]
    fn test_parse_file() {
        let path = std::env::temp_dir().join(format!("optocad-{}.opt", std::process::id()));
        std::fs::write(&path, "m1 1, r=2\n+ 3\n").unwrap();
        let script = parse_file(&path);
        std::fs::remove_file(&path).unwrap();

        let script = script.unwrap();
        assert_eq!(script.len(), 1);
        assert_eq!(script.commands[0].secondary_surfaces.len(), 1);
    }

    #[test]
    fn test_parse_missing_file() {
        let err = parse_file(Path::new("/nonexistent/optocad/script.opt")).unwrap_err();
        assert!(matches!(err, OptocadError::FileReadError { .. }));
        assert!(err.to_string().contains("script.opt"));
    }

    #[test]
    fn test_display_round_trips_shape() {
        let script = parse_str("<string>", "m1 1, crv, x=3**2\n+ -y\n").unwrap();
        assert_eq!(script.to_string(), "m1 1, crv, x=3**2\n\t+ -y\n");
    }
}
