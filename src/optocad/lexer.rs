//! Lexer (tokenizer) for Optocad scripts.
//!
//! The lexer is pull based: it reads one source line at a time and hands
//! out tokens on request, so the parser never forces more input to be read
//! than it needs.

use std::collections::VecDeque;
use std::io::BufRead;

use super::token::{Literal, Number, Token, TokenKind};
use crate::error::{OptocadError, Result, SyntaxError};

/// Display width of a tab when computing columns.
pub const DEFAULT_TAB_SIZE: usize = 4;

/// Configuration for the [`Lexer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerConfig {
    /// Number of columns a tab occupies, at least 1
    tab_size: usize,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            tab_size: DEFAULT_TAB_SIZE,
        }
    }
}

impl LexerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display width of a tab.
    pub fn with_tab_size(mut self, tab_size: usize) -> Self {
        self.tab_size = tab_size.max(1);
        self
    }

    /// Number of columns a tab occupies.
    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    /// Columns a tab adds beyond the one character it is.
    fn tab_padding(&self) -> usize {
        self.tab_size.saturating_sub(1)
    }
}

/// Lexer for tokenizing Optocad input.
pub struct Lexer<R> {
    reader: R,
    filename: String,
    config: LexerConfig,
    /// Raw lines read so far, kept for error context
    lines: Vec<String>,
    /// Lines split off a read that held carriage-return line breaks
    pending: VecDeque<String>,
    /// Characters of the line being scanned
    current: Vec<char>,
    index: usize,
    /// Extra columns taken up by tabs seen so far on this line
    tab_offset: usize,
    line: usize,
    nesting: Vec<Token>,
    last_line_terminated: bool,
    implicit_newline_done: bool,
    end_marker: Option<Token>,
    exhausted: bool,
}

impl<'a> Lexer<&'a [u8]> {
    /// Create a lexer over an in-memory script.
    pub fn from_text(filename: impl Into<String>, text: &'a str) -> Self {
        Lexer::new(text.as_bytes(), filename, LexerConfig::default())
    }
}

impl<R: BufRead> Lexer<R> {
    /// Create a new lexer reading lines from `reader`.
    ///
    /// `filename` names the source in every error message.
    pub fn new(reader: R, filename: impl Into<String>, config: LexerConfig) -> Self {
        Self {
            reader,
            filename: filename.into(),
            config,
            lines: Vec::new(),
            pending: VecDeque::new(),
            current: Vec::new(),
            index: 0,
            tab_offset: 0,
            line: 1,
            nesting: Vec::new(),
            last_line_terminated: false,
            implicit_newline_done: false,
            end_marker: None,
            exhausted: false,
        }
    }

    /// Name of the source being lexed.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Raw lines read so far, including their terminators.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The given 1-indexed source line, terminator stripped and tabs expanded.
    pub fn source_line(&self, line: usize) -> Option<String> {
        let raw = self.lines.get(line.checked_sub(1)?)?;
        let raw = raw.trim_end_matches(['\r', '\n']);
        Some(raw.replace('\t', &" ".repeat(self.config.tab_padding() + 1)))
    }

    /// Build a located error pointing at `token`.
    pub fn error_at(&self, message: impl Into<String>, token: &Token) -> SyntaxError {
        SyntaxError::new(
            message,
            self.filename.clone(),
            token.line,
            token.start_column,
            token.stop_column,
            token.text.clone(),
        )
        .with_context(self.source_line(token.line))
    }

    /// Get the next token.
    ///
    /// Once the ENDMARKER has been produced it is returned on every call.
    pub fn next_token(&mut self) -> Result<Token> {
        if let Some(end) = &self.end_marker {
            return Ok(end.clone());
        }

        loop {
            if self.index < self.current.len() {
                match self.current[self.index] {
                    ' ' => self.index += 1,
                    '\t' => {
                        self.index += 1;
                        self.tab_offset += self.config.tab_padding();
                    }
                    _ => return self.scan_token(),
                }
                continue;
            }

            if !self.read_line()? {
                return self.finish();
            }
        }
    }

    fn read_line(&mut self) -> Result<bool> {
        if self.pending.is_empty() {
            let mut buf = String::new();
            let read = self
                .reader
                .read_line(&mut buf)
                .map_err(|source| OptocadError::ReadError {
                    filename: self.filename.clone(),
                    line: self.lines.len() + 1,
                    source,
                })?;

            // Only the end of input yields an empty read; blank lines are "\n".
            if read == 0 {
                return Ok(false);
            }
            self.pending.extend(split_lines(buf));
        }

        let Some(buf) = self.pending.pop_front() else {
            return Ok(false);
        };

        self.last_line_terminated = buf.ends_with(['\n', '\r']);
        self.current = buf.chars().collect();
        self.lines.push(buf);
        self.index = 0;
        self.tab_offset = 0;
        Ok(true)
    }

    fn finish(&mut self) -> Result<Token> {
        if let Some(opener) = self.nesting.first() {
            let err = self.error_at(format!("unclosed '{}'", opener.text), opener);
            return Err(err.into());
        }

        // Every logical line ends in NEWLINE, including an unterminated last one.
        if !self.last_line_terminated && !self.implicit_newline_done {
            self.implicit_newline_done = true;
            let token = Token::synthetic(
                TokenKind::Newline,
                self.line,
                self.index + self.tab_offset + 1,
            );
            self.line += 1;
            self.current.clear();
            self.index = 0;
            self.tab_offset = 0;
            return Ok(token);
        }

        let token = Token::synthetic(TokenKind::EndMarker, self.line, 1);
        self.end_marker = Some(token.clone());
        Ok(token)
    }

    fn scan_token(&mut self) -> Result<Token> {
        let start = self.index;
        let Some((kind, end)) = self.match_rule(start) else {
            return Err(self.illegal_character(start).into());
        };

        let text: String = self.current[start..end].iter().collect();
        let start_column = start + self.tab_offset + 1;
        let tabs = text.chars().filter(|&c| c == '\t').count();
        self.tab_offset += self.config.tab_padding() * tabs;
        let stop_column = end + self.tab_offset + 1;

        let token = Token::new(kind, text, self.line, start_column, stop_column);
        let token = match kind {
            TokenKind::Number => match parse_number(&token.text) {
                Some(n) => token.with_literal(Literal::Number(n)),
                None => return Err(self.error_at("invalid number literal", &token).into()),
            },
            TokenKind::String => {
                let contents = unquote(&token.text);
                token.with_literal(Literal::Text(contents))
            }
            _ => token,
        };

        self.on_token(&token)?;
        self.index = end;
        Ok(token)
    }

    /// Match the token rules in precedence order, returning the kind and end index.
    fn match_rule(&self, start: usize) -> Option<(TokenKind, usize)> {
        let chars = &self.current;

        if let Some(end) = scan_newline(chars, start) {
            return Some((TokenKind::Newline, end));
        }
        if chars[start] == '#' {
            let end = chars[start..]
                .iter()
                .position(|&c| c == '\n' || c == '\r')
                .map_or(chars.len(), |p| start + p);
            return Some((TokenKind::Comment, end));
        }
        // NUMBER goes before NAME so that "inf" is a number.
        if let Some(end) = scan_number(chars, start) {
            return Some((TokenKind::Number, end));
        }
        if let Some(end) = scan_string(chars, start) {
            return Some((TokenKind::String, end));
        }
        if is_name_start(chars[start]) {
            let end = scan_while(chars, start + 1, is_name_char);
            return Some((TokenKind::Name, end));
        }
        TokenKind::PUNCTUATION.iter().find_map(|(text, kind)| {
            let len = text.chars().count();
            let matches = chars.len() >= start + len
                && text.chars().zip(&chars[start..]).all(|(a, &b)| a == b);
            matches.then_some((*kind, start + len))
        })
    }

    fn on_token(&mut self, token: &Token) -> Result<()> {
        match token.kind {
            TokenKind::Newline => self.line += 1,
            TokenKind::LBracket | TokenKind::LParen => self.nesting.push(token.clone()),
            TokenKind::RBracket => self.close(token, TokenKind::LBracket)?,
            TokenKind::RParen => self.close(token, TokenKind::LParen)?,
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, closer: &Token, opener: TokenKind) -> Result<()> {
        match self.nesting.pop() {
            Some(open) if open.kind == opener => Ok(()),
            _ => Err(self
                .error_at(format!("extraneous '{}'", closer.text), closer)
                .into()),
        }
    }

    fn illegal_character(&self, start: usize) -> SyntaxError {
        let rest: String = self.current[start..]
            .iter()
            .take_while(|&&c| c != '\n' && c != '\r')
            .collect();
        let tabs = rest.chars().filter(|&c| c == '\t').count();
        let start_column = start + self.tab_offset + 1;
        let stop_column =
            start_column + rest.chars().count() + self.config.tab_padding() * tabs;
        let token = Token::new(TokenKind::Error, rest, self.line, start_column, stop_column);
        let ch = self.current[start];
        self.error_at(format!("illegal character '{}'", ch.escape_debug()), &token)
    }
}

impl<R: BufRead> Iterator for Lexer<R> {
    type Item = Result<Token>;

    /// Yields tokens up to and including ENDMARKER, or up to the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let result = self.next_token();
        self.exhausted = match &result {
            Ok(token) => token.kind == TokenKind::EndMarker,
            Err(_) => true,
        };
        Some(result)
    }
}

/// Tokenize a whole in-memory script.
pub fn tokenize(filename: &str, text: &str) -> Result<Vec<Token>> {
    Lexer::from_text(filename, text).collect()
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn scan_while(chars: &[char], from: usize, pred: impl Fn(char) -> bool) -> usize {
    chars[from.min(chars.len())..]
        .iter()
        .position(|&c| !pred(c))
        .map_or(chars.len(), |p| from + p)
}

fn scan_newline(chars: &[char], start: usize) -> Option<usize> {
    match (chars[start], chars.get(start + 1)) {
        ('\n', _) => Some(start + 1),
        ('\r', Some('\n')) => Some(start + 2),
        ('\r', _) => Some(start + 1),
        _ => None,
    }
}

/// Split a read at carriage returns that are not followed by `\n`.
///
/// `read_line` only breaks at `\n`, so old Mac line endings arrive as one
/// buffer holding several lines.
fn split_lines(buf: String) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = buf.as_str();
    while let Some(at) = rest
        .char_indices()
        .find(|&(i, c)| c == '\r' && !rest[i + 1..].starts_with('\n'))
        .map(|(i, _)| i + 1)
    {
        if at == rest.len() {
            break;
        }
        lines.push(rest[..at].to_string());
        rest = &rest[at..];
    }
    lines.push(rest.to_string());
    lines
}

fn scan_digits(chars: &[char], from: usize) -> usize {
    scan_while(chars, from, |c| c.is_ascii_digit())
}

/// End of an exponent starting at `from`, if there is one.
fn scan_exponent(chars: &[char], from: usize) -> Option<usize> {
    if !matches!(chars.get(from), Some('e' | 'E')) {
        return None;
    }
    let mut digits = from + 1;
    if matches!(chars.get(digits), Some('+' | '-')) {
        digits += 1;
    }
    let end = scan_digits(chars, digits);
    (end > digits).then_some(end)
}

/// Match a numeric literal.
///
/// Integers starting with `0` may only contain zeros, so `01` stops after
/// the `0` and the parser sees two numbers in a row.
fn scan_number(chars: &[char], start: usize) -> Option<usize> {
    let inf: Vec<char> = "inf".chars().collect();
    if chars[start..].starts_with(&inf)
        && !chars.get(start + 3).is_some_and(|&c| is_name_char(c))
    {
        return Some(start + 3);
    }

    let int_end = scan_digits(chars, start);
    if int_end > start {
        if chars.get(int_end) == Some(&'.') {
            let end = scan_digits(chars, int_end + 1);
            return Some(scan_exponent(chars, end).unwrap_or(end));
        }
        if let Some(end) = scan_exponent(chars, int_end) {
            return Some(end);
        }
        if chars[start] == '0' {
            return Some(scan_while(chars, start, |c| c == '0'));
        }
        return Some(int_end);
    }

    if chars[start] == '.' && chars.get(start + 1).is_some_and(|c| c.is_ascii_digit()) {
        let end = scan_digits(chars, start + 1);
        return Some(scan_exponent(chars, end).unwrap_or(end));
    }

    None
}

/// Match a single or double quoted string closed on the same line.
fn scan_string(chars: &[char], start: usize) -> Option<usize> {
    let quote = chars[start];
    if quote != '"' && quote != '\'' {
        return None;
    }
    let mut i = start + 1;
    while let Some(&c) = chars.get(i) {
        match c {
            '\\' => i += 2,
            '\n' | '\r' => return None,
            c if c == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn parse_number(text: &str) -> Option<Number> {
    if text == "inf" {
        return Some(Number::Float(f64::INFINITY));
    }
    if text.contains(['.', 'e', 'E']) {
        return text.parse().ok().map(Number::Float);
    }
    text.parse().ok().map(Number::Integer)
}

/// Strip the quotes from a string literal and resolve its escapes.
fn unquote(text: &str) -> String {
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(c @ ('\\' | '\'' | '"')) => out.push(c),
            Some(c) => {
                out.push('\\');
                out.push(c);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize("<string>", text)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn lex_error(text: &str) -> SyntaxError {
        match tokenize("<string>", text) {
            Err(OptocadError::Syntax(err)) => err,
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_lexer_basic() {
        let tokens = tokenize("<string>", "m1 1,2\n").unwrap();
        let summary: Vec<_> = tokens
            .iter()
            .map(|t| (t.kind, t.text.as_str(), t.start_column, t.stop_column))
            .collect();
        assert_eq!(
            summary,
            vec![
                (TokenKind::Name, "m1", 1, 3),
                (TokenKind::Number, "1", 4, 5),
                (TokenKind::Comma, ",", 5, 6),
                (TokenKind::Number, "2", 6, 7),
                (TokenKind::Newline, "\n", 7, 8),
                (TokenKind::EndMarker, "", 1, 1),
            ]
        );
        assert_eq!(tokens[5].line, 2);
    }

    #[test]
    fn test_tab_compensation() {
        let tokens = tokenize("<string>", "\tm1\t1\n").unwrap();
        assert_eq!((tokens[0].start_column, tokens[0].stop_column), (5, 7));
        assert_eq!((tokens[1].start_column, tokens[1].stop_column), (11, 12));
    }

    #[test]
    fn test_tab_inside_comment() {
        let tokens = tokenize("<string>", "# a\tb\n").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!((tokens[0].start_column, tokens[0].stop_column), (1, 9));
        assert_eq!(tokens[1].start_column, 9);
    }

    #[test]
    fn test_custom_tab_size() {
        let config = LexerConfig::new().with_tab_size(8);
        let mut lexer = Lexer::new("\tx\n".as_bytes(), "<string>", config);
        assert_eq!(lexer.next_token().unwrap().start_column, 9);
    }

    #[test]
    fn test_implicit_newline() {
        let tokens = tokenize("<string>", "m1 1").unwrap();
        let newlines: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Newline)
            .collect();
        assert_eq!(newlines.len(), 1);
        assert_eq!(newlines[0].line, 1);
        assert_eq!(newlines[0].start_column, 5);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::EndMarker);
        assert_eq!(tokens.last().unwrap().line, 2);
    }

    #[test]
    fn test_unterminated_last_line_is_lexed_once() {
        assert_eq!(
            kinds("m1 1"),
            vec![
                TokenKind::Name,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::EndMarker
            ]
        );
        assert_eq!(
            kinds("a\n# note"),
            vec![
                TokenKind::Name,
                TokenKind::Newline,
                TokenKind::Comment,
                TokenKind::Newline,
                TokenKind::EndMarker
            ]
        );
    }

    #[test]
    fn test_carriage_return_line_breaks() {
        let tokens = tokenize("<string>", "m1 1\rm2 2\r\n\rb").unwrap();
        let summary: Vec<_> = tokens
            .iter()
            .map(|t| (t.kind, t.text.as_str(), t.line, t.start_column))
            .collect();
        assert_eq!(
            summary,
            vec![
                (TokenKind::Name, "m1", 1, 1),
                (TokenKind::Number, "1", 1, 4),
                (TokenKind::Newline, "\r", 1, 5),
                (TokenKind::Name, "m2", 2, 1),
                (TokenKind::Number, "2", 2, 4),
                (TokenKind::Newline, "\r\n", 2, 5),
                (TokenKind::Newline, "\r", 3, 1),
                (TokenKind::Name, "b", 4, 1),
                (TokenKind::Newline, "", 4, 2),
                (TokenKind::EndMarker, "", 5, 1),
            ]
        );
    }

    #[test]
    fn test_carriage_return_lines_keep_context() {
        let mut lexer = Lexer::from_text("<string>", "a\rb c\r");
        while lexer.next_token().unwrap().kind != TokenKind::EndMarker {}
        assert_eq!(lexer.lines(), &["a\r".to_string(), "b c\r".to_string()]);
        assert_eq!(lexer.source_line(2).as_deref(), Some("b c"));
    }

    #[test]
    fn test_zero_tab_size_does_not_underflow() {
        assert_eq!(LexerConfig::new().with_tab_size(0).tab_size(), 1);

        let config = LexerConfig { tab_size: 0 };
        let mut lexer = Lexer::new("\tx\n".as_bytes(), "<string>", config);
        assert_eq!(lexer.next_token().unwrap().start_column, 2);
    }

    #[test]
    fn test_no_implicit_newline_after_terminator() {
        assert_eq!(
            kinds("m1 1\n"),
            vec![
                TokenKind::Name,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::EndMarker
            ]
        );
        assert_eq!(kinds("a\r\n").len(), 3);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::Newline, TokenKind::EndMarker]);
    }

    #[test]
    fn test_line_counting() {
        let tokens = tokenize("<string>", "a\n\n# note\nb\n").unwrap();
        let b = tokens.iter().find(|t| t.text == "b").unwrap();
        assert_eq!(b.line, 4);
        assert_eq!(b.start_column, 1);
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("<string>", "1 2.5 .5 1e3 inf 3.\n").unwrap();
        let values: Vec<_> = tokens.iter().filter_map(|t| t.number()).collect();
        assert_eq!(values[0], Number::Integer(1));
        assert_relative_eq!(values[1].as_f64(), 2.5);
        assert_relative_eq!(values[2].as_f64(), 0.5);
        assert_relative_eq!(values[3].as_f64(), 1000.0);
        assert!(values[4].as_f64().is_infinite());
        assert_eq!(values[5], Number::Float(3.0));
    }

    #[test]
    fn test_leading_zero_splits_number() {
        let tokens = tokenize("<string>", "01 007\n").unwrap();
        let texts: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Number)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, vec!["0", "1", "00", "7"]);
    }

    #[test]
    fn test_run_together_float() {
        let tokens = tokenize("<string>", "0.1.1\n").unwrap();
        assert_eq!(tokens[0].text, "0.1");
        assert_eq!(tokens[1].text, ".1");
        assert_eq!(tokens[1].kind, TokenKind::Number);
    }

    #[test]
    fn test_inf_prefix_is_a_name() {
        let tokens = tokenize("<string>", "info l1.P\n").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Name);
        assert_eq!(tokens[0].text, "info");
        assert_eq!(tokens[1].kind, TokenKind::Name);
        assert_eq!(tokens[1].text, "l1.P");
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("** // * / + - = {}\n"),
            vec![
                TokenKind::Power,
                TokenKind::FloorDivide,
                TokenKind::Times,
                TokenKind::Divide,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Equals,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Newline,
                TokenKind::EndMarker,
            ]
        );
    }

    #[test]
    fn test_strings() {
        let tokens = tokenize("<string>", r#"'a\'b' "c d""#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].literal, Literal::Text("a'b".to_string()));
        assert_eq!(tokens[1].literal, Literal::Text("c d".to_string()));
    }

    #[test]
    fn test_illegal_character() {
        let err = lex_error("m1 $x\n");
        assert_eq!(err.message, "illegal character '$'");
        assert_eq!((err.line, err.start_column, err.end_column), (1, 4, 6));
        assert_eq!(err.text, "$x");
        assert_eq!(err.context.as_deref(), Some("m1 $x"));
    }

    #[test]
    fn test_unterminated_string_is_illegal() {
        let err = lex_error("m1 'abc\n");
        assert_eq!(err.message, "illegal character '\\''");
        assert_eq!(err.start_column, 4);
    }

    #[test]
    fn test_extraneous_closers() {
        let err = lex_error("m1 ]\n");
        assert_eq!(err.message, "extraneous ']'");
        assert_eq!(err.start_column, 4);

        let err = lex_error("m1 (c]\n");
        assert_eq!(err.message, "extraneous ']'");
        assert_eq!(err.start_column, 6);

        let err = lex_error("m1 (c))\n");
        assert_eq!(err.message, "extraneous ')'");
        assert_eq!(err.start_column, 7);
    }

    #[test]
    fn test_unclosed_opener_reported_at_end() {
        let mut lexer = Lexer::from_text("<string>", "m1 [c\nm2 1\n");
        let mut seen = Vec::new();
        let err = loop {
            match lexer.next_token() {
                Ok(token) => seen.push(token.kind),
                Err(err) => break err,
            }
        };
        // The whole input is consumed before the error surfaces.
        assert_eq!(seen.len(), 7);
        let err = err.as_syntax().cloned().unwrap();
        assert_eq!(err.message, "unclosed '['");
        assert_eq!((err.line, err.start_column), (1, 4));
    }

    #[test]
    fn test_braces_are_not_nesting_checked() {
        assert!(tokenize("<string>", "m1 {c\n").is_ok());
    }

    #[test]
    fn test_lines_are_retained() {
        let mut lexer = Lexer::from_text("<string>", "a\n\tb\n");
        while lexer.next_token().unwrap().kind != TokenKind::EndMarker {}
        assert_eq!(lexer.lines(), &["a\n".to_string(), "\tb\n".to_string()]);
        assert_eq!(lexer.source_line(2).as_deref(), Some("    b"));
        assert_eq!(lexer.source_line(0), None);
        assert_eq!(lexer.source_line(3), None);
    }

    #[test]
    fn test_end_marker_repeats() {
        let mut lexer = Lexer::from_text("<string>", "");
        lexer.next_token().unwrap();
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndMarker);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndMarker);
    }

    #[test]
    fn test_iterator_stops_after_end_marker() {
        let lexer = Lexer::from_text("<string>", "a\n");
        assert_eq!(lexer.count(), 3);
    }

    #[test]
    fn test_integer_overflow() {
        let err = lex_error("m1 99999999999999999999\n");
        assert_eq!(err.message, "invalid number literal");
    }
}
