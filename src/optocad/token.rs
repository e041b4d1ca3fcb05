//! Tokens produced by the Optocad lexer.

use std::fmt;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's raw text (empty for synthetic tokens)
    pub text: String,
    /// The token's value
    pub literal: Literal,
    /// Line number (1-indexed)
    pub line: usize,
    /// First column (1-indexed, tab compensated)
    pub start_column: usize,
    /// One past the last column
    pub stop_column: usize,
}

impl Token {
    /// Create a token whose value is its own text.
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        line: usize,
        start_column: usize,
        stop_column: usize,
    ) -> Self {
        let text = text.into();
        Self {
            kind,
            literal: Literal::Text(text.clone()),
            text,
            line,
            start_column,
            stop_column,
        }
    }

    /// Create a zero-width token with no text, such as the implicit NEWLINE.
    pub fn synthetic(kind: TokenKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: String::new(),
            literal: Literal::None,
            line,
            start_column: column,
            stop_column: column,
        }
    }

    /// Replace the token's value.
    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = literal;
        self
    }

    /// The numeric value of a NUMBER token.
    pub fn number(&self) -> Option<Number> {
        match self.literal {
            Literal::Number(n) => Some(n),
            _ => None,
        }
    }
}

/// Token types in the Optocad language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Line terminator
    Newline,
    /// `#` comment to end of line
    Comment,
    /// Integer or floating point literal
    Number,
    /// Quoted string literal
    String,
    /// Identifier
    Name,
    /// `,`
    Comma,
    /// `=`
    Equals,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Times,
    /// `/`
    Divide,
    /// `//`
    FloorDivide,
    /// `**`
    Power,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// End of input
    EndMarker,
    /// Unlexable input
    Error,
}

impl TokenKind {
    /// Punctuation, longest spelling first so `**` wins over `*`.
    pub const PUNCTUATION: [(&'static str, TokenKind); 14] = [
        ("**", TokenKind::Power),
        ("//", TokenKind::FloorDivide),
        (",", TokenKind::Comma),
        ("=", TokenKind::Equals),
        ("+", TokenKind::Plus),
        ("-", TokenKind::Minus),
        ("*", TokenKind::Times),
        ("/", TokenKind::Divide),
        ("(", TokenKind::LParen),
        (")", TokenKind::RParen),
        ("[", TokenKind::LBracket),
        ("]", TokenKind::RBracket),
        ("{", TokenKind::LBrace),
        ("}", TokenKind::RBrace),
    ];

    /// The grammar name of this kind, as used in parse traces.
    pub fn name(self) -> &'static str {
        match self {
            Self::Newline => "NEWLINE",
            Self::Comment => "COMMENT",
            Self::Number => "NUMBER",
            Self::String => "STRING",
            Self::Name => "NAME",
            Self::Comma => "COMMA",
            Self::Equals => "EQUALS",
            Self::Plus => "PLUS",
            Self::Minus => "MINUS",
            Self::Times => "TIMES",
            Self::Divide => "DIVIDE",
            Self::FloorDivide => "FLOORDIVIDE",
            Self::Power => "POWER",
            Self::LParen => "LPAREN",
            Self::RParen => "RPAREN",
            Self::LBracket => "LBRACKET",
            Self::RBracket => "RBRACKET",
            Self::LBrace => "LBRACE",
            Self::RBrace => "RBRACE",
            Self::EndMarker => "ENDMARKER",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The value carried by a token.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// No value (synthetic tokens)
    None,
    /// Textual value: the raw text, or a string's unquoted contents
    Text(String),
    /// Numeric value of a NUMBER token
    Number(Number),
}

/// A numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Decimal integer
    Integer(i64),
    /// Floating point, including `inf`
    Float(f64),
}

impl Number {
    /// Whether this is an integer literal.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Integer(_))
    }

    /// The value as a float.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Integer(i) => i as f64,
            Self::Float(x) => x,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) if x.is_infinite() => f.write_str(if *x > 0.0 { "inf" } else { "-inf" }),
            Self::Float(x) if x.fract() == 0.0 => write!(f, "{:.1}", x),
            Self::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_display() {
        assert_eq!(Number::Integer(12).to_string(), "12");
        assert_eq!(Number::Float(2.0).to_string(), "2.0");
        assert_eq!(Number::Float(0.25).to_string(), "0.25");
        assert_eq!(Number::Float(f64::INFINITY).to_string(), "inf");
    }

    #[test]
    fn test_punctuation_longest_first() {
        let power = TokenKind::PUNCTUATION
            .iter()
            .position(|(p, _)| *p == "**")
            .unwrap();
        let times = TokenKind::PUNCTUATION
            .iter()
            .position(|(p, _)| *p == "*")
            .unwrap();
        assert!(power < times);
    }

    #[test]
    fn test_synthetic_token_is_zero_width() {
        let tok = Token::synthetic(TokenKind::Newline, 2, 7);
        assert_eq!(tok.start_column, tok.stop_column);
        assert_eq!(tok.literal, Literal::None);
        assert!(tok.text.is_empty());
    }
}
