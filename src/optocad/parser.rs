//! Packrat parser for Optocad scripts.
//!
//! Each production is a method returning `Ok(Some(..))` on a match and
//! `Ok(None)` on a mismatch, in which case it leaves the cursor where it
//! found it. `Err` is reserved for fatal, located errors. Productions are
//! reached through [`Parser::expect_production`], which memoizes them per
//! token position and grows seeds for the left recursive ones.

use std::fmt;
use std::io::BufRead;

use super::ast::{
    BinaryOperator, Command, Expr, Kwargs, Script, SecondarySurfaceCommand, UnaryOperator, Value,
};
use super::lexer::Lexer;
use super::memo::{self, MemoTable, Packrat};
use super::token::{Literal, Number, Token, TokenKind};
use super::trace::Tracer;
use crate::error::{OptocadError, Result, SyntaxError};

/// Letters allowed in an action's motion codes.
pub const ACTION_LETTERS: &str = "cdhinrstv";

/// Grammar productions, and token matches which are memoized alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Token(TokenKind),
    ScriptLine,
    Command,
    CommandParams,
    ValueList,
    NextValue,
    KwargList,
    PositionalValue,
    Value,
    KeyValue,
    Action,
    Expr,
    Expr1,
    Expr2,
    Expr3,
    Expr4,
    InvalidExpr4,
}

impl Rule {
    /// The rule's grammar name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Token(kind) => kind.name(),
            Self::ScriptLine => "script_line",
            Self::Command => "command",
            Self::CommandParams => "command_params",
            Self::ValueList => "value_list",
            Self::NextValue => "next_value",
            Self::KwargList => "kwarg_list",
            Self::PositionalValue => "positional_value",
            Self::Value => "value",
            Self::KeyValue => "key_value",
            Self::Action => "action",
            Self::Expr => "expr",
            Self::Expr1 => "expr1",
            Self::Expr2 => "expr2",
            Self::Expr3 => "expr3",
            Self::Expr4 => "expr4",
            Self::InvalidExpr4 => "invalid_expr4",
        }
    }

    /// Whether the rule invokes itself at its own start position.
    pub fn is_left_recursive(self) -> bool {
        matches!(self, Self::KwargList | Self::Action | Self::Expr | Self::Expr1)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One script line's contribution.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// Blank or comment-only line
    Blank,
    /// A command line
    Statement(Statement),
}

/// A parsed command line, before secondary surfaces are attached.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `NAME params`
    Primary(Command),
    /// `+ params`, with the `+` token for error reporting
    Secondary {
        surface: SecondarySurfaceCommand,
        marker: Token,
    },
}

/// Result of a memoized production.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Token(Token),
    Line(Line),
    Statement(Statement),
    Params(Vec<Value>, Kwargs),
    Values(Vec<Value>),
    Value(Value),
    Kwargs(Kwargs),
    Action(String),
    Expr(Expr),
    Invalid(SyntaxError),
}

impl Node {
    fn into_token(self) -> Option<Token> {
        match self {
            Self::Token(token) => Some(token),
            _ => None,
        }
    }

    fn into_line(self) -> Option<Line> {
        match self {
            Self::Line(line) => Some(line),
            _ => None,
        }
    }

    fn into_statement(self) -> Option<Statement> {
        match self {
            Self::Statement(statement) => Some(statement),
            _ => None,
        }
    }

    fn into_params(self) -> Option<(Vec<Value>, Kwargs)> {
        match self {
            Self::Params(args, kwargs) => Some((args, kwargs)),
            _ => None,
        }
    }

    fn into_values(self) -> Option<Vec<Value>> {
        match self {
            Self::Values(values) => Some(values),
            _ => None,
        }
    }

    fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    fn into_kwargs(self) -> Option<Kwargs> {
        match self {
            Self::Kwargs(kwargs) => Some(kwargs),
            _ => None,
        }
    }

    fn into_action(self) -> Option<String> {
        match self {
            Self::Action(action) => Some(action),
            _ => None,
        }
    }

    fn into_expr(self) -> Option<Expr> {
        match self {
            Self::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    fn into_invalid(self) -> Option<SyntaxError> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

/// Packrat parser for Optocad scripts.
///
/// A parser runs once: [`Parser::parse`] consumes it along with its token
/// buffer and memo table.
pub struct Parser<R> {
    lexer: Lexer<R>,
    /// Every token pulled from the lexer; only ever grows
    tokens: Vec<Token>,
    pos: usize,
    memos: MemoTable<Rule, Node>,
    tracer: Option<Box<dyn Tracer>>,
    trace_path: Vec<&'static str>,
    /// Cache non-left-recursive productions; seed growing always caches
    plain_memo: bool,
}

impl<R: BufRead> Parser<R> {
    /// Create a new parser pulling tokens from `lexer`.
    pub fn new(lexer: Lexer<R>) -> Self {
        Self {
            lexer,
            tokens: Vec::new(),
            pos: 0,
            memos: MemoTable::new(),
            tracer: None,
            trace_path: Vec::new(),
            plain_memo: true,
        }
    }

    /// Run non-left-recursive productions without caching them.
    #[cfg(test)]
    fn without_plain_memo(mut self) -> Self {
        self.plain_memo = false;
        self
    }

    /// Narrate the descent to `tracer`.
    pub fn with_tracer(mut self, tracer: impl Tracer + 'static) -> Self {
        self.tracer = Some(Box::new(tracer));
        self
    }

    /// Parse the entire script.
    pub fn parse(mut self) -> Result<Script> {
        self.trace_attempt("start");
        let script = self.start()?;
        self.trace_outcome(script.is_some());

        match script {
            Some(script) => Ok(script),
            None => Err(self.diagnose_error()),
        }
    }

    /// Locate the generic syntax error at the furthest token read.
    ///
    /// Lexical errors in the unread rest of the input, such as an unclosed
    /// bracket, take precedence. Backtracking forgets where individual
    /// alternatives failed, so the location is only an approximation.
    fn diagnose_error(&mut self) -> OptocadError {
        let token = match self.tokens.last().cloned() {
            Some(token) => token,
            None => match self.peek_token() {
                Ok(token) => token.clone(),
                Err(err) => return err,
            },
        };

        loop {
            match self.lexer.next_token() {
                Ok(next) if next.kind == TokenKind::EndMarker => break,
                Ok(_) => {}
                Err(err) => return err,
            }
        }

        self.lexer.error_at("syntax error", &token).into()
    }

    // ============ Cursor primitives ============

    /// Current token position.
    pub fn mark(&self) -> usize {
        self.pos
    }

    /// Rewind (or advance) to a previously visited position.
    pub fn reset(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// The token at the cursor, lexing it if needed.
    pub fn peek_token(&mut self) -> Result<&Token> {
        if self.pos == self.tokens.len() {
            let token = self.lexer.next_token()?;
            self.tokens.push(token);
        }
        Ok(&self.tokens[self.pos])
    }

    /// Consume the token at the cursor.
    pub fn get_token(&mut self) -> Result<Token> {
        let token = self.peek_token()?.clone();
        self.pos += 1;
        Ok(token)
    }

    /// Whether the next token is of `kind`, without consuming it.
    pub fn positive_lookahead(&mut self, kind: TokenKind) -> Result<bool> {
        Ok(self.peek_token()?.kind == kind)
    }

    /// Whether the next token is not of `kind`, without consuming it.
    pub fn negative_lookahead(&mut self, kind: TokenKind) -> Result<bool> {
        Ok(!self.positive_lookahead(kind)?)
    }

    /// Consume a token of `kind`, or fail without consuming anything.
    pub fn expect_token(&mut self, kind: TokenKind) -> Result<Option<Token>> {
        self.expect(Rule::Token(kind), Node::into_token)
    }

    /// Apply `rule` through the memo table.
    pub fn expect_production(&mut self, rule: Rule) -> Result<Option<Node>> {
        self.trace_attempt(rule.name());
        let result = if rule.is_left_recursive() {
            memo::memoize_left_rec(self, rule, |p| p.apply(rule))
        } else if self.plain_memo {
            memo::memoize(self, rule, |p| p.apply(rule))
        } else {
            self.apply(rule)
        };

        match result {
            Ok(node) => {
                self.trace_outcome(node.is_some());
                Ok(node)
            }
            Err(err) => {
                if self.tracer.is_some() {
                    self.trace_path.pop();
                }
                Err(err)
            }
        }
    }

    fn expect<T>(&mut self, rule: Rule, unwrap: fn(Node) -> Option<T>) -> Result<Option<T>> {
        Ok(self.expect_production(rule)?.and_then(unwrap))
    }

    /// Consume a token of `kind` if there is one; never fails.
    pub fn maybe_token(&mut self, kind: TokenKind) -> Result<Option<Token>> {
        let pos = self.mark();
        if let Some(token) = self.expect_token(kind)? {
            return Ok(Some(token));
        }
        self.reset(pos);
        Ok(None)
    }

    /// Consume a comma only if it ends the line.
    fn maybe_trailing_comma(&mut self) -> Result<bool> {
        let pos = self.mark();
        if self.expect_token(TokenKind::Comma)?.is_some()
            && (self.positive_lookahead(TokenKind::Newline)?
                || self.positive_lookahead(TokenKind::Comment)?)
        {
            return Ok(true);
        }
        self.reset(pos);
        Ok(false)
    }

    /// Greedily match tokens of `kind`; fewer than `min` rewinds and fails.
    pub fn loop_token(&mut self, kind: TokenKind, min: usize) -> Result<Option<Vec<Token>>> {
        let pos = self.mark();
        let mut tokens = Vec::new();
        while let Some(token) = self.expect_token(kind)? {
            tokens.push(token);
        }
        if tokens.len() >= min {
            return Ok(Some(tokens));
        }
        self.reset(pos);
        Ok(None)
    }

    /// Greedily apply `rule`; fewer than `min` matches rewinds and fails.
    fn loop_production<T>(
        &mut self,
        rule: Rule,
        unwrap: fn(Node) -> Option<T>,
        min: usize,
    ) -> Result<Option<Vec<T>>> {
        let pos = self.mark();
        let mut nodes = Vec::new();
        loop {
            let before = self.mark();
            match self.expect(rule, unwrap)? {
                Some(node) => nodes.push(node),
                None => break,
            }
            // A match that consumes nothing would repeat forever.
            if self.mark() == before {
                break;
            }
        }
        if nodes.len() >= min {
            return Ok(Some(nodes));
        }
        self.reset(pos);
        Ok(None)
    }

    fn trace_attempt(&mut self, name: &'static str) {
        if let Some(tracer) = self.tracer.as_mut() {
            self.trace_path.push(name);
            tracer.attempt(&self.trace_path.join("->"));
        }
    }

    fn trace_outcome(&mut self, matched: bool) {
        if let Some(tracer) = self.tracer.as_mut() {
            let path = self.trace_path.join("->");
            if matched {
                tracer.success(&path, self.pos);
            } else {
                tracer.failure(&path);
            }
            self.trace_path.pop();
        }
    }

    // ============ Productions ============

    fn apply(&mut self, rule: Rule) -> Result<Option<Node>> {
        Ok(match rule {
            Rule::Token(kind) => self.token(kind)?.map(Node::Token),
            Rule::ScriptLine => self.script_line()?.map(Node::Line),
            Rule::Command => self.command()?.map(Node::Statement),
            Rule::CommandParams => self
                .command_params()?
                .map(|(args, kwargs)| Node::Params(args, kwargs)),
            Rule::ValueList => self.value_list()?.map(Node::Values),
            Rule::NextValue => self.next_value()?.map(Node::Value),
            Rule::KwargList => self.kwarg_list()?.map(Node::Kwargs),
            Rule::PositionalValue => self.positional_value()?.map(Node::Value),
            Rule::Value => self.value()?.map(Node::Value),
            Rule::KeyValue => self.key_value()?.map(Node::Kwargs),
            Rule::Action => self.action()?.map(Node::Action),
            Rule::Expr => self.expr()?.map(Node::Expr),
            Rule::Expr1 => self.expr1()?.map(Node::Expr),
            Rule::Expr2 => self.expr2()?.map(Node::Expr),
            Rule::Expr3 => self.expr3()?.map(Node::Expr),
            Rule::Expr4 => self.expr4()?.map(Node::Expr),
            Rule::InvalidExpr4 => self.invalid_expr4()?.map(Node::Invalid),
        })
    }

    fn token(&mut self, kind: TokenKind) -> Result<Option<Token>> {
        if self.peek_token()?.kind == kind {
            return self.get_token().map(Some);
        }
        Ok(None)
    }

    /// start -> script_line* ENDMARKER
    ///
    /// Secondary surfaces are attached as their lines are parsed.
    fn start(&mut self) -> Result<Option<Script>> {
        let pos = self.mark();
        let mut script = Script::new();

        while let Some(line) = self.expect(Rule::ScriptLine, Node::into_line)? {
            match line {
                Line::Blank => {}
                Line::Statement(Statement::Primary(command)) => script.push(command),
                Line::Statement(Statement::Secondary { surface, marker }) => {
                    match script.last_mut() {
                        Some(primary) => primary.secondary_surfaces.push(surface),
                        None => {
                            let err = self
                                .lexer
                                .error_at("secondary surface missing primary surface", &marker);
                            return Err(err.into());
                        }
                    }
                }
            }
        }

        if self.expect_token(TokenKind::EndMarker)?.is_some() {
            return Ok(Some(script));
        }

        self.reset(pos);
        Ok(None)
    }

    fn script_line(&mut self) -> Result<Option<Line>> {
        let pos = self.mark();

        // script_line -> command COMMENT? NEWLINE
        if let Some(statement) = self.expect(Rule::Command, Node::into_statement)? {
            self.maybe_token(TokenKind::Comment)?;
            if self.expect_token(TokenKind::Newline)?.is_some() {
                return Ok(Some(Line::Statement(statement)));
            }
        }
        self.reset(pos);

        // script_line -> COMMENT? NEWLINE
        self.maybe_token(TokenKind::Comment)?;
        if self.expect_token(TokenKind::Newline)?.is_some() {
            return Ok(Some(Line::Blank));
        }

        self.reset(pos);
        Ok(None)
    }

    fn command(&mut self) -> Result<Option<Statement>> {
        let pos = self.mark();

        // command -> NAME command_params
        if let Some(name) = self.expect_token(TokenKind::Name)? {
            if let Some((args, kwargs)) = self.expect(Rule::CommandParams, Node::into_params)? {
                return Ok(Some(Statement::Primary(Command::new(name.text, args, kwargs))));
            }
        }
        self.reset(pos);

        // command -> '+' command_params
        if let Some(marker) = self.expect_token(TokenKind::Plus)? {
            if let Some((args, kwargs)) = self.expect(Rule::CommandParams, Node::into_params)? {
                let surface = SecondarySurfaceCommand { args, kwargs };
                return Ok(Some(Statement::Secondary { surface, marker }));
            }
        }

        self.reset(pos);
        Ok(None)
    }

    fn command_params(&mut self) -> Result<Option<(Vec<Value>, Kwargs)>> {
        let pos = self.mark();

        // command_params -> value_list ',' kwarg_list ','?
        if let Some(args) = self.expect(Rule::ValueList, Node::into_values)? {
            if self.expect_token(TokenKind::Comma)?.is_some() {
                if let Some(kwargs) = self.expect(Rule::KwargList, Node::into_kwargs)? {
                    self.maybe_trailing_comma()?;
                    return Ok(Some((args, kwargs)));
                }
            }
        }
        self.reset(pos);

        // command_params -> value_list ','?
        if let Some(args) = self.expect(Rule::ValueList, Node::into_values)? {
            self.maybe_trailing_comma()?;
            return Ok(Some((args, Kwargs::new())));
        }
        self.reset(pos);

        // command_params -> kwarg_list ','?
        if let Some(kwargs) = self.expect(Rule::KwargList, Node::into_kwargs)? {
            self.maybe_trailing_comma()?;
            return Ok(Some((Vec::new(), kwargs)));
        }

        self.reset(pos);
        Ok(None)
    }

    /// value_list -> positional_value next_value*
    fn value_list(&mut self) -> Result<Option<Vec<Value>>> {
        let pos = self.mark();

        if let Some(first) = self.expect(Rule::PositionalValue, Node::into_value)? {
            if let Some(rest) = self.loop_production(Rule::NextValue, Node::into_value, 0)? {
                let mut values = Vec::with_capacity(rest.len() + 1);
                values.push(first);
                values.extend(rest);
                return Ok(Some(values));
            }
        }

        self.reset(pos);
        Ok(None)
    }

    /// next_value -> ',' positional_value
    fn next_value(&mut self) -> Result<Option<Value>> {
        let pos = self.mark();

        if self.expect_token(TokenKind::Comma)?.is_some() {
            if let Some(value) = self.expect(Rule::PositionalValue, Node::into_value)? {
                return Ok(Some(value));
            }
        }

        self.reset(pos);
        Ok(None)
    }

    fn kwarg_list(&mut self) -> Result<Option<Kwargs>> {
        let pos = self.mark();

        // kwarg_list -> kwarg_list ','+ kwarg_list
        if let Some(mut kwargs) = self.expect(Rule::KwargList, Node::into_kwargs)? {
            if self.loop_token(TokenKind::Comma, 1)?.is_some() {
                if let Some(more) = self.expect(Rule::KwargList, Node::into_kwargs)? {
                    kwargs.merge(more);
                    return Ok(Some(kwargs));
                }
            }
        }
        self.reset(pos);

        // kwarg_list -> key_value
        if let Some(kwargs) = self.expect(Rule::KeyValue, Node::into_kwargs)? {
            return Ok(Some(kwargs));
        }

        self.reset(pos);
        Ok(None)
    }

    /// A value that is not a keyword's key.
    fn positional_value(&mut self) -> Result<Option<Value>> {
        let pos = self.mark();

        if let Some(value) = self.expect(Rule::Value, Node::into_value)? {
            if self.negative_lookahead(TokenKind::Equals)? {
                return Ok(Some(value));
            }
        }

        self.reset(pos);
        Ok(None)
    }

    fn value(&mut self) -> Result<Option<Value>> {
        let pos = self.mark();

        // value -> action
        if let Some(action) = self.expect(Rule::Action, Node::into_action)? {
            return Ok(Some(Value::Action(action)));
        }
        self.reset(pos);

        // value -> expr
        if let Some(expr) = self.expect(Rule::Expr, Node::into_expr)? {
            return Ok(Some(Value::Expr(expr)));
        }

        self.reset(pos);
        Ok(None)
    }

    /// key_value -> NAME '=' value
    ///
    /// A key and `=` without a value is an error rather than a mismatch.
    fn key_value(&mut self) -> Result<Option<Kwargs>> {
        let pos = self.mark();

        if let Some(name) = self.expect_token(TokenKind::Name)? {
            if let Some(equals) = self.expect_token(TokenKind::Equals)? {
                if let Some(value) = self.expect(Rule::Value, Node::into_value)? {
                    let mut kwargs = Kwargs::new();
                    kwargs.insert(name.text, value);
                    return Ok(Some(kwargs));
                }
                return Err(self.lexer.error_at("missing value", &equals).into());
            }
        }

        self.reset(pos);
        Ok(None)
    }

    fn action(&mut self) -> Result<Option<String>> {
        let pos = self.mark();

        // action -> action action
        if let Some(first) = self.expect(Rule::Action, Node::into_action)? {
            if let Some(second) = self.expect(Rule::Action, Node::into_action)? {
                return Ok(Some(first + &second));
            }
        }
        self.reset(pos);

        // action -> '{' action '}' NUMBER?
        if self.expect_token(TokenKind::LBrace)?.is_some() {
            if let Some(inner) = self.expect(Rule::Action, Node::into_action)? {
                if self.expect_token(TokenKind::RBrace)?.is_some() {
                    let repeat = match self.maybe_token(TokenKind::Number)? {
                        None => Some(String::new()),
                        Some(token) => match token.number() {
                            Some(Number::Integer(count)) => Some(count.to_string()),
                            _ => None,
                        },
                    };
                    if let Some(repeat) = repeat {
                        return Ok(Some(format!("{{{}}}{}", inner, repeat)));
                    }
                }
            }
        }
        self.reset(pos);

        // action -> '[' action ']' | '(' action ')'
        for (open, close) in [
            (TokenKind::LBracket, TokenKind::RBracket),
            (TokenKind::LParen, TokenKind::RParen),
        ] {
            if let Some(open) = self.expect_token(open)? {
                if let Some(inner) = self.expect(Rule::Action, Node::into_action)? {
                    if let Some(close) = self.expect_token(close)? {
                        return Ok(Some(format!("{}{}{}", open.text, inner, close.text)));
                    }
                }
            }
            self.reset(pos);
        }

        // action -> motion codes
        if let Some(name) = self.expect_token(TokenKind::Name)? {
            if is_motion_code(&name.text) {
                return Ok(Some(name.text));
            }
        }

        self.reset(pos);
        Ok(None)
    }

    /// Addition and subtraction.
    fn expr(&mut self) -> Result<Option<Expr>> {
        let pos = self.mark();

        // expr -> expr ('+' | '-') expr1
        for (kind, operator) in [
            (TokenKind::Plus, BinaryOperator::Add),
            (TokenKind::Minus, BinaryOperator::Subtract),
        ] {
            if let Some(left) = self.expect(Rule::Expr, Node::into_expr)? {
                if self.expect_token(kind)?.is_some() {
                    if let Some(right) = self.expect(Rule::Expr1, Node::into_expr)? {
                        return Ok(Some(Expr::binary(operator, left, right)));
                    }
                }
            }
            self.reset(pos);
        }

        // expr -> expr1
        if let Some(expr) = self.expect(Rule::Expr1, Node::into_expr)? {
            return Ok(Some(expr));
        }

        self.reset(pos);
        Ok(None)
    }

    /// Multiplication, division and floor division.
    fn expr1(&mut self) -> Result<Option<Expr>> {
        let pos = self.mark();

        // expr1 -> expr1 ('*' | '/' | '//') expr2
        for (kind, operator) in [
            (TokenKind::Times, BinaryOperator::Multiply),
            (TokenKind::Divide, BinaryOperator::Divide),
            (TokenKind::FloorDivide, BinaryOperator::FloorDivide),
        ] {
            if let Some(left) = self.expect(Rule::Expr1, Node::into_expr)? {
                if self.expect_token(kind)?.is_some() {
                    if let Some(right) = self.expect(Rule::Expr2, Node::into_expr)? {
                        return Ok(Some(Expr::binary(operator, left, right)));
                    }
                }
            }
            self.reset(pos);
        }

        // expr1 -> expr2
        if let Some(expr) = self.expect(Rule::Expr2, Node::into_expr)? {
            return Ok(Some(expr));
        }

        self.reset(pos);
        Ok(None)
    }

    /// Unary plus and minus.
    fn expr2(&mut self) -> Result<Option<Expr>> {
        let pos = self.mark();

        // expr2 -> ('+' | '-') expr2
        for (kind, operator) in [
            (TokenKind::Plus, UnaryOperator::Plus),
            (TokenKind::Minus, UnaryOperator::Minus),
        ] {
            if self.expect_token(kind)?.is_some() {
                if let Some(operand) = self.expect(Rule::Expr2, Node::into_expr)? {
                    return Ok(Some(Expr::unary(operator, operand)));
                }
            }
            self.reset(pos);
        }

        // expr2 -> expr3
        if let Some(expr) = self.expect(Rule::Expr3, Node::into_expr)? {
            return Ok(Some(expr));
        }

        self.reset(pos);
        Ok(None)
    }

    /// Power, binding tighter than unary minus on its left only.
    fn expr3(&mut self) -> Result<Option<Expr>> {
        let pos = self.mark();

        // expr3 -> expr4 '**' expr2
        if let Some(base) = self.expect(Rule::Expr4, Node::into_expr)? {
            if self.expect_token(TokenKind::Power)?.is_some() {
                if let Some(exponent) = self.expect(Rule::Expr2, Node::into_expr)? {
                    return Ok(Some(Expr::binary(BinaryOperator::Power, base, exponent)));
                }
            }
        }
        self.reset(pos);

        // expr3 -> expr4
        if let Some(expr) = self.expect(Rule::Expr4, Node::into_expr)? {
            return Ok(Some(expr));
        }

        self.reset(pos);
        Ok(None)
    }

    /// Parentheses, numbers, names and strings.
    ///
    /// Names cover copy-by-value parameters such as `l1.P`.
    fn expr4(&mut self) -> Result<Option<Expr>> {
        let pos = self.mark();

        // expr4 -> '(' expr ')'
        if self.expect_token(TokenKind::LParen)?.is_some() {
            if let Some(expr) = self.expect(Rule::Expr, Node::into_expr)? {
                if self.expect_token(TokenKind::RParen)?.is_some() {
                    return Ok(Some(expr));
                }
            }
        }
        self.reset(pos);

        // expr4 -> NUMBER, unless the lexer split a malformed number in two
        if let Some(token) = self.expect_token(TokenKind::Number)? {
            if self.negative_lookahead(TokenKind::Number)? {
                if let Some(number) = token.number() {
                    return Ok(Some(Expr::Number(number)));
                }
            }
        }
        self.reset(pos);

        // expr4 -> NAME
        if let Some(token) = self.expect_token(TokenKind::Name)? {
            return Ok(Some(Expr::Name(token.text)));
        }
        self.reset(pos);

        // expr4 -> STRING
        if let Some(token) = self.expect_token(TokenKind::String)? {
            let text = match token.literal {
                Literal::Text(text) => text,
                _ => token.text,
            };
            return Ok(Some(Expr::Text(text)));
        }
        self.reset(pos);

        if let Some(err) = self.expect(Rule::InvalidExpr4, Node::into_invalid)? {
            return Err(err.into());
        }

        self.reset(pos);
        Ok(None)
    }

    /// Two numbers run together, e.g. `01` or `0.1.1`.
    fn invalid_expr4(&mut self) -> Result<Option<SyntaxError>> {
        let pos = self.mark();

        if let Some(first) = self.expect_token(TokenKind::Number)? {
            if let Some(second) = self.expect_token(TokenKind::Number)? {
                let adjacent =
                    first.line == second.line && first.stop_column == second.start_column;
                if adjacent {
                    let integers = first.number().is_some_and(|n| n.is_integer())
                        && second.number().is_some_and(|n| n.is_integer());
                    let err = if integers {
                        self.lexer
                            .error_at("leading zeros in integers are not permitted", &first)
                    } else {
                        self.lexer.error_at("invalid number syntax", &second)
                    };
                    return Ok(Some(err));
                }
            }
        }

        self.reset(pos);
        Ok(None)
    }
}

impl<R: BufRead> Packrat for Parser<R> {
    type Key = Rule;
    type Value = Node;
    type Error = OptocadError;

    fn mark(&self) -> usize {
        self.pos
    }

    fn reset(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn memos(&mut self) -> &mut MemoTable<Rule, Node> {
        &mut self.memos
    }
}

/// Whether `text` is made only of motion-code letters.
pub fn is_motion_code(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| ACTION_LETTERS.contains(c))
}
