//! Abstract Syntax Tree types for Optocad scripts.

use std::fmt;

use super::token::Number;

/// A parsed Optocad script: its commands in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    /// Primary commands, secondary surfaces attached
    pub commands: Vec<Command>,
}

impl Script {
    /// Create a new empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of primary commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the script has no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over the commands.
    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    /// The most recently added command.
    pub fn last_mut(&mut self) -> Option<&mut Command> {
        self.commands.last_mut()
    }

    /// Append a command.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }
}

impl<'a> IntoIterator for &'a Script {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for command in &self.commands {
            writeln!(f, "{}", command)?;
        }
        Ok(())
    }
}

/// A primary command line, e.g. `m1 1, 2, r=3`.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// The command name
    pub directive: String,
    /// Positional values
    pub args: Vec<Value>,
    /// Keyword values
    pub kwargs: Kwargs,
    /// Additional surfaces from following `+` lines
    pub secondary_surfaces: Vec<SecondarySurfaceCommand>,
}

impl Command {
    /// Create a command with no secondary surfaces.
    pub fn new(directive: impl Into<String>, args: Vec<Value>, kwargs: Kwargs) -> Self {
        Self {
            directive: directive.into(),
            args,
            kwargs,
            secondary_surfaces: Vec::new(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.directive)?;
        write_params(f, &self.args, &self.kwargs)?;
        for surface in &self.secondary_surfaces {
            write!(f, "\n{}", surface)?;
        }
        Ok(())
    }
}

/// A `+` line describing another surface of the preceding command's element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecondarySurfaceCommand {
    /// Positional values
    pub args: Vec<Value>,
    /// Keyword values
    pub kwargs: Kwargs,
}

impl fmt::Display for SecondarySurfaceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\t+ ")?;
        write_params(f, &self.args, &self.kwargs)
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, args: &[Value], kwargs: &Kwargs) -> fmt::Result {
    let mut first = true;
    for arg in args {
        if !first {
            f.write_str(", ")?;
        }
        write!(f, "{}", arg)?;
        first = false;
    }
    for (key, value) in kwargs {
        if !first {
            f.write_str(", ")?;
        }
        write!(f, "{}={}", key, value)?;
        first = false;
    }
    Ok(())
}

/// Keyword arguments in insertion order with unique keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kwargs {
    entries: Vec<(String, Value)>,
}

impl Kwargs {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`.
    ///
    /// An existing key keeps its position and takes the new value, which is
    /// returned in place of the old one.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Merge `other` into `self`, its values winning on duplicate keys.
    pub fn merge(&mut self, other: Kwargs) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Kwargs {
    type Item = (&'a str, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Kwargs {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut kwargs = Kwargs::new();
        for (key, value) in iter {
            kwargs.insert(key, value);
        }
        kwargs
    }
}

/// A command parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Motion-code string such as `crv` or `{ct}2`
    Action(String),
    /// Unevaluated expression
    Expr(Expr),
}

impl Value {
    /// The expression, if this value is one.
    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            Self::Expr(expr) => Some(expr),
            Self::Action(_) => None,
        }
    }

    /// The action text, if this value is one.
    pub fn as_action(&self) -> Option<&str> {
        match self {
            Self::Action(action) => Some(action),
            Self::Expr(_) => None,
        }
    }
}

impl From<Expr> for Value {
    fn from(expr: Expr) -> Self {
        Self::Expr(expr)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Expr(Expr::Number(Number::Integer(value)))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Expr(Expr::Number(Number::Float(value)))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => f.write_str(action),
            Self::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

/// An expression tree mirroring source precedence and associativity.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(Number),
    /// Reference to a name, e.g. `l1.P`
    Name(String),
    /// String literal
    Text(String),
    /// Prefix operation
    Unary(UnaryExpression),
    /// Infix operation
    Binary(BinaryExpression),
}

impl Expr {
    /// Build a unary expression node.
    pub fn unary(operator: UnaryOperator, operand: Expr) -> Self {
        Self::Unary(UnaryExpression {
            operator,
            operand: Box::new(operand),
        })
    }

    /// Build a binary expression node.
    pub fn binary(operator: BinaryOperator, left: Expr, right: Expr) -> Self {
        Self::Binary(BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}

impl From<Number> for Expr {
    fn from(number: Number) -> Self {
        Self::Number(number)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Name(name) => f.write_str(name),
            Self::Text(text) => write!(f, "{:?}", text),
            Self::Unary(u) => write!(f, "{}", u),
            Self::Binary(b) => write!(f, "{}", b),
        }
    }
}

/// A prefix `+` or `-` applied to an operand.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operand: Box<Expr>,
}

impl fmt::Display for UnaryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.operand)
    }
}

/// An infix operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

impl fmt::Display for BinaryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.left, self.operator, self.right)
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

impl UnaryOperator {
    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Power,
}

impl BinaryOperator {
    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::FloorDivide => "//",
            Self::Power => "**",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
