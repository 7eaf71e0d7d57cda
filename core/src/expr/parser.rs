//! Expression parser for measurement names and formulas.
//!
//! Supports:
//! - Numbers (integers, floats, scientific notation)
//! - Bare symbols (`l`, `t_1`, `θ`) naming other measurements or constants
//! - Arithmetic operators (+, -, *, /, ^) and implicit products (`2x`, `2(x+1)`)
//! - Parentheses for grouping
//! - Built-in functions (sin, cos, tan, asin, acos, atan, sqrt, abs, ln, log, log10, exp)
//! - Built-in constants (pi, e), which are ordinary symbols until evaluation

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Parse failure and the byte offset it was detected at
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathConstant {
    Pi,
    E,
}

impl MathConstant {
    /// Built-in constant spelled `name`, used when no binding shadows it
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pi" | "PI" | "π" => Some(Self::Pi),
            "e" | "E" => Some(Self::E),
            _ => None,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Self::Pi => std::f64::consts::PI,
            Self::E => std::f64::consts::E,
        }
    }
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Free symbol, bound at evaluation time. `pi` and `e` are symbols too so
    /// a measurement may carry those names.
    Symbol(String),
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    FnCall {
        name: String,
        arg: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOperator {
    fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Neg,
}

impl Expr {
    /// `Some(name)` iff the whole tree is a single bare symbol
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Distinct free symbols in first-encounter order.
    /// Function names are not symbols; built-in constant names are.
    pub fn free_symbols(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_symbols(&mut seen, &mut out);
        out
    }

    fn collect_symbols(&self, seen: &mut HashSet<String>, out: &mut Vec<String>) {
        match self {
            Expr::Symbol(name) => {
                if seen.insert(name.clone()) {
                    out.push(name.clone());
                }
            }
            Expr::Number(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.collect_symbols(seen, out);
                right.collect_symbols(seen, out);
            }
            Expr::UnaryOp { operand, .. } => operand.collect_symbols(seen, out),
            Expr::FnCall { arg, .. } => arg.collect_symbols(seen, out),
        }
    }

    pub fn contains_symbol(&self, symbol: &str) -> bool {
        match self {
            Expr::Symbol(name) => name == symbol,
            Expr::Number(_) => false,
            Expr::BinaryOp { left, right, .. } => {
                left.contains_symbol(symbol) || right.contains_symbol(symbol)
            }
            Expr::UnaryOp { operand, .. } => operand.contains_symbol(symbol),
            Expr::FnCall { arg, .. } => arg.contains_symbol(symbol),
        }
    }
}

/// Canonical, fully parenthesized form. Distinct trees never print alike.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) if *n < 0.0 => write!(f, "({:?})", n),
            Expr::Number(n) => write!(f, "{:?}", n),
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::BinaryOp { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::UnaryOp {
                op: UnaryOperator::Neg,
                operand,
            } => write!(f, "(- {})", operand),
            Expr::FnCall { name, arg } => write!(f, "{}({})", name, arg),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(f64),
    Ident(String),
    Op(char),
    Open,
    Close,
}

/// A token and the byte offset it starts at
type Spanned = (Tok, usize);

fn error(message: impl Into<String>, position: usize) -> ParseError {
    ParseError {
        message: message.into(),
        position,
    }
}

fn tokenize(input: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(at, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let tok = match c {
            '+' | '/' | '^' => Tok::Op(c),
            '-' | '−' => Tok::Op('-'),
            '*' | '·' | '×' => Tok::Op('*'),
            '(' => Tok::Open,
            ')' => Tok::Close,
            c if c.is_ascii_digit() || c == '.' => {
                let end = number_end(input, at);
                let text = &input[at..end];
                let value = text
                    .parse::<f64>()
                    .map_err(|_| error(format!("bad number literal {:?}", text), at))?;
                while chars.peek().is_some_and(|&(i, _)| i < end) {
                    chars.next();
                }
                tokens.push((Tok::Num(value), at));
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                tokens.push((Tok::Ident(name), at));
                continue;
            }
            other => return Err(error(format!("unexpected {:?}", other), at)),
        };
        chars.next();
        tokens.push((tok, at));
    }
    Ok(tokens)
}

/// End offset of the numeric literal at `start`. An exponent is only taken
/// when digits follow it, so `2e` stays `2 * e`.
fn number_end(input: &str, start: usize) -> usize {
    let bytes = input.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = digits_from(start);
    if end < bytes.len() && bytes[end] == b'.' {
        end = digits_from(end + 1);
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            end = digits_from(exp);
        }
    }
    end
}

fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Recursive descent over a token vector.
///
/// ```text
/// sum     := product (('+' | '-') product)*
/// product := signed (('*' | '/')? signed)*
/// signed  := '-' signed | power
/// power   := atom ('^' signed)?
/// atom    := number | ident | ident '(' sum ')' | '(' sum ')'
/// ```
struct Cursor {
    tokens: Vec<Spanned>,
    index: usize,
    end: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.index).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.index).map_or(self.end, |&(_, at)| at)
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.index).map(|(t, _)| t.clone());
        self.index += 1;
        tok
    }

    fn eat_op(&mut self, op: char) -> bool {
        if self.peek() == Some(&Tok::Op(op)) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn close(&mut self, what: &str) -> Result<(), ParseError> {
        match self.peek() {
            Some(Tok::Close) => {
                self.index += 1;
                Ok(())
            }
            _ => Err(error(format!("missing ')' {}", what), self.offset())),
        }
    }

    fn sum(&mut self) -> Result<Expr, ParseError> {
        let mut acc = self.product()?;
        loop {
            let op = if self.eat_op('+') {
                BinaryOperator::Add
            } else if self.eat_op('-') {
                BinaryOperator::Sub
            } else {
                return Ok(acc);
            };
            acc = binary(op, acc, self.product()?);
        }
    }

    fn product(&mut self) -> Result<Expr, ParseError> {
        let mut acc = self.signed()?;
        loop {
            let op = if self.eat_op('*') {
                BinaryOperator::Mul
            } else if self.eat_op('/') {
                BinaryOperator::Div
            } else if matches!(self.peek(), Some(Tok::Num(_) | Tok::Ident(_) | Tok::Open)) {
                // juxtaposition: 2x, 2(x+1), m g
                BinaryOperator::Mul
            } else {
                return Ok(acc);
            };
            acc = binary(op, acc, self.signed()?);
        }
    }

    fn signed(&mut self) -> Result<Expr, ParseError> {
        if self.eat_op('-') {
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Neg,
                operand: Box::new(self.signed()?),
            });
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.atom()?;
        if self.eat_op('^') {
            return Ok(binary(BinaryOperator::Pow, base, self.signed()?));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        let at = self.offset();
        match self.bump() {
            Some(Tok::Num(value)) => Ok(Expr::Number(value)),
            Some(Tok::Open) => {
                let inner = self.sum()?;
                self.close("to match '('")?;
                Ok(inner)
            }
            Some(Tok::Ident(name)) if self.peek() == Some(&Tok::Open) => {
                self.index += 1;
                let arg = self.sum()?;
                self.close(&format!("after argument of {}", name))?;
                Ok(Expr::FnCall {
                    name,
                    arg: Box::new(arg),
                })
            }
            Some(Tok::Ident(name)) => Ok(Expr::Symbol(name)),
            Some(tok) => Err(error(format!("unexpected {:?}", tok), at)),
            None => Err(error("unexpected end of input", at)),
        }
    }
}

/// Flatten grouped subscripts written as `x_(12)` into `x_12`.
pub fn normalize_subscripts(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(idx) = rest.find("_(") {
        out.push_str(&rest[..=idx]);
        let after = &rest[idx + 2..];
        match after.find(')') {
            Some(close) if after[..close].chars().all(|c| c.is_alphanumeric()) => {
                out.push_str(&after[..close]);
                rest = &after[close + 1..];
            }
            _ => {
                out.push('(');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parse formula or name text into a tree. Blank text is an error.
pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
    let text = normalize_subscripts(input);
    let tokens = tokenize(&text)?;
    if tokens.is_empty() {
        return Err(error("nothing to parse", 0));
    }
    let mut cursor = Cursor {
        tokens,
        index: 0,
        end: text.len(),
    };
    let tree = cursor.sum()?;
    match cursor.peek() {
        None => Ok(tree),
        Some(tok) => Err(error(format!("trailing {:?}", tok), cursor.offset())),
    }
}
