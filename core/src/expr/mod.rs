//! Symbolic expression engine.
//!
//! Provides a system for working with measurement formulas:
//! - Parsing formula text into an expression tree
//! - Free-symbol enumeration and bare-symbol classification
//! - Unit-aware evaluation against a binding table
//! - Symbolic partial differentiation

pub mod derive;
pub mod eval;
pub mod parser;

pub use derive::differentiate;
pub use eval::{evaluate, Bindings, EvalError};
pub use parser::{
    normalize_subscripts, parse_expression, BinaryOperator, Expr, MathConstant, ParseError,
    UnaryOperator,
};
