//! Unit-aware expression evaluation against a binding table.

use super::parser::{BinaryOperator, Expr, MathConstant, UnaryOperator};
use crate::units::{Quantity, UnitError};
use std::collections::HashMap;
use thiserror::Error;

/// Values bound to free symbols during evaluation
pub type Bindings = HashMap<String, Quantity>;

/// Evaluation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Undefined symbol {0}")]
    UndefinedSymbol(String),
    #[error("Units do not match: {0}")]
    UnitMismatch(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    /// Invalid function argument (e.g., sqrt of negative)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<UnitError> for EvalError {
    fn from(err: UnitError) -> Self {
        EvalError::UnitMismatch(err.to_string())
    }
}

/// Evaluate `expr` with every free symbol looked up in `bindings`.
/// Unbound `pi` and `e` take their built-in values.
pub fn evaluate(expr: &Expr, bindings: &Bindings) -> Result<Quantity, EvalError> {
    match expr {
        Expr::Number(n) => Ok(Quantity::number(*n)),

        Expr::Symbol(name) => bindings
            .get(name)
            .cloned()
            .or_else(|| MathConstant::from_name(name).map(|c| Quantity::number(c.value())))
            .ok_or_else(|| EvalError::UndefinedSymbol(name.clone())),

        Expr::BinaryOp { op, left, right } => {
            let l = evaluate(left, bindings)?;
            let r = evaluate(right, bindings)?;

            match op {
                BinaryOperator::Add => Ok(l.add(&r)?),
                BinaryOperator::Sub => Ok(l.sub(&r)?),
                BinaryOperator::Mul => Ok(l.mul(&r)?),
                BinaryOperator::Div => {
                    if r.is_zero() {
                        Err(EvalError::DivisionByZero)
                    } else {
                        Ok(l.div(&r)?)
                    }
                }
                BinaryOperator::Pow => {
                    let result = l.powf(&r)?;
                    if result.base_value().is_nan() {
                        Err(EvalError::InvalidArgument(format!(
                            "{} raised to {} is not real",
                            l, r
                        )))
                    } else {
                        Ok(result)
                    }
                }
            }
        }

        Expr::UnaryOp { op, operand } => {
            let val = evaluate(operand, bindings)?;
            match op {
                UnaryOperator::Neg => Ok(val.neg()),
            }
        }

        Expr::FnCall { name, arg } => {
            let val = evaluate(arg, bindings)?;
            match name.as_str() {
                "sqrt" => {
                    if val.base_value() < 0.0 {
                        Err(EvalError::InvalidArgument("sqrt of negative number".to_string()))
                    } else {
                        Ok(val.sqrt()?)
                    }
                }
                "abs" => Ok(val.abs()),
                _ => {
                    let x = val.dimensionless_value()?;
                    apply_scalar(name, x).map(Quantity::number)
                }
            }
        }
    }
}

/// Functions defined only on dimensionless arguments
fn apply_scalar(name: &str, x: f64) -> Result<f64, EvalError> {
    match name {
        "sin" => Ok(x.sin()),
        "cos" => Ok(x.cos()),
        "tan" => Ok(x.tan()),
        "asin" | "acos" => {
            if !(-1.0..=1.0).contains(&x) {
                Err(EvalError::InvalidArgument(format!("{} argument must be in [-1, 1]", name)))
            } else if name == "asin" {
                Ok(x.asin())
            } else {
                Ok(x.acos())
            }
        }
        "atan" => Ok(x.atan()),
        "ln" | "log" => {
            if x <= 0.0 {
                Err(EvalError::InvalidArgument(format!("{} of non-positive number", name)))
            } else {
                Ok(x.ln())
            }
        }
        "log10" => {
            if x <= 0.0 {
                Err(EvalError::InvalidArgument("log10 of non-positive number".to_string()))
            } else {
                Ok(x.log10())
            }
        }
        "exp" => Ok(x.exp()),
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

#[cfg(test)]
mod eval_tests {
    use super::*;
    use crate::expr::parse_expression;

    fn eval(text: &str, bindings: &Bindings) -> Result<Quantity, EvalError> {
        evaluate(&parse_expression(text).unwrap(), bindings)
    }

    fn eval_number(text: &str) -> f64 {
        eval(text, &Bindings::new()).unwrap().base_value()
    }

    #[test]
    fn test_eval_arithmetic() {
        assert!((eval_number("2 + 3 * 4") - 14.0).abs() < 1e-10);
        assert!((eval_number("(2 + 3) * 4") - 20.0).abs() < 1e-10);
        assert!((eval_number("2 ^ 3") - 8.0).abs() < 1e-10);
        assert!((eval_number("-5 + 10") - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_eval_functions_and_constants() {
        assert!((eval_number("sqrt(16)") - 4.0).abs() < 1e-10);
        assert!(eval_number("sin(0)").abs() < 1e-10);
        assert!((eval_number("2 * pi") - 2.0 * std::f64::consts::PI).abs() < 1e-10);
        assert!((eval_number("ln(e)") - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_eval_bound_quantities() {
        let mut bindings = Bindings::new();
        bindings.insert("l".to_string(), Quantity::with_unit(2.0, "cm").unwrap());
        bindings.insert("t".to_string(), Quantity::with_unit(4.0, "s").unwrap());

        let v = eval("l / t", &bindings).unwrap();
        assert_eq!(v.format_units(), "cm / s");
        assert!((v.value_in_unit() - 0.5).abs() < 1e-12);

        let area = eval("l^2", &bindings).unwrap();
        assert_eq!(area.format_units(), "cm^2");
    }

    #[test]
    fn test_eval_unit_mismatch() {
        let mut bindings = Bindings::new();
        bindings.insert("l".to_string(), Quantity::with_unit(2.0, "cm").unwrap());
        bindings.insert("t".to_string(), Quantity::with_unit(4.0, "s").unwrap());

        assert!(matches!(eval("l + t", &bindings), Err(EvalError::UnitMismatch(_))));
        assert!(matches!(eval("sin(l)", &bindings), Err(EvalError::UnitMismatch(_))));
        assert!(matches!(eval("l + 1", &bindings), Err(EvalError::UnitMismatch(_))));
    }

    #[test]
    fn test_eval_trig_in_degrees() {
        let mut bindings = Bindings::new();
        bindings.insert("θ".to_string(), Quantity::with_unit(30.0, "deg").unwrap());
        let s = eval("sin(θ)", &bindings).unwrap();
        assert!((s.base_value() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_eval_undefined_symbol() {
        let result = eval("q * 2", &Bindings::new());
        assert_eq!(result, Err(EvalError::UndefinedSymbol("q".to_string())));
    }

    #[test]
    fn test_eval_domain_errors() {
        let empty = Bindings::new();
        assert!(matches!(eval("1 / 0", &empty), Err(EvalError::DivisionByZero)));
        assert!(matches!(eval("sqrt(-1)", &empty), Err(EvalError::InvalidArgument(_))));
        assert!(matches!(eval("mystery(5)", &empty), Err(EvalError::UnknownFunction(_))));
    }
}
