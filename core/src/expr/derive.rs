//! Symbolic partial derivatives.
//!
//! Results are built through simplifying constructors: products with a zero
//! factor collapse to `0`, zero summands and unit factors are dropped, and
//! numeric sub-trees are folded. A derivative term that does not depend on the
//! variable therefore disappears instead of surviving as a unit-bearing zero,
//! which keeps the derivative dimensionally consistent when it is evaluated
//! against unit-tagged bindings.

use super::parser::{BinaryOperator, Expr, UnaryOperator};

/// ∂expr/∂variable
pub fn differentiate(expr: &Expr, variable: &str) -> Expr {
    match expr {
        Expr::Number(_) => num(0.0),

        Expr::Symbol(name) => num(if name == variable { 1.0 } else { 0.0 }),

        Expr::UnaryOp {
            op: UnaryOperator::Neg,
            operand,
        } => neg(differentiate(operand, variable)),

        Expr::BinaryOp { op, left, right } => {
            let (l, r) = (left.as_ref(), right.as_ref());
            match op {
                BinaryOperator::Add => add(differentiate(l, variable), differentiate(r, variable)),
                BinaryOperator::Sub => sub(differentiate(l, variable), differentiate(r, variable)),
                BinaryOperator::Mul => add(
                    mul(differentiate(l, variable), r.clone()),
                    mul(l.clone(), differentiate(r, variable)),
                ),
                BinaryOperator::Div => {
                    let dl = differentiate(l, variable);
                    if !r.contains_symbol(variable) {
                        return div(dl, r.clone());
                    }
                    let dr = differentiate(r, variable);
                    div(
                        sub(mul(dl, r.clone()), mul(l.clone(), dr)),
                        pow(r.clone(), num(2.0)),
                    )
                }
                BinaryOperator::Pow => differentiate_pow(l, r, variable),
            }
        }

        Expr::FnCall { name, arg } => {
            let du = differentiate(arg, variable);
            if is_number(&du, 0.0) {
                return num(0.0);
            }
            let u = arg.as_ref().clone();
            let outer = match name.as_str() {
                "sin" => call("cos", u),
                "cos" => neg(call("sin", u)),
                "tan" => div(num(1.0), pow(call("cos", u), num(2.0))),
                "asin" => div(num(1.0), call("sqrt", sub(num(1.0), pow(u, num(2.0))))),
                "acos" => neg(div(num(1.0), call("sqrt", sub(num(1.0), pow(u, num(2.0)))))),
                "atan" => div(num(1.0), add(num(1.0), pow(u, num(2.0)))),
                "sqrt" => div(num(1.0), mul(num(2.0), call("sqrt", u))),
                "abs" => div(u.clone(), call("abs", u)),
                "ln" | "log" => div(num(1.0), u),
                "log10" => div(num(1.0), mul(u, call("ln", num(10.0)))),
                "exp" => call("exp", u),
                // Left unevaluable on purpose: evaluation reports the unknown function
                other => call(&format!("{}'", other), u),
            };
            mul(outer, du)
        }
    }
}

fn differentiate_pow(base: &Expr, exponent: &Expr, variable: &str) -> Expr {
    let base_varies = base.contains_symbol(variable);
    let exponent_varies = exponent.contains_symbol(variable);

    match (base_varies, exponent_varies) {
        (false, false) => num(0.0),
        // d(u^n) = n u^(n-1) du
        (true, false) => mul(
            mul(
                exponent.clone(),
                pow(base.clone(), sub(exponent.clone(), num(1.0))),
            ),
            differentiate(base, variable),
        ),
        // d(a^v) = a^v ln(a) dv
        (false, true) => mul(
            mul(pow(base.clone(), exponent.clone()), call("ln", base.clone())),
            differentiate(exponent, variable),
        ),
        // d(u^v) = u^v (dv ln(u) + v du / u)
        (true, true) => mul(
            pow(base.clone(), exponent.clone()),
            add(
                mul(differentiate(exponent, variable), call("ln", base.clone())),
                div(
                    mul(exponent.clone(), differentiate(base, variable)),
                    base.clone(),
                ),
            ),
        ),
    }
}

fn num(x: f64) -> Expr {
    Expr::Number(x)
}

fn as_number(e: &Expr) -> Option<f64> {
    match e {
        Expr::Number(n) => Some(*n),
        _ => None,
    }
}

fn is_number(e: &Expr, value: f64) -> bool {
    as_number(e) == Some(value)
}

fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn call(name: &str, arg: Expr) -> Expr {
    Expr::FnCall {
        name: name.to_string(),
        arg: Box::new(arg),
    }
}

fn neg(e: Expr) -> Expr {
    match e {
        Expr::Number(n) => num(-n),
        Expr::UnaryOp {
            op: UnaryOperator::Neg,
            operand,
        } => *operand,
        other => Expr::UnaryOp {
            op: UnaryOperator::Neg,
            operand: Box::new(other),
        },
    }
}

fn add(a: Expr, b: Expr) -> Expr {
    match (as_number(&a), as_number(&b)) {
        (Some(x), Some(y)) => num(x + y),
        (Some(x), _) if x == 0.0 => b,
        (_, Some(y)) if y == 0.0 => a,
        _ => binary(BinaryOperator::Add, a, b),
    }
}

fn sub(a: Expr, b: Expr) -> Expr {
    match (as_number(&a), as_number(&b)) {
        (Some(x), Some(y)) => num(x - y),
        (Some(x), _) if x == 0.0 => neg(b),
        (_, Some(y)) if y == 0.0 => a,
        _ => binary(BinaryOperator::Sub, a, b),
    }
}

fn mul(a: Expr, b: Expr) -> Expr {
    match (as_number(&a), as_number(&b)) {
        (Some(x), Some(y)) => num(x * y),
        (Some(x), _) | (_, Some(x)) if x == 0.0 => num(0.0),
        (Some(x), _) if x == 1.0 => b,
        (_, Some(y)) if y == 1.0 => a,
        (Some(x), _) if x == -1.0 => neg(b),
        (_, Some(y)) if y == -1.0 => neg(a),
        _ => binary(BinaryOperator::Mul, a, b),
    }
}

fn div(a: Expr, b: Expr) -> Expr {
    match (as_number(&a), as_number(&b)) {
        (Some(x), Some(y)) if y != 0.0 => num(x / y),
        (Some(x), _) if x == 0.0 => num(0.0),
        (_, Some(y)) if y == 1.0 => a,
        _ => binary(BinaryOperator::Div, a, b),
    }
}

fn pow(a: Expr, b: Expr) -> Expr {
    match (as_number(&a), as_number(&b)) {
        (Some(x), Some(y)) => num(x.powf(y)),
        (_, Some(y)) if y == 0.0 => num(1.0),
        (_, Some(y)) if y == 1.0 => a,
        _ => binary(BinaryOperator::Pow, a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{evaluate, parse_expression, Bindings};
    use crate::units::Quantity;

    fn d(text: &str, var: &str) -> Expr {
        differentiate(&parse_expression(text).unwrap(), var)
    }

    fn at(expr: &Expr, vars: &[(&str, f64)]) -> f64 {
        let bindings: Bindings = vars
            .iter()
            .map(|(k, v)| (k.to_string(), Quantity::number(*v)))
            .collect();
        evaluate(expr, &bindings).unwrap().base_value()
    }

    /// Central finite difference of `text` along `var`
    fn numeric(text: &str, var: &str, vars: &[(&str, f64)]) -> f64 {
        let expr = parse_expression(text).unwrap();
        let h = 1e-6;
        let shifted = |delta: f64| {
            let moved: Vec<(&str, f64)> = vars
                .iter()
                .map(|(k, v)| (*k, if *k == var { v + delta } else { *v }))
                .collect();
            at(&expr, &moved)
        };
        (shifted(h) - shifted(-h)) / (2.0 * h)
    }

    #[test]
    fn test_linear_terms_simplify() {
        assert_eq!(d("x + y", "x"), Expr::Number(1.0));
        assert_eq!(d("3 * x", "x"), Expr::Number(3.0));
        assert_eq!(d("x * y", "x"), Expr::Symbol("y".to_string()));
        assert_eq!(d("y", "x"), Expr::Number(0.0));
        assert_eq!(d("2 * pi", "x"), Expr::Number(0.0));
    }

    #[test]
    fn test_power_rule() {
        let dx = d("x^2", "x");
        assert_eq!(dx.to_string(), "(2.0 * x)");
    }

    #[test]
    fn test_matches_finite_differences() {
        let point = [("x", 1.3), ("y", 0.7)];
        let cases = [
            "x * y^2 / (x + y)",
            "sin(x) * cos(y)",
            "sqrt(x^2 + y^2)",
            "exp(x * y) - ln(x)",
            "x^y",
            "2^x",
            "atan(x / y)",
            "asin(y / 2) + acos(y / 3)",
            "tan(x) + abs(x - 3)",
            "log10(x) * -y",
        ];
        for case in cases {
            for var in ["x", "y"] {
                let symbolic = at(&d(case, var), &point);
                let approx = numeric(case, var, &point);
                assert!(
                    (symbolic - approx).abs() < 1e-5 * approx.abs().max(1.0),
                    "d({})/d{}: symbolic {} vs numeric {}",
                    case,
                    var,
                    symbolic,
                    approx
                );
            }
        }
    }

    #[test]
    fn test_derivative_keeps_units_consistent() {
        // d(l*w + l^2)/dw = l: no unit-bearing zero is left to add to it
        let dw = d("l * w + l^2", "w");
        let mut bindings = Bindings::new();
        bindings.insert("l".to_string(), Quantity::with_unit(2.0, "cm").unwrap());
        bindings.insert("w".to_string(), Quantity::with_unit(3.0, "cm").unwrap());
        let value = evaluate(&dw, &bindings).unwrap();
        assert_eq!(value.format_units(), "cm");
        assert!((value.value_in_unit() - 2.0).abs() < 1e-12);
    }
}
