//! Number formatting for output reports.

/// `x` rounded to `precision` significant digits, switching to exponent
/// notation (`1.2e+7`) when the exponent is below -6 or at least `precision`.
pub fn to_precision(x: f64, precision: usize) -> String {
    let p = precision.clamp(1, 100);
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if x == 0.0 {
        return if p == 1 {
            "0".to_string()
        } else {
            format!("0.{}", "0".repeat(p - 1))
        };
    }

    let scientific = format!("{:.*e}", p - 1, x);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -6 || exponent >= p as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (p as i32 - 1 - exponent).max(0) as usize;
        format!("{:.*}", decimals, x)
    }
}

fn to_fixed(x: f64, decimals: i32) -> String {
    format!("{:.*}", decimals.max(0) as usize, x)
}

fn order_of_magnitude(x: f64) -> i32 {
    if x == 0.0 {
        0
    } else {
        x.abs().log10().floor() as i32
    }
}

/// Compact `mean(uncertainty)` notation with `digits` significant digits of
/// uncertainty, e.g. `1.235(13)` or `1.2346(12)e4`.
///
/// Falls back to plain [`to_precision`] of the mean when the uncertainty is
/// not positive or exceeds the mean's order of magnitude.
pub fn concise(mean: f64, uncertainty: f64, digits: usize) -> String {
    let n = digits.max(1) as i32;
    if !(uncertainty.is_finite() && uncertainty > 0.0) || !mean.is_finite() {
        return to_precision(mean, digits);
    }
    let mean_exp = order_of_magnitude(mean);
    let u_exp = order_of_magnitude(uncertainty);
    if mean_exp < u_exp {
        return to_precision(mean, digits);
    }

    let coeff_exp = n - u_exp - 1;
    let (mean_part, exponent_part) = if mean_exp >= 3 || mean_exp <= -3 {
        let scaled = to_fixed(mean / 10f64.powi(mean_exp), mean_exp + coeff_exp);
        let trimmed = if scaled.contains('.') {
            scaled.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            scaled
        };
        (trimmed, format!("e{}", mean_exp))
    } else {
        (to_fixed(mean, coeff_exp), String::new())
    };

    // Round up, ignoring float noise such as 0.12 * 100 = 12.000000000000002
    let scaled_u = uncertainty * 10f64.powi(coeff_exp);
    let u_main = (scaled_u * (1.0 - 1e-12)).ceil() as i64;
    format!("{}({}){}", mean_part, u_main, exponent_part)
}

/// Uncertainty relative to |mean| as a percentage; `None` for a zero mean.
pub fn relative(uncertainty: f64, mean: f64, precision: usize) -> Option<String> {
    if mean == 0.0 || !mean.is_finite() {
        return None;
    }
    Some(format!(
        "{}%",
        to_precision(uncertainty / mean.abs() * 100.0, precision)
    ))
}
