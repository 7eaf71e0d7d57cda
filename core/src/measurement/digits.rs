//! Raw sample input handling: splitting, validation and digit counting.

/// Split pasted text into individual entries on whitespace and commas.
pub fn split_input(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A committed sample must be non-blank and a finite number.
pub fn parse_input(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Digit characters left after dropping the exponent suffix and the decimal point.
///
/// `"12.30"` has 4, `"7"` has 1, `"1.50e3"` has 3.
pub fn significant_digits(raw: &str) -> usize {
    let mantissa = raw
        .trim()
        .split(|c: char| c == 'e' || c == 'E')
        .next()
        .unwrap_or("");
    mantissa.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Fewest significant digits among `inputs`, 0 when empty.
pub fn min_digits<S: AsRef<str>>(inputs: &[S]) -> usize {
    inputs
        .iter()
        .map(|s| significant_digits(s.as_ref()))
        .min()
        .unwrap_or(0)
}
