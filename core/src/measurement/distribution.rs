//! Type-B uncertainty distribution shapes and their divisor coefficients.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    #[default]
    Normal,
    Uniform,
    Triangular,
    None,
}

impl Distribution {
    pub const ALL: [Distribution; 4] = [
        Distribution::Normal,
        Distribution::Uniform,
        Distribution::Triangular,
        Distribution::None,
    ];

    /// Factor applied to a type-B limit to obtain a standard uncertainty
    pub fn coefficient(&self) -> f64 {
        match self {
            Self::Normal => 1.0 / 3.0,
            Self::Uniform => 1.0 / 3f64.sqrt(),
            Self::Triangular => 1.0 / 6f64.sqrt(),
            Self::None => 1.0,
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Uniform => write!(f, "uniform"),
            Self::Triangular => write!(f, "triangular"),
            Self::None => write!(f, "none"),
        }
    }
}

impl FromStr for Distribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Distribution::ALL
            .into_iter()
            .find(|d| d.to_string() == s)
            .ok_or_else(|| format!("Unknown distribution: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficients() {
        assert!((Distribution::Normal.coefficient() - 1.0 / 3.0).abs() < 1e-15);
        assert!((Distribution::Uniform.coefficient() * 3f64.sqrt() - 1.0).abs() < 1e-15);
        assert!((Distribution::Triangular.coefficient() * 6f64.sqrt() - 1.0).abs() < 1e-15);
        assert_eq!(Distribution::None.coefficient(), 1.0);
    }

    #[test]
    fn test_round_trip_names() {
        for d in Distribution::ALL {
            assert_eq!(d.to_string().parse::<Distribution>(), Ok(d));
        }
        assert!("gaussian".parse::<Distribution>().is_err());
    }
}
