//! Session-wide settings and the named constants they provide to formulas.

use crate::expr::Bindings;
use crate::units::Quantity;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GRAVITY: f64 = 9.8;

/// Symbol under which the gravitational acceleration is bound
pub const GRAVITY_SYMBOL: &str = "g";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Local gravitational acceleration in m/s^2
    pub gravity: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
        }
    }
}

impl Settings {
    /// Named constants available to every formula
    pub fn constants(&self) -> Bindings {
        let mut constants = Bindings::new();
        if let Ok(g) = Quantity::with_unit(self.gravity, "m/s^2") {
            constants.insert(GRAVITY_SYMBOL.to_string(), g);
        }
        constants
    }

    /// International gravity formula at a geodetic latitude, rounded to 5 decimals.
    pub fn gravity_at_latitude(latitude_deg: f64) -> f64 {
        const G0: f64 = 9.780_318_5;
        const A: f64 = 0.005_278_895;
        const B: f64 = 0.000_023_462;

        let s = latitude_deg.to_radians().sin();
        let g = G0 * (1.0 + A * s.powi(2) + B * s.powi(4));
        (g * 1e5).round() / 1e5
    }
}

/// Which uncertainty contributions take part in propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncertaintyTypes {
    pub type_a: bool,
    pub type_b: bool,
}

impl Default for UncertaintyTypes {
    fn default() -> Self {
        Self {
            type_a: true,
            type_b: true,
        }
    }
}

impl UncertaintyTypes {
    pub const NONE: Self = Self {
        type_a: false,
        type_b: false,
    };
    pub const TYPE_A_ONLY: Self = Self {
        type_a: true,
        type_b: false,
    };
    pub const TYPE_B_ONLY: Self = Self {
        type_a: false,
        type_b: true,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_at_latitude() {
        assert!((Settings::gravity_at_latitude(0.0) - 9.78032).abs() < 1e-9);
        assert!((Settings::gravity_at_latitude(90.0) - 9.83218).abs() < 1e-9);
        assert!((Settings::gravity_at_latitude(45.0) - 9.80619).abs() < 1e-9);
    }

    #[test]
    fn test_constants_bind_gravity() {
        let constants = Settings::default().constants();
        let g = &constants[GRAVITY_SYMBOL];
        assert!((g.to_number_in("m/s^2").unwrap() - 9.8).abs() < 1e-12);
    }
}
