//! Dimensional exponents over the seven SI base quantities.

use super::quantity::UnitError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exponents of the SI base quantities M, L, T, I, Θ, N, J.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimension {
    pub mass: i8,
    pub length: i8,
    pub time: i8,
    pub current: i8,
    pub temperature: i8,
    pub amount: i8,
    pub luminosity: i8,
}

impl Dimension {
    pub const DIMENSIONLESS: Self = Self::new(0, 0, 0, 0, 0, 0, 0);
    pub const MASS: Self = Self::new(1, 0, 0, 0, 0, 0, 0);
    pub const LENGTH: Self = Self::new(0, 1, 0, 0, 0, 0, 0);
    pub const TIME: Self = Self::new(0, 0, 1, 0, 0, 0, 0);
    pub const CURRENT: Self = Self::new(0, 0, 0, 1, 0, 0, 0);
    pub const TEMPERATURE: Self = Self::new(0, 0, 0, 0, 1, 0, 0);
    pub const AMOUNT: Self = Self::new(0, 0, 0, 0, 0, 1, 0);
    pub const LUMINOSITY: Self = Self::new(0, 0, 0, 0, 0, 0, 1);

    pub const VOLUME: Self = Self::new(0, 3, 0, 0, 0, 0, 0);
    pub const FREQUENCY: Self = Self::new(0, 0, -1, 0, 0, 0, 0);
    pub const FORCE: Self = Self::new(1, 1, -2, 0, 0, 0, 0);
    pub const ENERGY: Self = Self::new(1, 2, -2, 0, 0, 0, 0);
    pub const POWER: Self = Self::new(1, 2, -3, 0, 0, 0, 0);
    pub const PRESSURE: Self = Self::new(1, -1, -2, 0, 0, 0, 0);
    pub const CHARGE: Self = Self::new(0, 0, 1, 1, 0, 0, 0);
    pub const VOLTAGE: Self = Self::new(1, 2, -3, -1, 0, 0, 0);
    pub const RESISTANCE: Self = Self::new(1, 2, -3, -2, 0, 0, 0);
    pub const CONDUCTANCE: Self = Self::new(-1, -2, 3, 2, 0, 0, 0);
    pub const CAPACITANCE: Self = Self::new(-1, -2, 4, 2, 0, 0, 0);
    pub const MAGNETIC_FLUX: Self = Self::new(1, 2, -2, -1, 0, 0, 0);
    pub const MAGNETIC_FLUX_DENSITY: Self = Self::new(1, 0, -2, -1, 0, 0, 0);
    pub const INDUCTANCE: Self = Self::new(1, 2, -2, -2, 0, 0, 0);

    pub const fn new(
        mass: i8,
        length: i8,
        time: i8,
        current: i8,
        temperature: i8,
        amount: i8,
        luminosity: i8,
    ) -> Self {
        Self {
            mass,
            length,
            time,
            current,
            temperature,
            amount,
            luminosity,
        }
    }

    pub(crate) fn exponents(&self) -> [i8; 7] {
        [
            self.mass,
            self.length,
            self.time,
            self.current,
            self.temperature,
            self.amount,
            self.luminosity,
        ]
    }

    pub(crate) fn from_exponents(e: [i8; 7]) -> Self {
        Self::new(e[0], e[1], e[2], e[3], e[4], e[5], e[6])
    }

    fn combine(
        &self,
        other: &Dimension,
        op: &str,
        f: fn(i8, i8) -> Option<i8>,
    ) -> Result<Dimension, UnitError> {
        let (a, b) = (self.exponents(), other.exponents());
        let mut out = [0; 7];
        for (slot, (x, y)) in out.iter_mut().zip(a.into_iter().zip(b)) {
            *slot = f(x, y)
                .ok_or_else(|| UnitError::PowerOverflow(format!("({}) {} ({})", self, op, other)))?;
        }
        Ok(Self::from_exponents(out))
    }

    /// Multiply dimensions (add exponents)
    pub fn mul(&self, other: &Dimension) -> Result<Dimension, UnitError> {
        self.combine(other, "*", i8::checked_add)
    }

    /// Divide dimensions (subtract exponents)
    pub fn div(&self, other: &Dimension) -> Result<Dimension, UnitError> {
        self.combine(other, "/", i8::checked_sub)
    }

    /// Raise to an integer power (scale exponents)
    pub fn powi(&self, n: i32) -> Result<Dimension, UnitError> {
        let mut out = [0; 7];
        for (slot, e) in out.iter_mut().zip(self.exponents()) {
            *slot = i32::from(e)
                .checked_mul(n)
                .and_then(|p| i8::try_from(p).ok())
                .ok_or_else(|| UnitError::PowerOverflow(format!("({})^{}", self, n)))?;
        }
        Ok(Self::from_exponents(out))
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::DIMENSIONLESS
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }
        let symbols = ["M", "L", "T", "I", "Θ", "N", "J"];
        let parts: Vec<String> = self
            .exponents()
            .iter()
            .zip(symbols)
            .filter(|(e, _)| **e != 0)
            .map(|(e, s)| if *e == 1 { s.to_string() } else { format!("{}^{}", s, e) })
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_is_mass_times_acceleration() {
        let accel = Dimension::LENGTH.div(&Dimension::TIME.powi(2).unwrap()).unwrap();
        assert_eq!(Dimension::MASS.mul(&accel), Ok(Dimension::FORCE));
    }

    #[test]
    fn test_exponent_overflow_is_an_error() {
        let big = Dimension::LENGTH.powi(100).unwrap();
        assert!(matches!(big.mul(&big), Err(UnitError::PowerOverflow(_))));
        assert!(matches!(big.div(&big.powi(-1).unwrap()), Err(UnitError::PowerOverflow(_))));
        assert!(matches!(Dimension::LENGTH.powi(256), Err(UnitError::PowerOverflow(_))));
        assert!(matches!(Dimension::FORCE.powi(i32::MAX), Err(UnitError::PowerOverflow(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(Dimension::DIMENSIONLESS.to_string(), "1");
        assert_eq!(Dimension::FORCE.to_string(), "M L T^-2");
    }
}
