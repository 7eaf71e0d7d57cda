//! Runtime units and unit-tagged values.

use super::catalog;
use super::dimension::Dimension;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),
    #[error("Invalid unit syntax: {0}")]
    InvalidSyntax(String),
    #[error("Units do not match: cannot combine {from} with {to}")]
    DimensionMismatch { from: String, to: String },
    #[error("Unit power is not an integer: {0}")]
    FractionalPower(String),
    #[error("Unit power out of range: {0}")]
    PowerOverflow(String),
}

/// Largest magnitude a unit factor or dimension exponent may reach
pub const MAX_POWER: i32 = i8::MAX as i32;

/// One unit atom raised to an integer power, e.g. `cm^2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitFactor {
    /// Symbol as written, prefix included
    pub symbol: String,
    pub dimension: Dimension,
    /// Scale of one atom to the SI base
    pub scale: f64,
    pub power: i32,
}

/// A product of unit factors. The empty product is a plain number.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Unit {
    factors: Vec<UnitFactor>,
}

impl Unit {
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse a unit expression such as `kg*m/s^2`, `g cm / s^2`, `m s^-1` or `1/s`.
    /// Empty text is the empty unit.
    pub fn parse(text: &str) -> Result<Self, UnitError> {
        let mut unit = Unit::none();
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;
        let mut divide = false;

        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() || c == '*' || c == '·' {
                i += 1;
            } else if c == '/' {
                if divide {
                    return Err(UnitError::InvalidSyntax(text.to_string()));
                }
                divide = true;
                i += 1;
            } else if c == '1' && chars[i + 1..].iter().find(|c| !c.is_whitespace()) == Some(&'/') {
                // numerator of "1/s"
                i += 1;
            } else if c.is_alphabetic() || c == 'Ω' || c == '°' {
                let start = i;
                while i < chars.len() && (chars[i].is_alphabetic() || chars[i] == '°') {
                    i += 1;
                }
                let symbol: String = chars[start..i].iter().collect();
                let (dimension, scale) = catalog::lookup(&symbol)
                    .ok_or_else(|| UnitError::UnknownUnit(symbol.clone()))?;

                let mut power = 1;
                if i < chars.len() && chars[i] == '^' {
                    i += 1;
                    let start = i;
                    if i < chars.len() && (chars[i] == '-' || chars[i] == '+') {
                        i += 1;
                    }
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                    let digits: String = chars[start..i].iter().collect();
                    power = digits
                        .parse::<i32>()
                        .map_err(|_| UnitError::InvalidSyntax(text.to_string()))?;
                }
                if divide {
                    power = -power;
                    divide = false;
                }
                unit.push(UnitFactor {
                    symbol,
                    dimension,
                    scale,
                    power,
                })?;
            } else {
                return Err(UnitError::InvalidSyntax(text.to_string()));
            }
        }

        if divide {
            return Err(UnitError::InvalidSyntax(text.to_string()));
        }
        unit.dimension()?;
        Ok(unit)
    }

    /// Merge a factor into the product, keeping every power within `MAX_POWER`.
    fn push(&mut self, factor: UnitFactor) -> Result<(), UnitError> {
        let in_range = |p: i32| (-MAX_POWER..=MAX_POWER).contains(&p);
        if let Some(existing) = self.factors.iter_mut().find(|f| f.symbol == factor.symbol) {
            existing.power = existing
                .power
                .checked_add(factor.power)
                .filter(|p| in_range(*p))
                .ok_or_else(|| {
                    UnitError::PowerOverflow(format!("{}^({} + {})", factor.symbol, existing.power, factor.power))
                })?;
        } else if in_range(factor.power) {
            self.factors.push(factor);
        } else {
            return Err(UnitError::PowerOverflow(format!("{}^{}", factor.symbol, factor.power)));
        }
        self.factors.retain(|f| f.power != 0);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn factors(&self) -> &[UnitFactor] {
        &self.factors
    }

    pub fn dimension(&self) -> Result<Dimension, UnitError> {
        self.factors.iter().try_fold(Dimension::DIMENSIONLESS, |acc, f| {
            acc.mul(&f.dimension.powi(f.power)?)
        })
    }

    /// Multiplier from this unit to the SI base of its dimension
    pub fn scale(&self) -> f64 {
        self.factors.iter().map(|f| f.scale.powi(f.power)).product()
    }

    pub fn to_base(&self, value: f64) -> f64 {
        value * self.scale()
    }

    pub fn from_base(&self, base_value: f64) -> f64 {
        base_value / self.scale()
    }

    pub fn mul(&self, other: &Unit) -> Result<Unit, UnitError> {
        let mut out = self.clone();
        for factor in &other.factors {
            out.push(factor.clone())?;
        }
        out.dimension()?;
        Ok(out)
    }

    pub fn div(&self, other: &Unit) -> Result<Unit, UnitError> {
        let mut out = self.clone();
        for factor in &other.factors {
            out.push(UnitFactor {
                power: -factor.power,
                ..factor.clone()
            })?;
        }
        out.dimension()?;
        Ok(out)
    }

    pub fn powi(&self, n: i32) -> Result<Unit, UnitError> {
        let mut out = Unit::none();
        for factor in &self.factors {
            let power = factor.power.checked_mul(n).ok_or_else(|| {
                UnitError::PowerOverflow(format!("{}^({} * {})", factor.symbol, factor.power, n))
            })?;
            out.push(UnitFactor {
                power,
                ..factor.clone()
            })?;
        }
        out.dimension()?;
        Ok(out)
    }

    /// Raise to a real power.
    ///
    /// Factors keep their symbols when every resulting power is integral.
    /// Otherwise the result is expressed in coherent SI base units, which
    /// succeeds whenever the resulting dimension is integral (`sqrt(cm / m s^-2)`).
    pub fn powf(&self, exponent: f64) -> Result<Unit, UnitError> {
        if let Some(unit) = self.powf_factors(exponent)? {
            return Ok(unit);
        }
        if let Some(unit) = self.powf_si(exponent)? {
            return Ok(unit);
        }
        Err(UnitError::FractionalPower(format!("({})^{}", self, exponent)))
    }

    /// `Ok(None)` when some factor power would be fractional
    fn powf_factors(&self, exponent: f64) -> Result<Option<Unit>, UnitError> {
        let mut out = Unit::none();
        for factor in &self.factors {
            let Some(power) = integral(f64::from(factor.power) * exponent) else {
                return Ok(None);
            };
            out.push(UnitFactor {
                power,
                ..factor.clone()
            })?;
        }
        out.dimension()?;
        Ok(Some(out))
    }

    fn powf_si(&self, exponent: f64) -> Result<Option<Unit>, UnitError> {
        let mut scaled = [0; 7];
        for (slot, p) in scaled.iter_mut().zip(self.dimension()?.exponents()) {
            let Some(power) = integral(f64::from(p) * exponent) else {
                return Ok(None);
            };
            *slot = i8::try_from(power)
                .map_err(|_| UnitError::PowerOverflow(format!("({})^{}", self, exponent)))?;
        }
        Ok(Some(Unit::si(Dimension::from_exponents(scaled))))
    }

    /// Coherent SI unit of a dimension, e.g. `kg m / s^2`
    pub fn si(dimension: Dimension) -> Unit {
        let bases = [
            ("kg", Dimension::MASS, dimension.mass),
            ("m", Dimension::LENGTH, dimension.length),
            ("s", Dimension::TIME, dimension.time),
            ("A", Dimension::CURRENT, dimension.current),
            ("K", Dimension::TEMPERATURE, dimension.temperature),
            ("mol", Dimension::AMOUNT, dimension.amount),
            ("cd", Dimension::LUMINOSITY, dimension.luminosity),
        ];
        let factors = bases
            .into_iter()
            .filter(|(_, _, power)| *power != 0)
            .map(|(symbol, base, power)| UnitFactor {
                symbol: symbol.to_string(),
                dimension: base,
                scale: 1.0,
                power: i32::from(power),
            })
            .collect();
        Unit { factors }
    }
}

/// Nearest integer when `power` is one; saturates so range checks reject huge powers
fn integral(power: f64) -> Option<i32> {
    if !power.is_finite() || (power - power.round()).abs() > 1e-9 {
        None
    } else {
        Some(power.round() as i32)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |factor: &UnitFactor, power: i32| {
            if power == 1 {
                factor.symbol.clone()
            } else {
                format!("{}^{}", factor.symbol, power)
            }
        };
        let numerator: Vec<String> = self
            .factors
            .iter()
            .filter(|f| f.power > 0)
            .map(|f| render(f, f.power))
            .collect();
        let denominator: Vec<&UnitFactor> = self.factors.iter().filter(|f| f.power < 0).collect();

        if numerator.is_empty() {
            let parts: Vec<String> = denominator.iter().map(|f| render(f, f.power)).collect();
            return write!(f, "{}", parts.join(" "));
        }
        write!(f, "{}", numerator.join(" "))?;
        if !denominator.is_empty() {
            let parts: Vec<String> = denominator.iter().map(|f| render(f, -f.power)).collect();
            write!(f, " / {}", parts.join(" "))?;
        }
        Ok(())
    }
}

/// A value carried in SI base scale together with the unit it is expressed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    value: f64,
    unit: Unit,
}

impl Quantity {
    /// `value` is given in `unit`'s own scale.
    pub fn new(value: f64, unit: Unit) -> Self {
        Self {
            value: unit.to_base(value),
            unit,
        }
    }

    pub fn number(value: f64) -> Self {
        Self {
            value,
            unit: Unit::none(),
        }
    }

    /// Attach a plain number to a unit string.
    pub fn with_unit(value: f64, unit: &str) -> Result<Self, UnitError> {
        Ok(Self::new(value, Unit::parse(unit)?))
    }

    /// Parse text such as `0.5`, `0.5 mm` or `2e-3kg`. A number is required.
    pub fn parse(text: &str) -> Result<Self, UnitError> {
        let text = text.trim();
        let split = numeric_prefix_len(text);
        if split == 0 {
            return Err(UnitError::InvalidSyntax(text.to_string()));
        }
        let value: f64 = text[..split]
            .parse()
            .map_err(|_| UnitError::InvalidSyntax(text.to_string()))?;
        let unit = Unit::parse(text[split..].trim())?;
        Ok(Self::new(value, unit))
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Value in SI base scale
    pub fn base_value(&self) -> f64 {
        self.value
    }

    /// Value expressed in this quantity's own unit
    pub fn value_in_unit(&self) -> f64 {
        self.unit.from_base(self.value)
    }

    pub fn dimension(&self) -> Result<Dimension, UnitError> {
        self.unit.dimension()
    }

    /// No unit attached at all
    pub fn is_plain(&self) -> bool {
        self.unit.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }

    /// Natural unit string of this value
    pub fn format_units(&self) -> String {
        self.unit.to_string()
    }

    /// Convert into a plain number in `target`, failing on dimensional mismatch.
    pub fn to_number(&self, target: &Unit) -> Result<f64, UnitError> {
        if self.unit.dimension()? != target.dimension()? {
            return Err(UnitError::DimensionMismatch {
                from: self.describe_unit(),
                to: describe(target),
            });
        }
        Ok(target.from_base(self.value))
    }

    pub fn to_number_in(&self, target: &str) -> Result<f64, UnitError> {
        self.to_number(&Unit::parse(target)?)
    }

    /// SI value of a quantity that must be dimensionless (function arguments, exponents).
    pub fn dimensionless_value(&self) -> Result<f64, UnitError> {
        self.to_number(&Unit::none())
    }

    fn describe_unit(&self) -> String {
        describe(&self.unit)
    }

    /// Sum keeping the left operand's unit
    pub fn add(&self, other: &Quantity) -> Result<Quantity, UnitError> {
        self.check_same_dimension(other)?;
        Ok(Self {
            value: self.value + other.value,
            unit: self.unit.clone(),
        })
    }

    pub fn sub(&self, other: &Quantity) -> Result<Quantity, UnitError> {
        self.check_same_dimension(other)?;
        Ok(Self {
            value: self.value - other.value,
            unit: self.unit.clone(),
        })
    }

    pub fn mul(&self, other: &Quantity) -> Result<Quantity, UnitError> {
        Ok(Self {
            value: self.value * other.value,
            unit: self.unit.mul(&other.unit)?,
        })
    }

    pub fn div(&self, other: &Quantity) -> Result<Quantity, UnitError> {
        Ok(Self {
            value: self.value / other.value,
            unit: self.unit.div(&other.unit)?,
        })
    }

    pub fn scale(&self, factor: f64) -> Quantity {
        Self {
            value: self.value * factor,
            unit: self.unit.clone(),
        }
    }

    pub fn neg(&self) -> Quantity {
        self.scale(-1.0)
    }

    pub fn abs(&self) -> Quantity {
        Self {
            value: self.value.abs(),
            unit: self.unit.clone(),
        }
    }

    pub fn powi(&self, n: i32) -> Result<Quantity, UnitError> {
        Ok(Self {
            value: self.value.powi(n),
            unit: self.unit.powi(n)?,
        })
    }

    pub fn powf(&self, exponent: &Quantity) -> Result<Quantity, UnitError> {
        let e = exponent.dimensionless_value()?;
        Ok(Self {
            value: self.value.powf(e),
            unit: self.unit.powf(e)?,
        })
    }

    pub fn sqrt(&self) -> Result<Quantity, UnitError> {
        Ok(Self {
            value: self.value.sqrt(),
            unit: self.unit.powf(0.5)?,
        })
    }

    fn check_same_dimension(&self, other: &Quantity) -> Result<(), UnitError> {
        if self.dimension()? != other.dimension()? {
            return Err(UnitError::DimensionMismatch {
                from: self.describe_unit(),
                to: other.describe_unit(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value_in_unit(), self.unit)
        }
    }
}

fn describe(unit: &Unit) -> String {
    if unit.is_empty() {
        "a dimensionless value".to_string()
    } else {
        unit.to_string()
    }
}

/// Length of the leading float literal, an exponent only counts when digits follow it.
fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    let mantissa = &text[digits_start..i];
    if !mantissa.bytes().any(|b| b.is_ascii_digit()) {
        return 0;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'-' || bytes[j] == b'+') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}
