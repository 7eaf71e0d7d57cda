//! Core types for the measurement model.

use super::digits;
use super::distribution::Distribution;
use super::stats;
use crate::expr::{parse_expression, Expr, ParseError};
use crate::units::{Dimension, Quantity, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Most type-B entries a direct measurement carries
pub const MAX_UNCERTAINTY_B: usize = 2;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeasurementError {
    #[error("Type-B entry {0} is out of range (at most {MAX_UNCERTAINTY_B} entries)")]
    UncertaintyBSlot(usize),
    #[error("Value index {0} is out of range")]
    ValueIndex(usize),
}

/// Identifier of a measurement or output record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A measurement name as typed, with its symbol when the text is a bare symbol.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Name {
    pub text: String,
    symbol: Option<String>,
}

impl Name {
    pub fn parse(text: &str) -> Self {
        let symbol = parse_expression(text)
            .ok()
            .and_then(|expr| expr.as_symbol().map(str::to_string));
        Self {
            text: text.to_string(),
            symbol,
        }
    }

    /// `None` when the text is empty or not a single symbol (formulas are not names)
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }
}

impl From<String> for Name {
    fn from(text: String) -> Self {
        Name::parse(&text)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.text
    }
}

/// Formula text and its parsed tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Formula {
    pub text: String,
    tree: Option<Expr>,
    error: Option<ParseError>,
}

impl Formula {
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self {
                text: text.to_string(),
                tree: None,
                error: None,
            };
        }
        match parse_expression(text) {
            Ok(tree) => Self {
                text: text.to_string(),
                tree: Some(tree),
                error: None,
            },
            Err(e) => Self {
                text: text.to_string(),
                tree: None,
                error: Some(e),
            },
        }
    }

    pub fn tree(&self) -> Option<&Expr> {
        self.tree.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn parse_error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }
}

impl From<String> for Formula {
    fn from(text: String) -> Self {
        Formula::parse(&text)
    }
}

impl From<Formula> for String {
    fn from(formula: Formula) -> Self {
        formula.text
    }
}

/// One type-B uncertainty entry: raw text and its distribution shape
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UncertaintyB {
    pub value: String,
    pub distribution: Distribution,
}

impl UncertaintyB {
    pub fn new(value: &str, distribution: Distribution) -> Self {
        Self {
            value: value.to_string(),
            distribution,
        }
    }

    /// The entry's magnitude in the measurement's unit.
    ///
    /// Blank, unparsable and zero entries give `None`, as does a unit-bearing
    /// entry whose unit cannot be converted into `unit`; such entries
    /// contribute nothing.
    pub fn parse_value(&self, unit: &str) -> Option<f64> {
        if self.value.trim().is_empty() {
            return None;
        }
        let parsed = Quantity::parse(&self.value).ok()?;
        if parsed.is_zero() {
            return None;
        }
        if parsed.is_plain() {
            return Some(parsed.base_value());
        }
        if unit.trim().is_empty() {
            return None;
        }
        parsed.to_number_in(unit).ok()
    }

    /// Blank entries are valid; anything else must parse
    pub fn is_valid(&self, unit: &str) -> bool {
        self.value.trim().is_empty() || self.parse_value(unit).is_some()
    }

    /// Standard-uncertainty contribution: value × distribution coefficient
    pub fn standard_uncertainty(&self, unit: &str) -> Option<f64> {
        self.parse_value(unit)
            .map(|v| v * self.distribution.coefficient())
    }
}

/// Default unit for a fresh name, keyed by its leading letter.
pub fn suggested_unit(name: &str) -> Option<&'static str> {
    match name.trim().chars().next()? {
        'l' | 'L' => Some("cm"),
        't' => Some("s"),
        'm' | 'M' => Some("g"),
        'F' => Some("N"),
        'U' => Some("V"),
        'I' => Some("A"),
        _ => None,
    }
}

/// A quantity backed by raw recorded samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMeasurement {
    pub id: RecordId,
    pub name: Name,
    /// Committed samples, zero-error correction applied
    pub values: Vec<f64>,
    /// Empty until the user supplies one
    pub unit: String,
    pub uncertainty_b: Vec<UncertaintyB>,
    /// Fewest significant digits among the committed inputs
    pub min_digits: usize,
    /// Raw text of each committed sample
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    zero_offset: Option<f64>,
}

impl DirectMeasurement {
    pub fn new(name: &str, unit: &str) -> Self {
        Self {
            id: RecordId::new(),
            name: Name::parse(name),
            values: Vec::new(),
            unit: unit.to_string(),
            uncertainty_b: vec![UncertaintyB::default(); MAX_UNCERTAINTY_B],
            min_digits: 0,
            inputs: Vec::new(),
            zero_offset: None,
        }
    }

    /// Build with type-B values (normal distribution); extra entries beyond two are dropped.
    pub fn with_uncertainty_b(name: &str, unit: &str, values: &[&str]) -> Self {
        let mut m = Self::new(name, unit);
        for (slot, value) in m.uncertainty_b.iter_mut().zip(values) {
            slot.value = value.to_string();
        }
        m
    }

    /// Builder form of [`commit_values`](Self::commit_values) without zero correction
    pub fn with_values<S: AsRef<str>>(mut self, raw: &[S]) -> Self {
        self.commit_values(raw, None);
        self
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn zero_offset(&self) -> Option<f64> {
        self.zero_offset
    }

    /// Zero-error correction only applies to plain length units
    pub fn supports_zero_correction(&self) -> bool {
        Unit::parse(&self.unit)
            .map(|u| !u.is_empty() && u.dimension() == Ok(Dimension::LENGTH))
            .unwrap_or(false)
    }

    /// Commit raw inputs: blank or non-numeric entries are skipped, the
    /// zero-error offset is subtracted when the unit allows it, and
    /// `min_digits` is recomputed from the surviving inputs.
    pub fn commit_values<S: AsRef<str>>(&mut self, raw: &[S], zero_offset: Option<f64>) {
        self.inputs = raw
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| digits::parse_input(s).is_some())
            .map(str::to_string)
            .collect();
        self.zero_offset = zero_offset;
        self.recompute();
    }

    fn recompute(&mut self) {
        let offset = if self.supports_zero_correction() {
            self.zero_offset.unwrap_or(0.0)
        } else {
            0.0
        };
        self.values = self
            .inputs
            .iter()
            .filter_map(|s| digits::parse_input(s))
            .map(|v| v - offset)
            .collect();
        self.min_digits = digits::min_digits(&self.inputs);
    }

    pub fn remove_value(&mut self, index: usize) -> Result<(), MeasurementError> {
        if index >= self.inputs.len() {
            return Err(MeasurementError::ValueIndex(index));
        }
        self.inputs.remove(index);
        self.recompute();
        Ok(())
    }

    /// Change the unit; values are re-derived since zero correction depends on it
    pub fn set_unit(&mut self, unit: &str) {
        self.unit = unit.to_string();
        self.recompute();
    }

    /// Rename, filling in a suggested unit while none is set
    pub fn rename(&mut self, name: &str) {
        self.name = Name::parse(name);
        if self.unit.is_empty() {
            if let Some(unit) = suggested_unit(name) {
                self.set_unit(unit);
            }
        }
    }

    pub fn set_uncertainty_b(
        &mut self,
        index: usize,
        value: &str,
        distribution: Distribution,
    ) -> Result<(), MeasurementError> {
        if index >= MAX_UNCERTAINTY_B {
            return Err(MeasurementError::UncertaintyBSlot(index));
        }
        while self.uncertainty_b.len() <= index {
            self.uncertainty_b.push(UncertaintyB::default());
        }
        self.uncertainty_b[index] = UncertaintyB::new(value, distribution);
        Ok(())
    }

    /// Clear an entry; the slot stays so at most two entries ever exist
    pub fn remove_uncertainty_b(&mut self, index: usize) -> Result<(), MeasurementError> {
        let slot = self
            .uncertainty_b
            .get_mut(index)
            .ok_or(MeasurementError::UncertaintyBSlot(index))?;
        *slot = UncertaintyB::default();
        Ok(())
    }

    /// Arithmetic mean of the samples in the measurement's own unit
    pub fn mean_value(&self) -> Option<f64> {
        stats::mean(&self.values)
    }

    /// Sample variance over n, in the measurement's unit squared
    pub fn type_a_variance(&self) -> Option<f64> {
        stats::variance_of_mean(&self.values)
    }

    /// Sum of squared type-B standard uncertainties, in the measurement's unit squared
    pub fn type_b_variance(&self) -> f64 {
        self.uncertainty_b
            .iter()
            .take(MAX_UNCERTAINTY_B)
            .filter_map(|u| u.standard_uncertainty(&self.unit))
            .map(|u| u * u)
            .sum()
    }
}

/// A quantity defined as a formula over other measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeMeasurement {
    pub id: RecordId,
    pub name: Name,
    pub formula: Formula,
}

impl CompositeMeasurement {
    pub fn new(name: &str, formula: &str) -> Self {
        Self {
            id: RecordId::new(),
            name: Name::parse(name),
            formula: Formula::parse(formula),
        }
    }

    pub fn set_formula(&mut self, formula: &str) {
        self.formula = Formula::parse(formula);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Measurement {
    Direct(DirectMeasurement),
    Composite(CompositeMeasurement),
}

impl Measurement {
    pub fn id(&self) -> RecordId {
        match self {
            Measurement::Direct(m) => m.id,
            Measurement::Composite(m) => m.id,
        }
    }

    pub fn name(&self) -> &Name {
        match self {
            Measurement::Direct(m) => &m.name,
            Measurement::Composite(m) => &m.name,
        }
    }

    pub fn name_mut(&mut self) -> &mut Name {
        match self {
            Measurement::Direct(m) => &mut m.name,
            Measurement::Composite(m) => &mut m.name,
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        self.name().symbol()
    }

    /// Name text for diagnostics, falling back to the id
    pub fn label(&self) -> String {
        match self.symbol() {
            Some(symbol) => symbol.to_string(),
            None => self.id().to_string(),
        }
    }
}

impl From<DirectMeasurement> for Measurement {
    fn from(m: DirectMeasurement) -> Self {
        Measurement::Direct(m)
    }
}

impl From<CompositeMeasurement> for Measurement {
    fn from(m: CompositeMeasurement) -> Self {
        Measurement::Composite(m)
    }
}

/// Display configuration pointing at a measurement by symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub id: RecordId,
    pub name: String,
    pub display_unit: Option<String>,
}

impl Output {
    pub fn new(name: &str, display_unit: Option<&str>) -> Self {
        Self {
            id: RecordId::new(),
            name: name.to_string(),
            display_unit: display_unit
                .filter(|u| !u.trim().is_empty())
                .map(str::to_string),
        }
    }
}
