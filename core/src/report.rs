//! Evaluated output values in their display unit.

use crate::document::Document;
use crate::format;
use crate::measurement::Output;
use crate::propagation::{PropagationError, Propagator};
use crate::units::Unit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputReport {
    pub name: String,
    /// Display unit; empty for a plain number
    pub unit: String,
    pub mean: f64,
    /// Absent when the combined uncertainty is exactly zero
    pub uncertainty: Option<f64>,
    pub relative_uncertainty: Option<f64>,
    pub min_digits: usize,
}

impl OutputReport {
    fn with_unit(&self, text: String) -> String {
        if self.unit.is_empty() {
            text
        } else {
            format!("{} {}", text, self.unit)
        }
    }

    /// Mean with `precision` significant digits and its unit
    pub fn mean_text(&self, precision: usize) -> String {
        self.with_unit(format::to_precision(self.mean, precision))
    }

    pub fn uncertainty_text(&self, precision: usize) -> Option<String> {
        self.uncertainty
            .map(|u| self.with_unit(format::to_precision(u, precision)))
    }

    /// `mean(uncertainty)` form with `digits` uncertainty digits
    pub fn concise_text(&self, digits: usize) -> Option<String> {
        self.uncertainty
            .map(|u| self.with_unit(format::concise(self.mean, u, digits)))
    }

    pub fn relative_text(&self, precision: usize) -> Option<String> {
        self.uncertainty
            .and_then(|u| format::relative(u, self.mean, precision))
    }
}

/// Evaluate `output` against the document.
///
/// `Ok(None)` when the output names no measurement or a value is not yet
/// measurable.
pub fn evaluate_output(
    output: &Output,
    document: &Document,
    propagator: &mut Propagator,
) -> Result<Option<OutputReport>, PropagationError> {
    let Some(measurement) = document.find_by_symbol(&output.name) else {
        return Ok(None);
    };
    let all = &document.measurements;

    let Some(mean) = propagator.mean(measurement, all)? else {
        return Ok(None);
    };
    let Some(uncertainty) = propagator.uncertainty(measurement, all, document.uncertainty_types)?
    else {
        return Ok(None);
    };

    let unit_text = output
        .display_unit
        .clone()
        .unwrap_or_else(|| mean.format_units());
    let unit = Unit::parse(&unit_text)
        .map_err(|e| PropagationError::InvalidUnit(format!("{}: {}", unit_text, e)))?;

    let mean_value = mean.to_number(&unit)?;
    let uncertainty_value = if uncertainty.is_zero() {
        None
    } else {
        Some(uncertainty.to_number(&unit)?)
    };
    let relative_uncertainty = uncertainty_value
        .filter(|_| mean_value != 0.0)
        .map(|u| u / mean_value.abs());

    Ok(Some(OutputReport {
        name: output.name.clone(),
        unit: unit_text,
        mean: mean_value,
        uncertainty: uncertainty_value,
        relative_uncertainty,
        min_digits: propagator.min_digits(measurement, all)?,
    }))
}
