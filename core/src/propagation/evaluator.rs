//! Recursive mean, variance and digit evaluation over the measurement graph.

use super::cache::DerivativeCache;
use super::error::PropagationError;
use super::resolve::{formula_tree, resolve_dependencies};
use crate::expr::{evaluate, Bindings};
use crate::measurement::{
    CompositeMeasurement, DirectMeasurement, Measurement, RecordId, UncertaintyTypes,
};
use crate::units::{Quantity, Unit};
use std::collections::HashMap;
use tracing::debug;

/// State threaded through one top-level evaluation.
pub struct EvalContext<'a> {
    all: &'a [Measurement],
    constants: &'a Bindings,
    cache: &'a mut DerivativeCache,
    /// Composites currently being evaluated, outermost first
    path: Vec<(RecordId, String)>,
    means: HashMap<RecordId, Option<Quantity>>,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        all: &'a [Measurement],
        constants: &'a Bindings,
        cache: &'a mut DerivativeCache,
    ) -> Self {
        Self {
            all,
            constants,
            cache,
            path: Vec::new(),
            means: HashMap::new(),
        }
    }

    fn enter(&mut self, measurement: &CompositeMeasurement) -> Result<(), PropagationError> {
        let label = measurement
            .name
            .symbol()
            .map(str::to_string)
            .unwrap_or_else(|| measurement.id.to_string());
        if self.path.iter().any(|(id, _)| *id == measurement.id) {
            let mut names: Vec<String> = self.path.iter().map(|(_, n)| n.clone()).collect();
            names.push(label);
            debug!(path = ?names, "cyclic reference");
            return Err(PropagationError::CyclicReference(names));
        }
        self.path.push((measurement.id, label));
        Ok(())
    }

    fn leave(&mut self) {
        self.path.pop();
    }

    /// Unit-tagged mean, `None` while any input is not yet measurable
    pub fn mean(&mut self, measurement: &Measurement) -> Result<Option<Quantity>, PropagationError> {
        if let Some(known) = self.means.get(&measurement.id()) {
            return Ok(known.clone());
        }
        let value = match measurement {
            Measurement::Direct(m) => direct_mean(m)?,
            Measurement::Composite(m) => {
                self.enter(m)?;
                let result = self.composite_mean(m);
                self.leave();
                result?
            }
        };
        self.means.insert(measurement.id(), value.clone());
        Ok(value)
    }

    fn composite_mean(
        &mut self,
        measurement: &CompositeMeasurement,
    ) -> Result<Option<Quantity>, PropagationError> {
        let tree = formula_tree(measurement)?;
        let Some(bindings) = self.bindings(measurement)? else {
            return Ok(None);
        };
        Ok(Some(evaluate(tree, &bindings)?))
    }

    /// Constants overlaid with each dependency's mean; `None` if any mean is missing
    fn bindings(
        &mut self,
        measurement: &CompositeMeasurement,
    ) -> Result<Option<Bindings>, PropagationError> {
        let all = self.all;
        let dependencies = resolve_dependencies(measurement, all, self.constants)?;
        let mut bindings = self.constants.clone();
        for dep in dependencies {
            let Some(value) = self.mean(dep)? else {
                return Ok(None);
            };
            if let Some(symbol) = dep.symbol() {
                bindings.insert(symbol.to_string(), value);
            }
        }
        Ok(Some(bindings))
    }

    /// Combined squared uncertainty in the mean's unit squared
    pub fn combined_variance(
        &mut self,
        measurement: &Measurement,
        types: UncertaintyTypes,
    ) -> Result<Option<Quantity>, PropagationError> {
        match measurement {
            Measurement::Direct(m) => direct_variance(m, types),
            Measurement::Composite(m) => {
                self.enter(m)?;
                let result = self.composite_variance(m, types);
                self.leave();
                result
            }
        }
    }

    fn composite_variance(
        &mut self,
        measurement: &CompositeMeasurement,
        types: UncertaintyTypes,
    ) -> Result<Option<Quantity>, PropagationError> {
        let tree = formula_tree(measurement)?;
        let Some(bindings) = self.bindings(measurement)? else {
            return Ok(None);
        };
        let mean = evaluate(tree, &bindings)?;
        let mut total = Quantity::new(0.0, mean.unit().powi(2)?);

        let all = self.all;
        for dep in resolve_dependencies(measurement, all, self.constants)? {
            let Some(symbol) = dep.symbol() else {
                continue;
            };
            let Some(variance) = self.combined_variance(dep, types)? else {
                return Ok(None);
            };
            if variance.is_zero() {
                continue;
            }
            let partial = evaluate(self.cache.derivative(tree, symbol), &bindings)?;
            let term = partial.powi(2)?.mul(&variance)?;
            total = total.add(&term)?;
        }
        Ok(Some(total))
    }

    /// Fewest significant input digits anywhere below `measurement`
    pub fn min_digits(&mut self, measurement: &Measurement) -> Result<usize, PropagationError> {
        match measurement {
            Measurement::Direct(m) => Ok(m.min_digits),
            Measurement::Composite(m) => {
                self.enter(m)?;
                let result = self.composite_min_digits(m);
                self.leave();
                result
            }
        }
    }

    fn composite_min_digits(
        &mut self,
        measurement: &CompositeMeasurement,
    ) -> Result<usize, PropagationError> {
        let all = self.all;
        let mut digits: Option<usize> = None;
        for dep in resolve_dependencies(measurement, all, self.constants)? {
            let d = self.min_digits(dep)?;
            digits = Some(digits.map_or(d, |current| current.min(d)));
        }
        Ok(digits.unwrap_or(0))
    }
}

fn direct_unit(measurement: &DirectMeasurement) -> Result<Unit, PropagationError> {
    Unit::parse(&measurement.unit)
        .map_err(|e| PropagationError::InvalidUnit(format!("{}: {}", measurement.unit, e)))
}

fn direct_mean(measurement: &DirectMeasurement) -> Result<Option<Quantity>, PropagationError> {
    let Some(mean) = measurement.mean_value() else {
        return Ok(None);
    };
    Ok(Some(Quantity::new(mean, direct_unit(measurement)?)))
}

fn direct_variance(
    measurement: &DirectMeasurement,
    types: UncertaintyTypes,
) -> Result<Option<Quantity>, PropagationError> {
    let unit = direct_unit(measurement)?;
    let mut sum = 0.0;
    if types.type_a {
        let Some(variance) = measurement.type_a_variance() else {
            return Ok(None);
        };
        sum += variance;
    }
    if types.type_b {
        for entry in &measurement.uncertainty_b {
            if !entry.is_valid(&measurement.unit) {
                debug!(value = %entry.value, unit = %measurement.unit, "ignoring type-B entry");
            }
        }
        sum += measurement.type_b_variance();
    }
    Ok(Some(Quantity::new(sum, unit.powi(2)?)))
}

/// Mean of `measurement`, or `None` while it is not yet measurable.
pub fn mean(
    measurement: &Measurement,
    all: &[Measurement],
    constants: &Bindings,
    cache: &mut DerivativeCache,
) -> Result<Option<Quantity>, PropagationError> {
    EvalContext::new(all, constants, cache).mean(measurement)
}

/// Var(f) = Σ (∂f/∂xᵢ)² Var(xᵢ), linearized at the dependency means.
pub fn combined_variance(
    measurement: &Measurement,
    all: &[Measurement],
    constants: &Bindings,
    cache: &mut DerivativeCache,
    types: UncertaintyTypes,
) -> Result<Option<Quantity>, PropagationError> {
    EvalContext::new(all, constants, cache).combined_variance(measurement, types)
}

/// Square root of [`combined_variance`]
pub fn uncertainty(
    measurement: &Measurement,
    all: &[Measurement],
    constants: &Bindings,
    cache: &mut DerivativeCache,
    types: UncertaintyTypes,
) -> Result<Option<Quantity>, PropagationError> {
    combined_variance(measurement, all, constants, cache, types)?
        .map(|variance| variance.sqrt())
        .transpose()
        .map_err(|e| PropagationError::UnitMismatch(e.to_string()))
}

pub fn min_digits(
    measurement: &Measurement,
    all: &[Measurement],
    constants: &Bindings,
) -> Result<usize, PropagationError> {
    let mut cache = DerivativeCache::new();
    EvalContext::new(all, constants, &mut cache).min_digits(measurement)
}
