//! Uncertainty propagation over the measurement graph.
//!
//! Provides:
//! - Dependency resolution from formula symbols to measurement records
//! - Mean evaluation with "not yet measurable" propagation
//! - Combined variance by the linearized propagation law
//! - Significant-digit propagation
//! - A derivative cache owned by the session that performs propagation

pub mod cache;
pub mod error;
pub mod evaluator;
pub mod resolve;


pub use cache::DerivativeCache;
pub use error::PropagationError;
pub use evaluator::{combined_variance, mean, min_digits, uncertainty, EvalContext};
pub use resolve::resolve_dependencies;

use crate::expr::Bindings;
use crate::measurement::{Measurement, UncertaintyTypes};
use crate::units::Quantity;

/// Session-owned constants and derivative cache.
#[derive(Debug, Clone, Default)]
pub struct Propagator {
    constants: Bindings,
    cache: DerivativeCache,
}

impl Propagator {
    pub fn new(constants: Bindings) -> Self {
        Self {
            constants,
            cache: DerivativeCache::new(),
        }
    }

    pub fn constants(&self) -> &Bindings {
        &self.constants
    }

    /// Replace the constants; cached derivatives stay valid since they are symbolic
    pub fn set_constants(&mut self, constants: Bindings) {
        self.constants = constants;
    }

    pub fn cache(&self) -> &DerivativeCache {
        &self.cache
    }

    pub fn mean(
        &mut self,
        measurement: &Measurement,
        all: &[Measurement],
    ) -> Result<Option<Quantity>, PropagationError> {
        mean(measurement, all, &self.constants, &mut self.cache)
    }

    pub fn combined_variance(
        &mut self,
        measurement: &Measurement,
        all: &[Measurement],
        types: UncertaintyTypes,
    ) -> Result<Option<Quantity>, PropagationError> {
        combined_variance(measurement, all, &self.constants, &mut self.cache, types)
    }

    pub fn uncertainty(
        &mut self,
        measurement: &Measurement,
        all: &[Measurement],
        types: UncertaintyTypes,
    ) -> Result<Option<Quantity>, PropagationError> {
        uncertainty(measurement, all, &self.constants, &mut self.cache, types)
    }

    pub fn min_digits(
        &self,
        measurement: &Measurement,
        all: &[Measurement],
    ) -> Result<usize, PropagationError> {
        min_digits(measurement, all, &self.constants)
    }
}
