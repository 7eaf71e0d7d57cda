//! Measurement records.
//!
//! Provides the data the propagation engine works over:
//! - Direct measurements backed by raw samples and type-B entries
//! - Composite measurements defined by a formula over other names
//! - Output display configurations
//! - Session settings and the constants they bind

pub mod digits;
pub mod distribution;
pub mod settings;
pub mod stats;
pub mod types;

#[cfg(test)]
mod tests;

pub use digits::{min_digits, significant_digits, split_input};
pub use distribution::Distribution;
pub use settings::{Settings, UncertaintyTypes, DEFAULT_GRAVITY, GRAVITY_SYMBOL};
pub use types::{
    suggested_unit, CompositeMeasurement, DirectMeasurement, Formula, Measurement,
    MeasurementError, Name, Output, RecordId, UncertaintyB, MAX_UNCERTAINTY_B,
};
