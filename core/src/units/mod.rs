//! Unit algebra for measured values.
//!
//! Provides:
//! - Dimensional bookkeeping over the SI base quantities
//! - Parsing of unit strings (`cm`, `kg*m/s^2`, `g cm / s^2`) and quantity strings (`0.5 mm`)
//! - Unit-tagged arithmetic that fails on dimensionally incompatible operations
//! - Conversion of a tagged value into a plain number in a requested unit

pub mod catalog;
pub mod dimension;
pub mod quantity;

pub use dimension::Dimension;
pub use quantity::{Quantity, Unit, UnitError, UnitFactor};
