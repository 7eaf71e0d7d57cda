pub mod document;
pub mod expr;
pub mod format;
pub mod measurement;
pub mod propagation;
pub mod record;
pub mod report;
pub mod units;

pub fn version() -> &'static str {
    "0.1.0"
}
