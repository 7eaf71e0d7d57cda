use crate::expr::EvalError;
use crate::units::UnitError;
use thiserror::Error;

/// Why a mean, uncertainty or digit count could not be produced
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    /// No formula text yet; a "not configured" state rather than a user error
    #[error("Formula is empty")]
    EmptyFormula,
    #[error("Formula could not be parsed: {0}")]
    UnparsableFormula(String),
    #[error("Undefined measurement: {0}")]
    UndefinedMeasurement(String),
    /// Names along the dependency path, ending with the one that closes the cycle
    #[error("Cyclic reference: {}", .0.join(" → "))]
    CyclicReference(Vec<String>),
    #[error("Units do not match: {0}")]
    UnitMismatch(String),
    #[error("Invalid unit: {0}")]
    InvalidUnit(String),
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),
}

impl From<EvalError> for PropagationError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::UndefinedSymbol(name) => PropagationError::UndefinedMeasurement(name),
            EvalError::UnitMismatch(msg) => PropagationError::UnitMismatch(msg),
            other => PropagationError::InvalidExpression(other.to_string()),
        }
    }
}

impl From<UnitError> for PropagationError {
    fn from(err: UnitError) -> Self {
        PropagationError::UnitMismatch(err.to_string())
    }
}
