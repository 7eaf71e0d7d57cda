//! Mapping a composite formula's free symbols onto measurement records.

use super::error::PropagationError;
use crate::expr::{Bindings, Expr, MathConstant};
use crate::measurement::{CompositeMeasurement, Measurement};
use tracing::trace;

/// The composite's parsed tree, or why there is none
pub(crate) fn formula_tree(
    measurement: &CompositeMeasurement,
) -> Result<&Expr, PropagationError> {
    let formula = &measurement.formula;
    if formula.is_empty() {
        return Err(PropagationError::EmptyFormula);
    }
    formula.tree().ok_or_else(|| {
        PropagationError::UnparsableFormula(
            formula
                .parse_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| formula.text.clone()),
        )
    })
}

/// Measurements directly referenced by `measurement`'s formula.
///
/// Each distinct free symbol maps to the first other measurement carrying
/// that symbol. The result keeps first-encounter order without duplicates
/// and is not transitive. A symbol that only names a caller constant or a
/// built-in constant is not a dependency; a symbol that only names
/// `measurement` itself is a cycle of length one.
pub fn resolve_dependencies<'a>(
    measurement: &CompositeMeasurement,
    all: &'a [Measurement],
    constants: &Bindings,
) -> Result<Vec<&'a Measurement>, PropagationError> {
    let tree = formula_tree(measurement)?;
    let mut dependencies: Vec<&'a Measurement> = Vec::new();

    for symbol in tree.free_symbols() {
        let found = all
            .iter()
            .find(|m| m.symbol() == Some(symbol.as_str()) && m.id() != measurement.id);

        match found {
            Some(dep) => {
                if !dependencies.iter().any(|d| d.id() == dep.id()) {
                    dependencies.push(dep);
                }
            }
            None if measurement.name.symbol() == Some(symbol.as_str()) => {
                trace!(symbol = %symbol, "formula refers to its own measurement");
                return Err(PropagationError::CyclicReference(vec![symbol.clone(), symbol]));
            }
            None if constants.contains_key(&symbol) => {}
            None if MathConstant::from_name(&symbol).is_some() => {}
            None => return Err(PropagationError::UndefinedMeasurement(symbol)),
        }
    }

    Ok(dependencies)
}
