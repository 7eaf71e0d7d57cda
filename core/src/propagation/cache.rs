//! Memoized symbolic partial derivatives.

use crate::expr::{differentiate, Expr};
use std::collections::HashMap;
use tracing::trace;
use uuid::Uuid;

/// Derivatives keyed by the formula's canonical text and the variable name.
///
/// Editing a formula changes its canonical text and therefore its key, so an
/// entry is never stale. Entries live as long as the cache does.
#[derive(Debug, Default, Clone)]
pub struct DerivativeCache {
    entries: HashMap<Uuid, Expr>,
}

impl DerivativeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable key for (tree, variable).
    /// UUID v5 over the canonical text, with a NUL separating the variable.
    pub fn key(tree: &Expr, variable: &str) -> Uuid {
        let seed = format!("{}\u{0}{}", tree, variable);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())
    }

    pub fn derivative(&mut self, tree: &Expr, variable: &str) -> &Expr {
        let key = Self::key(tree, variable);
        self.entries.entry(key).or_insert_with(|| {
            trace!(%tree, variable, "derivative cache miss");
            differentiate(tree, variable)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
