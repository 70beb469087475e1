use std::collections::HashMap;
use std::sync::Arc;

use crate::search::error::SearchError;
use crate::search::operators::{OperatorRegistry, SearchOperator};

/// Per-field replacements for registry operators.
///
/// Keyed by the mapped field key and then by operator literal. An
/// override only applies to its own key; every other key keeps the
/// registry's behavior for the same literal.
#[derive(Debug, Clone, Default)]
pub struct OperatorOverrides {
    by_key: HashMap<String, HashMap<&'static str, Arc<dyn SearchOperator>>>,
}

impl OperatorOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, operator: impl SearchOperator + 'static) -> Self {
        self.by_key
            .entry(key.into())
            .or_default()
            .insert(operator.literal(), Arc::new(operator));
        self
    }

    pub fn get(&self, key: &str, literal: &str) -> Option<&dyn SearchOperator> {
        self.by_key
            .get(key)
            .and_then(|ops| ops.get(literal))
            .map(|op| op.as_ref())
    }

    /// Override for `(key, literal)` if any, else the registry entry.
    pub fn resolve<'a>(
        &'a self,
        key: &str,
        literal: &str,
        registry: &'a OperatorRegistry,
    ) -> Result<&'a dyn SearchOperator, SearchError> {
        match self.get(key, literal) {
            Some(operator) => Ok(operator),
            None => registry.resolve(literal),
        }
    }

    /// `(key, literal)` pairs, sorted for display.
    pub fn entries(&self) -> Vec<(&str, &'static str)> {
        let mut entries: Vec<_> = self
            .by_key
            .iter()
            .flat_map(|(key, ops)| ops.keys().map(move |literal| (key.as_str(), *literal)))
            .collect();
        entries.sort();
        entries
    }
}
