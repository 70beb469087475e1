//! Search operators and the operator registry.
//!
//! An operator turns a resolved field plus a criterion into a
//! [`Compiled`] result. The registry maps operator literals (`=`,
//! `:`, `:~`, `:=`, `>`, `<`) to their default behavior. It is built
//! once and frozen: nothing can register into an `OperatorRegistry`
//! after `OperatorRegistryBuilder::build`, so shared references are
//! safe to read from any number of threads.

mod builtin;
mod overrides;

pub use builtin::{
    CaseInsensitiveLikeOperator, ContainsOperator, EqualsOperator, GreaterLessThanOperator,
    LikeOperator,
};
pub use overrides::OperatorOverrides;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use lazy_static::lazy_static;

use crate::search::criterion::Criterion;
use crate::search::error::SearchError;
use crate::search::predicate::Compiled;
use crate::search::schema::Field;

/// A named comparison strategy.
///
/// Implementations are stateless. `operate` receives a criterion whose
/// key has already been mapped and whose value has already been run
/// through the entity's converter.
pub trait SearchOperator: fmt::Debug + Send + Sync {
    /// Literal that selects this operator in a query string.
    fn literal(&self) -> &'static str;

    fn operate(&self, field: &Field, criterion: &Criterion) -> Result<Compiled>;
}

lazy_static! {
    static ref STANDARD: OperatorRegistry = OperatorRegistry::standard();
}

/// Frozen mapping of operator literal to default behavior.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    operators: BTreeMap<&'static str, Arc<dyn SearchOperator>>,
}

impl OperatorRegistry {
    pub fn builder() -> OperatorRegistryBuilder {
        OperatorRegistryBuilder::default()
    }

    /// Registry holding the six built-in operators.
    pub fn standard() -> Self {
        Self::builder()
            .register(EqualsOperator)
            .register(LikeOperator)
            .register(CaseInsensitiveLikeOperator)
            .register(ContainsOperator)
            .register(GreaterLessThanOperator::greater_or_equal())
            .register(GreaterLessThanOperator::less_or_equal())
            .build()
    }

    /// Process-wide standard registry, initialized on first use.
    pub fn global() -> &'static OperatorRegistry {
        &STANDARD
    }

    pub fn get(&self, literal: &str) -> Option<&dyn SearchOperator> {
        self.operators.get(literal).map(|op| op.as_ref())
    }

    /// Look up `literal`, failing with `UnknownOperator` when absent.
    pub fn resolve(&self, literal: &str) -> Result<&dyn SearchOperator, SearchError> {
        self.get(literal).ok_or_else(|| SearchError::UnknownOperator {
            literal: literal.to_string(),
        })
    }

    pub fn literals(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.operators.keys().copied()
    }
}

/// Collects operators before freezing them into a registry.
#[derive(Debug, Default)]
pub struct OperatorRegistryBuilder {
    operators: BTreeMap<&'static str, Arc<dyn SearchOperator>>,
}

impl OperatorRegistryBuilder {
    /// Add an operator. A later registration for the same literal
    /// replaces the earlier one.
    pub fn register(mut self, operator: impl SearchOperator + 'static) -> Self {
        self.operators.insert(operator.literal(), Arc::new(operator));
        self
    }

    pub fn build(self) -> OperatorRegistry {
        OperatorRegistry {
            operators: self.operators,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_six_builtins() {
        let registry = OperatorRegistry::standard();
        let literals: Vec<_> = registry.literals().collect();
        assert_eq!(literals, vec![":", ":=", ":~", "<", "=", ">"]);
    }

    #[test]
    fn unknown_literal_fails_fast() {
        let registry = OperatorRegistry::standard();
        let err = registry.resolve("!=").unwrap_err();
        assert!(matches!(err, SearchError::UnknownOperator { ref literal } if literal == "!="));
    }

    #[test]
    fn global_registry_is_shared() {
        let first = OperatorRegistry::global() as *const OperatorRegistry;
        let second = OperatorRegistry::global() as *const OperatorRegistry;
        assert_eq!(first, second);
        assert!(OperatorRegistry::global().get("=").is_some());
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let registry = OperatorRegistry::builder()
            .register(EqualsOperator)
            .register(EqualsOperator)
            .build();
        assert_eq!(registry.literals().count(), 1);
    }
}
