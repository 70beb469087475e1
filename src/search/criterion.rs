//! Parsed filter criteria.

use crate::search::value::Value;

/// One `key<operator>value` unit from a query string.
///
/// Criteria are immutable; the compiler derives a copy carrying the
/// converted value with [`Criterion::with_value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    key: String,
    operator: String,
    value: Value,
    or_with_previous: bool,
}

impl Criterion {
    pub fn new(
        key: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
        or_with_previous: bool,
    ) -> Self {
        Self {
            key: key.into(),
            operator: operator.into(),
            value: value.into(),
            or_with_previous,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether this criterion joins the running predicate with OR
    /// rather than AND.
    pub fn or_with_previous(&self) -> bool {
        self.or_with_previous
    }

    pub fn with_value(&self, value: Value) -> Self {
        Self {
            value,
            ..self.clone()
        }
    }
}
