use anyhow::Result;

use crate::search::criterion::Criterion;
use crate::search::operators::SearchOperator;
use crate::search::predicate::{Compiled, Predicate};
use crate::search::schema::Field;
use crate::search::value::{parse_timestamp, Value};

/// `=`: exact equality on any scalar field.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualsOperator;

impl SearchOperator for EqualsOperator {
    fn literal(&self) -> &'static str {
        "="
    }

    fn operate(&self, field: &Field, criterion: &Criterion) -> Result<Compiled> {
        let value = criterion.value().coerce_to(field.ty())?;
        Ok(Predicate::Equals {
            field: field.clone(),
            value,
        }
        .into())
    }
}

/// `:`: substring match on text fields, equality elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LikeOperator;

impl SearchOperator for LikeOperator {
    fn literal(&self) -> &'static str {
        ":"
    }

    fn operate(&self, field: &Field, criterion: &Criterion) -> Result<Compiled> {
        if !field.ty().is_textual() {
            return EqualsOperator.operate(field, criterion);
        }
        Ok(Predicate::Like {
            field: field.clone(),
            pattern: format!("%{}%", criterion.value()),
            case_insensitive: false,
        }
        .into())
    }
}

/// `:~`: substring match ignoring case on text fields, equality
/// elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveLikeOperator;

impl SearchOperator for CaseInsensitiveLikeOperator {
    fn literal(&self) -> &'static str {
        ":~"
    }

    fn operate(&self, field: &Field, criterion: &Criterion) -> Result<Compiled> {
        if !field.ty().is_textual() {
            return EqualsOperator.operate(field, criterion);
        }
        Ok(Predicate::Like {
            field: field.clone(),
            pattern: format!("%{}%", criterion.value().to_string().to_lowercase()),
            case_insensitive: true,
        }
        .into())
    }
}

/// `:=`: substring match on text, membership on lists. Any other field
/// type is left unrestricted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainsOperator;

impl SearchOperator for ContainsOperator {
    fn literal(&self) -> &'static str {
        ":="
    }

    fn operate(&self, field: &Field, criterion: &Criterion) -> Result<Compiled> {
        if field.ty().is_textual() {
            return LikeOperator.operate(field, criterion);
        }
        match field.ty().element() {
            Some(element) => Ok(Predicate::Includes {
                field: field.clone(),
                value: criterion.value().coerce_to(element)?,
            }
            .into()),
            None => Ok(Compiled::NoRestriction),
        }
    }
}

/// `>` and `<`.
///
/// Timestamp fields compare chronologically; a value that is neither
/// an ISO date-time nor a plain date leaves the field unrestricted.
/// Every other field type compares as text with "less or equal" for
/// both literals.
#[derive(Debug, Clone, Copy)]
pub struct GreaterLessThanOperator {
    greater: bool,
}

impl GreaterLessThanOperator {
    pub fn greater_or_equal() -> Self {
        Self { greater: true }
    }

    pub fn less_or_equal() -> Self {
        Self { greater: false }
    }
}

impl SearchOperator for GreaterLessThanOperator {
    fn literal(&self) -> &'static str {
        if self.greater {
            ">"
        } else {
            "<"
        }
    }

    fn operate(&self, field: &Field, criterion: &Criterion) -> Result<Compiled> {
        if !field.ty().is_temporal() {
            // `>` does not invert here; both literals mean "<=" on text.
            return Ok(Predicate::AtMost {
                field: field.clone(),
                value: Value::Text(criterion.value().to_string()),
            }
            .into());
        }

        let instant = match criterion.value() {
            Value::Timestamp(ts) => Some(*ts),
            Value::Text(raw) => parse_timestamp(raw),
            _ => None,
        };
        let Some(instant) = instant else {
            tracing::debug!(
                field = %field.dotted(),
                value = %criterion.value(),
                "unparsable date; leaving field unrestricted"
            );
            return Ok(Compiled::NoRestriction);
        };

        let field = field.clone();
        let value = Value::Timestamp(instant);
        Ok(if self.greater {
            Predicate::AtLeast { field, value }
        } else {
            Predicate::AtMost { field, value }
        }
        .into())
    }
}
