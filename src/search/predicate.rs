//! Backend-agnostic compiled predicates.
//!
//! Operators produce [`Compiled`] values; stores interpret the inner
//! [`Predicate`] tree against their own record representation.

use crate::search::schema::Field;
use crate::search::value::Value;

/// Boolean test over one stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Field equals the value.
    Equals { field: Field, value: Value },
    /// SQL `LIKE` match with `%` and `_` wildcards. When
    /// `case_insensitive` is set the field is lower-cased before
    /// matching and the pattern is expected to be lower-case already.
    Like {
        field: Field,
        pattern: String,
        case_insensitive: bool,
    },
    /// Field is greater than or equal to the value.
    AtLeast { field: Field, value: Value },
    /// Field is less than or equal to the value.
    AtMost { field: Field, value: Value },
    /// List field contains the value.
    Includes { field: Field, value: Value },
    /// Some element of `collection` has `attribute` equal to `value`.
    AnyRelated {
        collection: Field,
        attribute: Field,
        value: Value,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

/// Result of compiling one criterion or a whole query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compiled {
    /// Matches every record.
    NoRestriction,
    Restrict(Predicate),
}

impl Compiled {
    /// Conjunction. `NoRestriction` is the identity.
    pub fn and(self, other: Compiled) -> Compiled {
        match (self, other) {
            (Compiled::NoRestriction, other) | (other, Compiled::NoRestriction) => other,
            (Compiled::Restrict(left), Compiled::Restrict(right)) => {
                Compiled::Restrict(Predicate::And(Box::new(left), Box::new(right)))
            }
        }
    }

    /// Disjunction. `NoRestriction` absorbs the other side.
    pub fn or(self, other: Compiled) -> Compiled {
        match (self, other) {
            (Compiled::NoRestriction, _) | (_, Compiled::NoRestriction) => {
                Compiled::NoRestriction
            }
            (Compiled::Restrict(left), Compiled::Restrict(right)) => {
                Compiled::Restrict(Predicate::Or(Box::new(left), Box::new(right)))
            }
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Compiled::NoRestriction)
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        match self {
            Compiled::NoRestriction => None,
            Compiled::Restrict(predicate) => Some(predicate),
        }
    }
}

impl From<Predicate> for Compiled {
    fn from(predicate: Predicate) -> Self {
        Compiled::Restrict(predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::RecordTable;
    use crate::search::schema::Root;

    fn equals(key: &str, value: &str) -> Compiled {
        let field = Root::table(RecordTable::Account)
            .resolve([key])
            .expect("field");
        Predicate::Equals {
            field,
            value: Value::from(value),
        }
        .into()
    }

    #[test]
    fn no_restriction_is_identity_under_and() {
        let restricted = equals("username", "jdoe");
        assert_eq!(Compiled::NoRestriction.and(restricted.clone()), restricted);
        assert_eq!(restricted.clone().and(Compiled::NoRestriction), restricted);
    }

    #[test]
    fn no_restriction_absorbs_under_or() {
        let restricted = equals("username", "jdoe");
        assert!(Compiled::NoRestriction.or(restricted.clone()).is_unrestricted());
        assert!(restricted.or(Compiled::NoRestriction).is_unrestricted());
    }

    #[test]
    fn restrictions_combine_into_tree() {
        let combined = equals("username", "a").and(equals("email", "b"));
        assert!(matches!(
            combined.predicate(),
            Some(Predicate::And(_, _))
        ));
    }
}
