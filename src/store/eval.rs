//! In-process predicate evaluation over JSON record bodies.
//!
//! The semantics mirror the SQL the SQLite backend generates, so both
//! backends return the same rows:
//! - a missing or `null` field never matches;
//! - `LIKE` is case-sensitive, `%` matches any run and `_` one char;
//! - text comparisons are byte-wise, booleans render as `1`/`0`.

use std::cmp::Ordering;

use serde_json::Value as Json;

use crate::search::predicate::Predicate;
use crate::search::value::{format_timestamp, Value};

/// Whether `doc` satisfies `predicate`.
pub fn matches(predicate: &Predicate, doc: &Json) -> bool {
    match predicate {
        Predicate::Equals { field, value } => {
            lookup(doc, field.path()).is_some_and(|found| equals(found, value))
        }
        Predicate::Like {
            field,
            pattern,
            case_insensitive,
        } => lookup(doc, field.path())
            .and_then(Json::as_str)
            .is_some_and(|text| {
                if *case_insensitive {
                    like(&text.to_lowercase(), pattern)
                } else {
                    like(text, pattern)
                }
            }),
        Predicate::AtLeast { field, value } => lookup(doc, field.path())
            .and_then(|found| compare(found, value))
            .is_some_and(|ord| ord != Ordering::Less),
        Predicate::AtMost { field, value } => lookup(doc, field.path())
            .and_then(|found| compare(found, value))
            .is_some_and(|ord| ord != Ordering::Greater),
        Predicate::Includes { field, value } => lookup(doc, field.path())
            .and_then(Json::as_array)
            .is_some_and(|items| items.iter().any(|item| equals(item, value))),
        Predicate::AnyRelated {
            collection,
            attribute,
            value,
        } => lookup(doc, collection.path())
            .and_then(Json::as_array)
            .is_some_and(|items| {
                items.iter().any(|item| {
                    lookup(item, attribute.path()).is_some_and(|found| equals(found, value))
                })
            }),
        Predicate::And(left, right) => matches(left, doc) && matches(right, doc),
        Predicate::Or(left, right) => matches(left, doc) || matches(right, doc),
    }
}

fn lookup<'a>(doc: &'a Json, path: &[&str]) -> Option<&'a Json> {
    let found = path.iter().try_fold(doc, |node, segment| node.get(*segment))?;
    (!found.is_null()).then_some(found)
}

fn equals(found: &Json, value: &Value) -> bool {
    match value {
        Value::Text(text) => found.as_str() == Some(text.as_str()),
        Value::Enum(name) => found.as_str() == Some(*name),
        Value::Integer(n) => found.as_i64() == Some(*n),
        Value::Boolean(b) => found.as_bool() == Some(*b),
        Value::Timestamp(ts) => found.as_str() == Some(format_timestamp(*ts).as_str()),
    }
}

fn compare(found: &Json, value: &Value) -> Option<Ordering> {
    match value {
        Value::Timestamp(ts) => found
            .as_str()
            .map(|text| text.cmp(format_timestamp(*ts).as_str())),
        Value::Integer(n) => found.as_i64().map(|v| v.cmp(n)),
        other => scalar_text(found).map(|text| text.as_str().cmp(other.to_string().as_str())),
    }
}

/// Text rendering of a scalar JSON value, matching SQLite's
/// `CAST(json_extract(..) AS TEXT)`.
fn scalar_text(found: &Json) -> Option<String> {
    match found {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(true) => Some("1".to_string()),
        Json::Bool(false) => Some("0".to_string()),
        Json::Null | Json::Array(_) | Json::Object(_) => None,
    }
}

/// SQL `LIKE` without an escape character.
pub fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    // Position after the last `%` and the text index it is retrying from.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p + 1, t));
            p += 1;
        } else if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if let Some((resume, from)) = backtrack {
            p = resume;
            t = from + 1;
            backtrack = Some((resume, from + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}
