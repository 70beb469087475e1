//! Typed criterion values and timestamp helpers.

use std::fmt;

use anyhow::{anyhow, bail, Result};
use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

use crate::search::schema::FieldType;

/// A criterion value.
///
/// The parser always produces `Text`; value converters and operators
/// turn it into the type the target field declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Boolean(bool),
    /// Variant name of a known enumeration.
    Enum(&'static str),
    Timestamp(PrimitiveDateTime),
}

impl Value {
    /// Coerce this value into the representation stored for `ty`.
    ///
    /// Already-typed values pass through when they fit. Text is parsed.
    pub fn coerce_to(&self, ty: FieldType) -> Result<Value> {
        match (ty, self) {
            (FieldType::Text, Value::Text(_)) => Ok(self.clone()),
            (FieldType::Text, other) => Ok(Value::Text(other.to_string())),
            (FieldType::Integer, Value::Integer(_)) => Ok(self.clone()),
            (FieldType::Integer, Value::Text(raw)) => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| anyhow!("`{raw}` is not an integer")),
            (FieldType::Boolean, Value::Boolean(_)) => Ok(self.clone()),
            (FieldType::Boolean, Value::Text(raw)) => match raw.trim() {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => bail!("`{raw}` is not a boolean"),
            },
            (FieldType::Enum(names), Value::Enum(name)) if names.contains(name) => Ok(self.clone()),
            (FieldType::Enum(names), Value::Text(raw)) => names
                .iter()
                .find(|name| **name == raw.as_str())
                .map(|name| Value::Enum(*name))
                .ok_or_else(|| anyhow!("`{raw}` is not one of {}", names.join(", "))),
            (FieldType::Timestamp, Value::Timestamp(_)) => Ok(self.clone()),
            (FieldType::Timestamp, Value::Text(raw)) => parse_timestamp(raw)
                .map(Value::Timestamp)
                .ok_or_else(|| anyhow!("`{raw}` is not a date or date-time")),
            (FieldType::Object(_) | FieldType::List(_), _) => {
                bail!("cannot compare a {} field to a single value", ty.describe())
            }
            (ty, other) => bail!("`{other}` does not fit a {} field", ty.describe()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Enum(name) => f.write_str(name),
            Value::Timestamp(ts) => f.write_str(&format_timestamp(*ts)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Parse an ISO-8601 local date-time, falling back to a plain
/// `yyyy-MM-dd` date at the start of the day.
pub fn parse_timestamp(raw: &str) -> Option<PrimitiveDateTime> {
    let raw = raw.trim();
    PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            raw,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        )
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    })
    .or_else(|_| {
        Date::parse(raw, format_description!("[year]-[month]-[day]"))
            .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
    })
    .ok()
}

/// Canonical stored form: `YYYY-MM-DDTHH:MM:SS`, followed by `.` and the
/// fractional second with trailing zeros trimmed when it is non-zero.
///
/// Canonical strings sort in chronological order, which both store
/// backends rely on for timestamp bounds.
pub fn format_timestamp(ts: PrimitiveDateTime) -> String {
    let mut out = ts
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| ts.to_string());
    let nanos = ts.nanosecond();
    if nanos != 0 {
        let digits = format!("{nanos:09}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// Serde adapter for timestamp fields on records.
pub mod timestamp_serde {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::PrimitiveDateTime;

    use super::{format_timestamp, parse_timestamp};

    pub fn serialize<S: Serializer>(ts: &PrimitiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(*ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PrimitiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`")))
    }

    pub mod option {
        use serde::{de, Deserialize, Deserializer, Serializer};
        use time::PrimitiveDateTime;

        use super::super::{format_timestamp, parse_timestamp};

        pub fn serialize<S: Serializer>(
            ts: &Option<PrimitiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.serialize_some(&format_timestamp(*ts)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<PrimitiveDateTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse_timestamp(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`"))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use time::macros::datetime;

    use super::*;

    #[rstest]
    #[case("2021-01-01T00:00:00", datetime!(2021-01-01 0:00:00))]
    #[case("2021-03-04T05:06:07.123", datetime!(2021-03-04 5:06:07.123))]
    #[case("2021-03-04T05:06", datetime!(2021-03-04 5:06:00))]
    #[case("2021-03-04", datetime!(2021-03-04 0:00:00))]
    fn parses_iso_and_plain_dates(#[case] raw: &str, #[case] expected: PrimitiveDateTime) {
        assert_eq!(parse_timestamp(raw), Some(expected));
    }

    #[rstest]
    #[case("not-a-date")]
    #[case("2021-13-01")]
    #[case("")]
    fn rejects_garbage_timestamps(#[case] raw: &str) {
        assert_eq!(parse_timestamp(raw), None);
    }

    #[rstest]
    #[case(datetime!(2021-03-04 5:06:07), "2021-03-04T05:06:07")]
    #[case(datetime!(2021-03-04 5:06:07.5), "2021-03-04T05:06:07.5")]
    #[case(datetime!(2021-03-04 5:06:07.120), "2021-03-04T05:06:07.12")]
    #[case(datetime!(2021-03-04 5:06:07.000000001), "2021-03-04T05:06:07.000000001")]
    fn canonical_format_keeps_subseconds(#[case] ts: PrimitiveDateTime, #[case] expected: &str) {
        assert_eq!(format_timestamp(ts), expected);
        assert_eq!(parse_timestamp(expected), Some(ts));
    }

    #[test]
    fn canonical_strings_sort_chronologically() {
        let ordered = [
            datetime!(2021-06-01 12:00:00),
            datetime!(2021-06-01 12:00:00.05),
            datetime!(2021-06-01 12:00:00.5),
            datetime!(2021-06-01 12:00:00.75),
            datetime!(2021-06-01 12:00:01),
        ];
        let rendered: Vec<String> = ordered.iter().map(|ts| format_timestamp(*ts)).collect();
        let mut sorted = rendered.clone();
        sorted.sort();
        assert_eq!(rendered, sorted);
    }

    #[test]
    fn serde_adapter_preserves_fractional_seconds() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Stamped {
            #[serde(with = "timestamp_serde")]
            at: PrimitiveDateTime,
        }

        let stamped: Stamped =
            serde_json::from_str(r#"{"at":"2021-06-01T12:00:00.750"}"#).unwrap();
        assert_eq!(stamped.at, datetime!(2021-06-01 12:00:00.75));
        assert_eq!(
            serde_json::to_string(&stamped).unwrap(),
            r#"{"at":"2021-06-01T12:00:00.75"}"#
        );
    }

    #[test]
    fn coerces_text_into_declared_types() {
        assert_eq!(
            Value::from("42").coerce_to(FieldType::Integer).unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            Value::from("true").coerce_to(FieldType::Boolean).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            Value::from("B").coerce_to(FieldType::Enum(&["A", "B"])).unwrap(),
            Value::Enum("B")
        );
        assert!(Value::from("C").coerce_to(FieldType::Enum(&["A", "B"])).is_err());
        assert!(Value::from("x").coerce_to(FieldType::Integer).is_err());
        assert!(Value::from("x").coerce_to(FieldType::List(&FieldType::Text)).is_err());
    }

    #[test]
    fn typed_values_render_as_text_for_text_fields() {
        assert_eq!(
            Value::Enum("APPROVED").coerce_to(FieldType::Text).unwrap(),
            Value::from("APPROVED")
        );
    }
}
