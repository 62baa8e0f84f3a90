//! SQL values and parameter handling.
//!
//! Every value that reaches the database does so either as a bound
//! parameter or through [`Value::to_literal`], which escapes text and
//! blobs. Raw user input is never spliced into SQL text.

use chrono::{NaiveDate, NaiveDateTime};

/// A scalar SQL value, bound as a statement parameter.
///
/// The variants mirror SQLite's storage classes. Booleans are not a
/// storage class of their own; they convert to `0`/`1` integers at the
/// [`ToValue`] boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value.
    Null,
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl Value {
    /// Renders the value as a SQL literal.
    ///
    /// Numeric values render bare, text renders single-quoted with `''`
    /// escaping, blobs render as `X'…'` hex. This is the same adapter used
    /// for `DEFAULT (…)` clauses in DDL, so the output must stay stable
    /// across runs.
    #[must_use]
    pub fn to_literal(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => {
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
        }
    }

    /// Returns the integer payload, if this value is an integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns whether this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Trait for types that convert into a [`Value`].
pub trait ToValue {
    /// Converts the value into a [`Value`].
    fn to_value(self) -> Value;
}

impl ToValue for Value {
    fn to_value(self) -> Value {
        self
    }
}

impl ToValue for &Value {
    fn to_value(self) -> Value {
        self.clone()
    }
}

impl ToValue for bool {
    fn to_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl ToValue for i64 {
    fn to_value(self) -> Value {
        Value::Int(self)
    }
}

impl ToValue for i32 {
    fn to_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl ToValue for i16 {
    fn to_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl ToValue for u32 {
    fn to_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl ToValue for u16 {
    fn to_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl ToValue for f64 {
    fn to_value(self) -> Value {
        Value::Float(self)
    }
}

impl ToValue for f32 {
    fn to_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl ToValue for String {
    fn to_value(self) -> Value {
        Value::Text(self)
    }
}

impl ToValue for &str {
    fn to_value(self) -> Value {
        Value::Text(String::from(self))
    }
}

impl ToValue for Vec<u8> {
    fn to_value(self) -> Value {
        Value::Blob(self)
    }
}

impl ToValue for &[u8] {
    fn to_value(self) -> Value {
        Value::Blob(self.to_vec())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl ToValue for NaiveDate {
    fn to_value(self) -> Value {
        Value::Text(self.format("%Y-%m-%d").to_string())
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(self) -> Value {
        Value::Text(self.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_null_and_numbers() {
        assert_eq!(Value::Null.to_literal(), "NULL");
        assert_eq!(Value::Int(42).to_literal(), "42");
        assert_eq!(Value::Int(-100).to_literal(), "-100");
        assert_eq!(Value::Float(2.5).to_literal(), "2.5");
    }

    #[test]
    fn literal_text_escaping() {
        assert_eq!(Value::Text(String::from("NA")).to_literal(), "'NA'");
        assert_eq!(Value::Text(String::from("O'Brien")).to_literal(), "'O''Brien'");
    }

    #[test]
    fn literal_injection_is_escaped() {
        let malicious = "'; DROP TABLE artist; --";
        assert_eq!(
            Value::Text(String::from(malicious)).to_literal(),
            "'''; DROP TABLE artist; --'"
        );
    }

    #[test]
    fn literal_blob_hex() {
        assert_eq!(Value::Blob(vec![0x48, 0x49]).to_literal(), "X'4849'");
    }

    #[test]
    fn conversions() {
        assert_eq!(true.to_value(), Value::Int(1));
        assert_eq!(42_i32.to_value(), Value::Int(42));
        assert_eq!("hi".to_value(), Value::Text(String::from("hi")));
        assert_eq!(None::<i64>.to_value(), Value::Null);
        assert_eq!(Some(7_i64).to_value(), Value::Int(7));
    }

    #[test]
    fn date_converts_to_iso_text() {
        let d = NaiveDate::from_ymd_opt(1000, 1, 1).unwrap();
        assert_eq!(d.to_value(), Value::Text(String::from("1000-01-01")));
    }

    #[test]
    fn literal_is_deterministic() {
        let v = Value::Text(String::from("same"));
        assert_eq!(v.to_literal(), v.to_literal());
    }
}
