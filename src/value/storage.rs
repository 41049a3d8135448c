//! Storage-side values.
//!
//! Every column reads and writes one of four storage shapes: string, integer,
//! boolean or null. [`StorageValue`] is that boundary type; it converts to and
//! from `sea_query::Value` so the enclosing query engine can bind it directly.

use super::TIMESTAMP_FORMAT;
use crate::error::{FieldError, FieldResult};
use sea_query::Value;
use std::fmt;

/// A raw value as stored in (or fetched from) a table column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageValue {
    Null,
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl StorageValue {
    /// Shape name used in error messages
    pub fn shape(&self) -> &'static str {
        match self {
            StorageValue::Null => "null",
            StorageValue::String(_) => "string",
            StorageValue::Integer(_) => "integer",
            StorageValue::Boolean(_) => "boolean",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StorageValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StorageValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            StorageValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Either `null` or the empty string
    pub fn is_null_or_empty(&self) -> bool {
        match self {
            StorageValue::Null => true,
            StorageValue::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for StorageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageValue::Null => write!(f, "NULL"),
            StorageValue::String(s) => write!(f, "{s}"),
            StorageValue::Integer(i) => write!(f, "{i}"),
            StorageValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for StorageValue {
    fn from(value: &str) -> Self {
        StorageValue::String(value.to_string())
    }
}

impl From<String> for StorageValue {
    fn from(value: String) -> Self {
        StorageValue::String(value)
    }
}

impl From<i64> for StorageValue {
    fn from(value: i64) -> Self {
        StorageValue::Integer(value)
    }
}

impl From<i32> for StorageValue {
    fn from(value: i32) -> Self {
        StorageValue::Integer(value.into())
    }
}

impl From<bool> for StorageValue {
    fn from(value: bool) -> Self {
        StorageValue::Boolean(value)
    }
}

impl<T: Into<StorageValue>> From<Option<T>> for StorageValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(StorageValue::Null, Into::into)
    }
}

/// Storage data kind of a column, as declared to the host schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Short string (`VARCHAR`/`CHAR`), optionally with a fixed size
    String,
    /// Unbounded text
    Text,
    Integer,
    Boolean,
    /// Formatted `YYYY-MM-DD HH:MM:SS` timestamp
    DateTime,
}

impl DataKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DataKind::String => "string",
            DataKind::Text => "text",
            DataKind::Integer => "integer",
            DataKind::Boolean => "boolean",
            DataKind::DateTime => "datetime",
        }
    }
}

impl From<StorageValue> for Value {
    fn from(value: StorageValue) -> Self {
        match value {
            StorageValue::Null => Value::String(None),
            StorageValue::String(s) => Value::String(Some(s)),
            StorageValue::Integer(i) => Value::BigInt(Some(i)),
            StorageValue::Boolean(b) => Value::Bool(Some(b)),
        }
    }
}

impl TryFrom<Value> for StorageValue {
    type Error = FieldError;

    /// Narrow a driver value to one of the four storage shapes.
    ///
    /// Native timestamps and UUIDs are normalized to their canonical strings.
    /// Unsigned values above `i64::MAX` and other non-scalar variants are rejected.
    fn try_from(value: Value) -> FieldResult<Self> {
        match value {
            Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Json(None)
            | Value::ChronoDateTime(None)
            | Value::ChronoDateTimeUtc(None)
            | Value::Uuid(None) => Ok(StorageValue::Null),
            Value::Bool(Some(b)) => Ok(StorageValue::Boolean(b)),
            Value::TinyInt(Some(i)) => Ok(StorageValue::Integer(i.into())),
            Value::SmallInt(Some(i)) => Ok(StorageValue::Integer(i.into())),
            Value::Int(Some(i)) => Ok(StorageValue::Integer(i.into())),
            Value::BigInt(Some(i)) => Ok(StorageValue::Integer(i)),
            Value::TinyUnsigned(Some(u)) => Ok(StorageValue::Integer(u.into())),
            Value::SmallUnsigned(Some(u)) => Ok(StorageValue::Integer(u.into())),
            Value::Unsigned(Some(u)) => Ok(StorageValue::Integer(u.into())),
            Value::BigUnsigned(Some(u)) => i64::try_from(u).map(StorageValue::Integer).map_err(|_| {
                FieldError::type_mismatch(
                    "<driver>",
                    "integer within i64 range",
                    format!("unsigned {u}"),
                )
            }),
            Value::String(Some(s)) => Ok(StorageValue::String(s)),
            Value::Char(Some(c)) => Ok(StorageValue::String(c.to_string())),
            Value::ChronoDateTime(Some(dt)) => {
                Ok(StorageValue::String(dt.format(TIMESTAMP_FORMAT).to_string()))
            }
            Value::ChronoDateTimeUtc(Some(dt)) => {
                Ok(StorageValue::String(dt.format(TIMESTAMP_FORMAT).to_string()))
            }
            Value::Uuid(Some(u)) => Ok(StorageValue::String(u.hyphenated().to_string())),
            Value::Json(Some(j)) => serde_json::to_string(&*j)
                .map(StorageValue::String)
                .map_err(|e| FieldError::invalid_input("<driver>", format!("JSON: {e}"))),
            other => Err(FieldError::type_mismatch(
                "<driver>",
                "string, integer, boolean or null",
                format!("{other:?}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_sea_query_value() {
        assert_eq!(Value::from(StorageValue::Null), Value::String(None));
        assert_eq!(
            Value::from(StorageValue::from("abc")),
            Value::String(Some("abc".to_string()))
        );
        assert_eq!(Value::from(StorageValue::Integer(7)), Value::BigInt(Some(7)));
        assert_eq!(Value::from(StorageValue::Boolean(true)), Value::Bool(Some(true)));
    }

    #[test]
    fn test_from_sea_query_value() {
        assert_eq!(
            StorageValue::try_from(Value::Int(Some(42))).unwrap(),
            StorageValue::Integer(42)
        );
        assert_eq!(
            StorageValue::try_from(Value::SmallUnsigned(Some(3))).unwrap(),
            StorageValue::Integer(3)
        );
        assert_eq!(
            StorageValue::try_from(Value::Int(None)).unwrap(),
            StorageValue::Null
        );
        assert_eq!(
            StorageValue::try_from(Value::Char(Some('x'))).unwrap(),
            StorageValue::from("x")
        );
    }

    #[test]
    fn test_native_timestamp_normalized() {
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 5)
            .unwrap();
        let stored = StorageValue::try_from(Value::from(dt)).unwrap();
        assert_eq!(stored, StorageValue::from("2024-03-01 12:30:05"));
    }

    #[test]
    fn test_big_unsigned_overflow_rejected() {
        let err = StorageValue::try_from(Value::BigUnsigned(Some(u64::MAX))).unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn test_float_rejected() {
        let err = StorageValue::try_from(Value::Double(Some(1.5))).unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn test_null_or_empty() {
        assert!(StorageValue::Null.is_null_or_empty());
        assert!(StorageValue::from("").is_null_or_empty());
        assert!(!StorageValue::from(" ").is_null_or_empty());
        assert!(!StorageValue::Integer(0).is_null_or_empty());
        assert!(!StorageValue::Boolean(false).is_null_or_empty());
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(StorageValue::from(None::<i64>), StorageValue::Null);
        assert_eq!(StorageValue::from(Some(5i64)), StorageValue::Integer(5));
    }
}
