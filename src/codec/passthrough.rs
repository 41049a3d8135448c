//! Codecs that do not translate values: raw pass-through and always-null.

use super::{value_mismatch, ValueCodec};
use crate::error::{FieldError, FieldResult};
use crate::value::{DataKind, FieldValue, Input, StorageValue};

/// Storage value surfaced as-is: strings as text, integers and booleans unchanged.
///
/// Used by computed columns that duplicate another column without type translation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl ValueCodec for RawCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::String
    }

    fn decode(&self, _column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        Ok(match raw {
            StorageValue::Null => None,
            StorageValue::String(s) => Some(FieldValue::Text(s.clone())),
            StorageValue::Integer(i) => Some(FieldValue::Integer(*i)),
            StorageValue::Boolean(b) => Some(FieldValue::Boolean(*b)),
        })
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        match value {
            None => Ok(StorageValue::Null),
            Some(FieldValue::Text(s)) => Ok(StorageValue::String(s.clone())),
            Some(FieldValue::Integer(i)) => Ok(StorageValue::Integer(*i)),
            Some(FieldValue::Boolean(b)) => Ok(StorageValue::Boolean(*b)),
            Some(other) => match other.text_form() {
                Some(text) => Ok(StorageValue::String(text.into_owned())),
                None => Err(value_mismatch(column, "text, integer or boolean", Some(other))),
            },
        }
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        match input {
            Input::Storage(raw) => self.decode(column, &raw),
            Input::Value(v) => Ok(Some(v)),
        }
    }

    fn handles_absent(&self) -> bool {
        true
    }
}

/// Column whose value is always absent
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCodec;

impl ValueCodec for NullCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::String
    }

    fn decode(&self, _column: &str, _raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        Ok(None)
    }

    fn encode(&self, _column: &str, _value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        Ok(StorageValue::Null)
    }

    /// Only `null` and `""` are accepted
    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        if input.is_null_or_empty() {
            Ok(None)
        } else {
            Err(FieldError::invalid_input(
                column,
                format!("a null column cannot hold {}", input.shape()),
            ))
        }
    }

    fn handles_absent(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_keeps_shapes() {
        for raw in [
            StorageValue::from("x"),
            StorageValue::Integer(9),
            StorageValue::Boolean(false),
            StorageValue::Null,
        ] {
            let decoded = RawCodec.decode("m", &raw).unwrap();
            assert_eq!(RawCodec.encode("m", decoded.as_ref()).unwrap(), raw);
        }
    }

    #[test]
    fn test_null_codec() {
        assert_eq!(NullCodec.decode("n", &StorageValue::from("anything")).unwrap(), None);
        assert_eq!(NullCodec.cast("n", Input::from("")).unwrap(), None);
        assert!(NullCodec.cast("n", Input::from("x")).unwrap_err().is_invalid_input());
        assert!(NullCodec.cast("n", Input::from(0i64)).is_err());
    }
}
