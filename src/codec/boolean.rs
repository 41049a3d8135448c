use super::{shape_mismatch, unsupported_input, value_mismatch, ValueCodec};
use crate::error::{FieldError, FieldResult};
use crate::value::{DataKind, FieldValue, Input, StorageValue};

/// Boolean column.
///
/// Engines without a native boolean (MySQL, SQLite) hand back `0`/`1`, which
/// decode as well; any other integer is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl BooleanCodec {
    fn from_text(column: &str, s: &str) -> FieldResult<Option<FieldValue>> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "y" => Ok(Some(FieldValue::Boolean(true))),
            "0" | "false" | "n" => Ok(Some(FieldValue::Boolean(false))),
            _ => Err(FieldError::invalid_input(
                column,
                format!("\"{s}\" is not a boolean"),
            )),
        }
    }
}

impl ValueCodec for BooleanCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::Boolean
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        match raw {
            StorageValue::Boolean(b) => Ok(Some(FieldValue::Boolean(*b))),
            StorageValue::Integer(0) => Ok(Some(FieldValue::Boolean(false))),
            StorageValue::Integer(1) => Ok(Some(FieldValue::Boolean(true))),
            StorageValue::Integer(i) => Err(FieldError::invalid_input(
                column,
                format!("{i} is not a boolean flag"),
            )),
            other => Err(shape_mismatch(column, "boolean", other)),
        }
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        match value {
            Some(FieldValue::Boolean(b)) => Ok(StorageValue::Boolean(*b)),
            other => Err(value_mismatch(column, "boolean", other)),
        }
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        match input {
            Input::Value(FieldValue::Boolean(b)) => Ok(Some(FieldValue::Boolean(b))),
            Input::Value(FieldValue::Text(s)) | Input::Storage(StorageValue::String(s)) => {
                Self::from_text(column, &s)
            }
            Input::Storage(raw) => self.decode(column, &raw),
            other => Err(unsupported_input(column, "boolean", &other)),
        }
    }

    fn absent_on_empty_string(&self) -> bool {
        true
    }
}
