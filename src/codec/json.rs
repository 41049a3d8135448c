use super::{shape_mismatch, value_mismatch, ValueCodec};
use crate::error::{FieldError, FieldResult};
use crate::value::{DataKind, FieldValue, Input, StorageValue};

/// JSON document stored as compact text.
///
/// Non-ASCII characters are written unescaped.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    fn parse(column: &str, s: &str) -> FieldResult<Option<FieldValue>> {
        serde_json::from_str::<serde_json::Value>(s)
            .map(|v| Some(FieldValue::Json(v)))
            .map_err(|e| FieldError::invalid_input(column, format!("invalid JSON: {e}")))
    }
}

impl ValueCodec for JsonCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::Text
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        match raw {
            StorageValue::String(s) => Self::parse(column, s),
            other => Err(shape_mismatch(column, "JSON string", other)),
        }
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        match value {
            Some(FieldValue::Json(v)) => serde_json::to_string(v)
                .map(StorageValue::String)
                .map_err(|e| FieldError::invalid_input(column, format!("unserializable JSON: {e}"))),
            other => Err(value_mismatch(column, "json", other)),
        }
    }

    /// Any already decoded value is accepted and wrapped as a JSON document.
    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        match input {
            Input::Value(FieldValue::Json(v)) => Ok(Some(FieldValue::Json(v))),
            Input::Value(FieldValue::Text(s)) => Self::parse(column, &s),
            Input::Value(FieldValue::Integer(i)) => Ok(Some(FieldValue::Json(i.into()))),
            Input::Value(FieldValue::Boolean(b)) => Ok(Some(FieldValue::Json(b.into()))),
            Input::Value(FieldValue::List(items)) => Ok(Some(FieldValue::Json(items.into()))),
            Input::Storage(raw) => self.decode(column, &raw),
            Input::Value(other) => Err(FieldError::invalid_input(
                column,
                format!("cannot interpret {} as JSON", other.kind()),
            )),
        }
    }

    fn absent_on_empty_string(&self) -> bool {
        true
    }
}
