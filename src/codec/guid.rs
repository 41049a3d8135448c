use super::{shape_mismatch, unsupported_input, value_mismatch, ValueCodec};
use crate::error::{FieldError, FieldResult};
use crate::value::{DataKind, FieldValue, Input, StorageValue};
use uuid::Uuid;

/// Length of the canonical hyphenated form
pub const GUID_LENGTH: usize = 36;

/// UUID stored in its canonical, lowercase, hyphenated 36-character form
#[derive(Debug, Clone, Copy, Default)]
pub struct GuidCodec;

impl GuidCodec {
    fn parse(column: &str, s: &str) -> FieldResult<Option<FieldValue>> {
        if s.len() != GUID_LENGTH {
            return Err(FieldError::invalid_input(
                column,
                format!("\"{s}\" is not a {GUID_LENGTH}-character GUID"),
            ));
        }
        Uuid::parse_str(s)
            .map(|g| Some(FieldValue::Guid(g)))
            .map_err(|e| FieldError::invalid_input(column, format!("\"{s}\": {e}")))
    }
}

impl ValueCodec for GuidCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::String
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        match raw {
            StorageValue::String(s) => Self::parse(column, s),
            other => Err(shape_mismatch(column, "GUID string", other)),
        }
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        match value {
            Some(FieldValue::Guid(g)) => Ok(StorageValue::String(g.hyphenated().to_string())),
            other => Err(value_mismatch(column, "guid", other)),
        }
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        match input {
            Input::Value(FieldValue::Guid(g)) => Ok(Some(FieldValue::Guid(g))),
            Input::Value(FieldValue::Text(s)) => Self::parse(column, &s),
            Input::Storage(raw) => self.decode(column, &raw),
            other => Err(unsupported_input(column, "guid", &other)),
        }
    }

    fn absent_on_empty_string(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_canonical() {
        let raw = StorageValue::from("67e55044-10b1-426f-9247-bb680e5fe0c8");
        let decoded = GuidCodec.decode("id", &raw).unwrap();
        assert_eq!(GuidCodec.encode("id", decoded.as_ref()).unwrap(), raw);
    }

    #[test]
    fn test_rejects_simple_form() {
        let err = GuidCodec
            .decode("id", &StorageValue::from("67e5504410b1426f9247bb680e5fe0c8"))
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_integer_shape_mismatch() {
        assert!(GuidCodec
            .decode("id", &StorageValue::Integer(5))
            .unwrap_err()
            .is_type_mismatch());
    }
}
