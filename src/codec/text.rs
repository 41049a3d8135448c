use super::{shape_mismatch, unsupported_input, value_mismatch, ValueCodec};
use crate::error::FieldResult;
use crate::value::{DataKind, FieldValue, Input, StorageValue};

/// Unbounded text; `""` is a real value, only `null` is absent
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

/// Short string where `""` is treated as absent for nullable columns
#[derive(Debug, Clone, Copy, Default)]
pub struct NonEmptyStringCodec;

fn decode_text(column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
    match raw {
        StorageValue::String(s) => Ok(Some(FieldValue::Text(s.clone()))),
        other => Err(shape_mismatch(column, "string", other)),
    }
}

fn encode_text(column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
    match value {
        Some(FieldValue::Text(s)) => Ok(StorageValue::String(s.clone())),
        other => Err(value_mismatch(column, "text", other)),
    }
}

fn cast_text(column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
    match input {
        Input::Value(FieldValue::Text(s)) => Ok(Some(FieldValue::Text(s))),
        Input::Storage(raw) => decode_text(column, &raw),
        other => Err(unsupported_input(column, "text", &other)),
    }
}

impl ValueCodec for TextCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::Text
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        decode_text(column, raw)
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        encode_text(column, value)
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        cast_text(column, input)
    }
}

impl ValueCodec for NonEmptyStringCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::String
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        decode_text(column, raw)
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        encode_text(column, value)
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        cast_text(column, input)
    }

    fn absent_on_empty_string(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_round_trip() {
        let raw = StorageValue::from("hello");
        let decoded = TextCodec.decode("body", &raw).unwrap();
        assert_eq!(decoded, Some(FieldValue::Text("hello".to_string())));
        assert_eq!(TextCodec.encode("body", decoded.as_ref()).unwrap(), raw);
    }

    #[test]
    fn test_integer_is_type_mismatch() {
        let err = TextCodec.decode("body", &StorageValue::Integer(1)).unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn test_cast_pass_through_and_rejects_other_kinds() {
        let v = NonEmptyStringCodec
            .cast("title", Input::from(FieldValue::Text("t".into())))
            .unwrap();
        assert_eq!(v, Some(FieldValue::Text("t".into())));

        let err = NonEmptyStringCodec
            .cast("title", Input::from(FieldValue::Integer(3)))
            .unwrap_err();
        assert!(err.is_invalid_input());
    }
}
