use super::{shape_mismatch, value_mismatch, ValueCodec};
use crate::error::{FieldError, FieldResult};
use crate::value::{DataKind, FieldValue, Input, StorageValue};

/// Separator between list items in storage
pub const LIST_DELIMITER: char = ',';

/// Ordered list of strings stored as one delimited string.
///
/// The mapping is lossy at the edges: an empty list and absence both encode
/// to `null`, and `null`/`""` both decode to absence on a nullable column. A
/// required column rejects both on decode. Items must not contain the
/// delimiter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCodec;

impl ListCodec {
    pub fn split(stored: &str) -> Option<Vec<String>> {
        if stored.is_empty() {
            None
        } else {
            Some(stored.split(LIST_DELIMITER).map(str::to_string).collect())
        }
    }

    pub fn join(items: &[String]) -> Option<String> {
        if items.is_empty() {
            None
        } else {
            Some(items.join(LIST_DELIMITER.to_string().as_str()))
        }
    }
}

impl ValueCodec for ListCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::Text
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        match raw {
            StorageValue::String(s) if !s.is_empty() => Ok(Self::split(s).map(FieldValue::List)),
            other => Err(shape_mismatch(column, "non-empty delimited string", other)),
        }
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        match value {
            Some(FieldValue::List(items)) => {
                if let Some(item) = items.iter().find(|item| item.contains(LIST_DELIMITER)) {
                    return Err(FieldError::invalid_input(
                        column,
                        format!("list item {item:?} contains the delimiter {LIST_DELIMITER:?}"),
                    ));
                }
                Ok(Self::join(items).into())
            }
            other => Err(value_mismatch(column, "list", other)),
        }
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        match input {
            Input::Value(FieldValue::List(items)) => Ok(Some(FieldValue::List(items))),
            Input::Value(FieldValue::Text(s)) if !s.is_empty() => {
                Ok(Self::split(&s).map(FieldValue::List))
            }
            Input::Storage(raw) => self.decode(column, &raw),
            Input::Value(other) => Err(FieldError::invalid_input(
                column,
                format!("cannot interpret {} as a list", other.kind()),
            )),
        }
    }

    fn absent_on_empty_string(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Nullable;

    fn list(items: &[&str]) -> FieldValue {
        FieldValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    fn nullable() -> Nullable<ListCodec> {
        Nullable::wrap_if(true, ListCodec)
    }

    #[test]
    fn test_round_trip() {
        let value = list(&["a", "b", "c"]);
        let stored = ListCodec.encode("tags", Some(&value)).unwrap();
        assert_eq!(stored, StorageValue::from("a,b,c"));
        assert_eq!(ListCodec.decode("tags", &stored).unwrap(), Some(value));
    }

    #[test]
    fn test_empty_and_absent_collapse_to_null() {
        let codec = nullable();
        assert_eq!(codec.encode("tags", Some(&list(&[]))).unwrap(), StorageValue::Null);
        assert_eq!(codec.encode("tags", None).unwrap(), StorageValue::Null);
        assert_eq!(codec.decode("tags", &StorageValue::from("")).unwrap(), None);
        assert_eq!(codec.decode("tags", &StorageValue::Null).unwrap(), None);
    }

    #[test]
    fn test_required_rejects_null_and_empty() {
        let codec = Nullable::wrap_if(false, ListCodec);
        assert!(codec.decode("tags", &StorageValue::Null).unwrap_err().is_type_mismatch());
        assert!(codec.decode("tags", &StorageValue::from("")).unwrap_err().is_type_mismatch());
        assert!(codec.encode("tags", None).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_item_with_delimiter_rejected() {
        let err = ListCodec.encode("tags", Some(&list(&["a,b"]))).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_integer_shape_mismatch() {
        assert!(ListCodec
            .decode("tags", &StorageValue::Integer(1))
            .unwrap_err()
            .is_type_mismatch());
    }
}
