use super::{shape_mismatch, unsupported_input, value_mismatch, ValueCodec};
use crate::error::{FieldError, FieldResult};
use crate::value::{DataKind, FieldValue, Input, StorageValue};

/// Lower bound enforced by an integer codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegerBound {
    #[default]
    Any,
    /// `> 0`
    Positive,
    /// `>= 0`
    NonNegative,
}

impl IntegerBound {
    pub fn admits(self, value: i64) -> bool {
        match self {
            IntegerBound::Any => true,
            IntegerBound::Positive => value > 0,
            IntegerBound::NonNegative => value >= 0,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            IntegerBound::Any => "an integer",
            IntegerBound::Positive => "a positive integer",
            IntegerBound::NonNegative => "a non-negative integer",
        }
    }
}

/// Integer stored as an integer.
///
/// `cast` additionally accepts integer-like strings (`"10"`, `" 7 "`).
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCodec {
    bound: IntegerBound,
}

impl IntegerCodec {
    pub fn new(bound: IntegerBound) -> Self {
        Self { bound }
    }

    pub fn positive() -> Self {
        Self::new(IntegerBound::Positive)
    }

    pub fn non_negative() -> Self {
        Self::new(IntegerBound::NonNegative)
    }

    pub fn bound(&self) -> IntegerBound {
        self.bound
    }

    fn check(&self, column: &str, value: i64) -> FieldResult<Option<FieldValue>> {
        if self.bound.admits(value) {
            Ok(Some(FieldValue::Integer(value)))
        } else {
            Err(FieldError::invalid_input(
                column,
                format!("{value} is not {}", self.bound.describe()),
            ))
        }
    }
}

impl ValueCodec for IntegerCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::Integer
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        match raw {
            StorageValue::Integer(i) => self.check(column, *i),
            other => Err(shape_mismatch(column, "integer", other)),
        }
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        match value {
            Some(FieldValue::Integer(i)) => {
                self.check(column, *i)?;
                Ok(StorageValue::Integer(*i))
            }
            other => Err(value_mismatch(column, "integer", other)),
        }
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        match input {
            Input::Value(FieldValue::Integer(i)) => self.check(column, i),
            Input::Value(FieldValue::Text(s)) | Input::Storage(StorageValue::String(s)) => {
                let parsed = s.trim().parse::<i64>().map_err(|_| {
                    FieldError::invalid_input(column, format!("\"{s}\" is not numeric"))
                })?;
                self.check(column, parsed)
            }
            Input::Storage(raw) => self.decode(column, &raw),
            other => Err(unsupported_input(column, "integer", &other)),
        }
    }

    fn absent_on_empty_string(&self) -> bool {
        true
    }
}

/// Integer that tolerates `""` as absence and stores its values as strings.
///
/// Strings decode only when they round-trip exactly, so `"012"` and `"1.0"`
/// are rejected. Absence is written back as `""`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullableIntegerCodec;

impl NullableIntegerCodec {
    fn parse_exact(column: &str, s: &str) -> FieldResult<Option<FieldValue>> {
        if s.is_empty() {
            return Ok(None);
        }
        match s.parse::<i64>() {
            Ok(i) if i.to_string() == s => Ok(Some(FieldValue::Integer(i))),
            _ => Err(FieldError::invalid_input(
                column,
                format!("stored value \"{s}\" is not an integer"),
            )),
        }
    }
}

impl ValueCodec for NullableIntegerCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::Integer
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        match raw {
            StorageValue::Null => Ok(None),
            StorageValue::Integer(i) => Ok(Some(FieldValue::Integer(*i))),
            StorageValue::String(s) => Self::parse_exact(column, s),
            other => Err(shape_mismatch(column, "integer, integer string or null", other)),
        }
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        match value {
            None => Ok(StorageValue::String(String::new())),
            Some(FieldValue::Integer(i)) => Ok(StorageValue::String(i.to_string())),
            other => Err(value_mismatch(column, "integer or absent", other)),
        }
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        match input {
            Input::Value(FieldValue::Integer(i)) => Ok(Some(FieldValue::Integer(i))),
            Input::Value(FieldValue::Text(s)) => Self::parse_exact(column, &s),
            Input::Storage(raw) => self.decode(column, &raw),
            other => Err(unsupported_input(column, "integer", &other)),
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
    fn test_non_negative_cast() {
        let codec = IntegerCodec::non_negative();
        assert_eq!(
            codec.cast("qty", Input::from("10")).unwrap(),
            Some(FieldValue::Integer(10))
        );
        assert!(codec.cast("qty", Input::from("-1")).unwrap_err().is_invalid_input());
        assert!(codec.cast("qty", Input::from("ten")).unwrap_err().is_invalid_input());
        assert_eq!(codec.cast("qty", Input::from(0i64)).unwrap(), Some(FieldValue::Integer(0)));
    }

    #[test]
    fn test_positive_rejects_zero() {
        let codec = IntegerCodec::positive();
        assert!(codec.cast("id", Input::from(0i64)).unwrap_err().is_invalid_input());
        assert!(codec
            .decode("id", &StorageValue::Integer(-4))
            .unwrap_err()
            .is_invalid_input());
    }

    #[test]
    fn test_decode_requires_integer_shape() {
        let err = IntegerCodec::default()
            .decode("n", &StorageValue::from("5"))
            .unwrap_err();
        assert!(err.is_type_mismatch());
        assert!(IntegerCodec::default()
            .decode("n", &StorageValue::Null)
            .unwrap_err()
            .is_type_mismatch());
    }

    #[test]
    fn test_nullable_integer_storage() {
        let codec = NullableIntegerCodec;
        assert_eq!(codec.decode("n", &StorageValue::from("")).unwrap(), None);
        assert_eq!(codec.decode("n", &StorageValue::Null).unwrap(), None);
        assert_eq!(
            codec.decode("n", &StorageValue::from("-42")).unwrap(),
            Some(FieldValue::Integer(-42))
        );
        assert!(codec.decode("n", &StorageValue::from("012")).unwrap_err().is_invalid_input());
        assert_eq!(codec.encode("n", None).unwrap(), StorageValue::from(""));
        assert_eq!(
            codec.encode("n", Some(&FieldValue::Integer(7))).unwrap(),
            StorageValue::from("7")
        );
    }
}
