//! Value codecs: the storage ⇄ domain contract of every column type.
//!
//! A codec is a pure function of its input plus its static configuration.
//! Concrete codecs are closed over by [`ColumnCodec`]; nullability is layered
//! on top by [`Nullable`] so individual codecs never inspect a `nullable` flag.

mod address;
mod boolean;
mod enumerated;
mod guid;
mod integer;
mod json;
mod list;
mod object;
mod passthrough;
mod text;
mod timestamp;

pub use address::{EmailCodec, UrlCodec};
pub use boolean::BooleanCodec;
pub use enumerated::EnumCodec;
pub use guid::{GuidCodec, GUID_LENGTH};
pub use integer::{IntegerBound, IntegerCodec, NullableIntegerCodec};
pub use json::JsonCodec;
pub use list::{ListCodec, LIST_DELIMITER};
pub use object::ObjectCodec;
pub use passthrough::{NullCodec, RawCodec};
pub use text::{NonEmptyStringCodec, TextCodec};
pub use timestamp::TimestampCodec;

use crate::error::{FieldError, FieldResult};
use crate::value::{DataKind, FieldValue, Input, StorageValue};

/// Capability interface shared by every column type
pub trait ValueCodec: Send + Sync {
    /// Storage data kind declared to the host schema
    fn data_kind(&self) -> DataKind;

    /// Parse a raw storage value into a domain value.
    ///
    /// A storage value of the wrong shape is a [`FieldError::TypeMismatch`].
    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>>;

    /// Convert a domain value (or its absence) into a storage value
    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue>;

    /// Coerce arbitrary input into the domain type.
    ///
    /// Must be idempotent over decode: `cast(decode(x)) == decode(x)`.
    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>>;

    fn is_empty(&self, input: &Input) -> bool {
        input.is_null_or_empty()
    }

    /// Whether `""` counts as the absence sentinel for a nullable column
    fn absent_on_empty_string(&self) -> bool {
        false
    }

    /// Whether the codec maps absence itself and must not be short-circuited
    fn handles_absent(&self) -> bool {
        false
    }
}

impl<C: ValueCodec + ?Sized> ValueCodec for &C {
    fn data_kind(&self) -> DataKind {
        (**self).data_kind()
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        (**self).decode(column, raw)
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        (**self).encode(column, value)
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        (**self).cast(column, input)
    }

    fn is_empty(&self, input: &Input) -> bool {
        (**self).is_empty(input)
    }

    fn absent_on_empty_string(&self) -> bool {
        (**self).absent_on_empty_string()
    }

    fn handles_absent(&self) -> bool {
        (**self).handles_absent()
    }
}

/// Nullability decorator.
///
/// When enabled, the absence sentinel (`null`, or `""` where the inner codec
/// says so) short-circuits to "absent" without reaching the inner codec.
/// When disabled, or when the inner codec maps absence itself, every call is
/// delegated unchanged.
#[derive(Debug, Clone)]
pub struct Nullable<C> {
    inner: C,
    enabled: bool,
}

impl<C: ValueCodec> Nullable<C> {
    pub fn wrap_if(nullable: bool, inner: C) -> Self {
        let enabled = nullable && !inner.handles_absent();
        Self { inner, enabled }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn is_sentinel(&self, raw: &StorageValue) -> bool {
        match raw {
            StorageValue::Null => true,
            StorageValue::String(s) => s.is_empty() && self.inner.absent_on_empty_string(),
            _ => false,
        }
    }
}

impl<C: ValueCodec> ValueCodec for Nullable<C> {
    fn data_kind(&self) -> DataKind {
        self.inner.data_kind()
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        if self.enabled && self.is_sentinel(raw) {
            return Ok(None);
        }
        self.inner.decode(column, raw)
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        match value {
            None if self.enabled => Ok(StorageValue::Null),
            _ => self.inner.encode(column, value),
        }
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        if self.enabled {
            let absent = match &input {
                Input::Storage(raw) => self.is_sentinel(raw),
                Input::Value(FieldValue::Text(s)) => s.is_empty() && self.inner.absent_on_empty_string(),
                Input::Value(_) => false,
            };
            if absent {
                return Ok(None);
            }
        }
        self.inner.cast(column, input)
    }

    fn is_empty(&self, input: &Input) -> bool {
        self.inner.is_empty(input)
    }

    fn absent_on_empty_string(&self) -> bool {
        self.inner.absent_on_empty_string()
    }

    fn handles_absent(&self) -> bool {
        self.enabled || self.inner.handles_absent()
    }
}

/// The closed set of column codecs
#[derive(Debug, Clone)]
pub enum ColumnCodec {
    Text(TextCodec),
    NonEmptyString(NonEmptyStringCodec),
    Integer(IntegerCodec),
    NullableInteger(NullableIntegerCodec),
    Boolean(BooleanCodec),
    Guid(GuidCodec),
    Email(EmailCodec),
    Url(UrlCodec),
    Json(JsonCodec),
    Object(ObjectCodec),
    Enum(EnumCodec),
    Timestamp(TimestampCodec),
    List(ListCodec),
    Null(NullCodec),
    Raw(RawCodec),
}

macro_rules! dispatch {
    ($self:ident, $codec:ident => $body:expr) => {
        match $self {
            ColumnCodec::Text($codec) => $body,
            ColumnCodec::NonEmptyString($codec) => $body,
            ColumnCodec::Integer($codec) => $body,
            ColumnCodec::NullableInteger($codec) => $body,
            ColumnCodec::Boolean($codec) => $body,
            ColumnCodec::Guid($codec) => $body,
            ColumnCodec::Email($codec) => $body,
            ColumnCodec::Url($codec) => $body,
            ColumnCodec::Json($codec) => $body,
            ColumnCodec::Object($codec) => $body,
            ColumnCodec::Enum($codec) => $body,
            ColumnCodec::Timestamp($codec) => $body,
            ColumnCodec::List($codec) => $body,
            ColumnCodec::Null($codec) => $body,
            ColumnCodec::Raw($codec) => $body,
        }
    };
}

impl ColumnCodec {
    /// Variant name, used in descriptors and log output
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnCodec::Text(_) => "text",
            ColumnCodec::NonEmptyString(_) => "non_empty_string",
            ColumnCodec::Integer(c) => match c.bound() {
                IntegerBound::Any => "integer",
                IntegerBound::Positive => "positive_integer",
                IntegerBound::NonNegative => "non_negative_integer",
            },
            ColumnCodec::NullableInteger(_) => "nullable_integer",
            ColumnCodec::Boolean(_) => "boolean",
            ColumnCodec::Guid(_) => "guid",
            ColumnCodec::Email(_) => "email",
            ColumnCodec::Url(_) => "url",
            ColumnCodec::Json(_) => "json",
            ColumnCodec::Object(_) => "object",
            ColumnCodec::Enum(_) => "enum",
            ColumnCodec::Timestamp(_) => "timestamp",
            ColumnCodec::List(_) => "list",
            ColumnCodec::Null(_) => "null",
            ColumnCodec::Raw(_) => "raw",
        }
    }
}

impl ValueCodec for ColumnCodec {
    fn data_kind(&self) -> DataKind {
        dispatch!(self, c => c.data_kind())
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        dispatch!(self, c => c.decode(column, raw))
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        dispatch!(self, c => c.encode(column, value))
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        dispatch!(self, c => c.cast(column, input))
    }

    fn is_empty(&self, input: &Input) -> bool {
        dispatch!(self, c => c.is_empty(input))
    }

    fn absent_on_empty_string(&self) -> bool {
        dispatch!(self, c => c.absent_on_empty_string())
    }

    fn handles_absent(&self) -> bool {
        dispatch!(self, c => c.handles_absent())
    }
}

macro_rules! impl_from_codec {
    ($($variant:ident($codec:ty)),* $(,)?) => {
        $(
            impl From<$codec> for ColumnCodec {
                fn from(codec: $codec) -> Self {
                    ColumnCodec::$variant(codec)
                }
            }
        )*
    };
}

impl_from_codec!(
    Text(TextCodec),
    NonEmptyString(NonEmptyStringCodec),
    Integer(IntegerCodec),
    NullableInteger(NullableIntegerCodec),
    Boolean(BooleanCodec),
    Guid(GuidCodec),
    Email(EmailCodec),
    Url(UrlCodec),
    Json(JsonCodec),
    Object(ObjectCodec),
    Enum(EnumCodec),
    Timestamp(TimestampCodec),
    List(ListCodec),
    Null(NullCodec),
    Raw(RawCodec),
);

pub(crate) fn shape_mismatch(column: &str, expected: &str, raw: &StorageValue) -> FieldError {
    FieldError::type_mismatch(column, expected, raw.shape())
}

pub(crate) fn value_mismatch(column: &str, expected: &str, value: Option<&FieldValue>) -> FieldError {
    FieldError::type_mismatch(column, expected, value.map_or("absent", FieldValue::kind))
}

pub(crate) fn unsupported_input(column: &str, expected: &str, input: &Input) -> FieldError {
    FieldError::invalid_input(
        column,
        format!("cannot interpret {} as {}", input.shape(), expected),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_short_circuits_sentinels() {
        let codec = Nullable::wrap_if(true, ColumnCodec::from(NonEmptyStringCodec));
        assert_eq!(codec.decode("c", &StorageValue::Null).unwrap(), None);
        assert_eq!(codec.decode("c", &StorageValue::from("")).unwrap(), None);
        assert_eq!(codec.encode("c", None).unwrap(), StorageValue::Null);
        assert_eq!(codec.cast("c", Input::from("")).unwrap(), None);
    }

    #[test]
    fn test_disabled_wrapper_delegates() {
        let codec = Nullable::wrap_if(false, ColumnCodec::from(TextCodec));
        let err = codec.decode("c", &StorageValue::Null).unwrap_err();
        assert!(err.is_type_mismatch());
        assert!(codec.encode("c", None).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_empty_string_kept_for_plain_text() {
        let codec = Nullable::wrap_if(true, TextCodec);
        assert_eq!(
            codec.decode("c", &StorageValue::from("")).unwrap(),
            Some(FieldValue::Text(String::new()))
        );
    }

    #[test]
    fn test_wrapper_leaves_self_nullable_codecs_alone() {
        let codec = Nullable::wrap_if(true, NullableIntegerCodec);
        assert_eq!(codec.encode("c", None).unwrap(), StorageValue::from(""));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ColumnCodec::from(IntegerCodec::non_negative()).type_name(), "non_negative_integer");
        assert_eq!(ColumnCodec::from(GuidCodec).type_name(), "guid");
    }
}
