//! Email and URL columns: text storage parsed into value objects.

use super::{shape_mismatch, unsupported_input, value_mismatch, ValueCodec};
use crate::error::{FieldError, FieldResult};
use crate::value::{DataKind, EmailAddress, FieldValue, Input, StorageValue};
use url::Url;

#[derive(Debug, Clone, Copy, Default)]
pub struct EmailCodec;

impl EmailCodec {
    fn parse(column: &str, s: &str) -> FieldResult<Option<FieldValue>> {
        EmailAddress::parse(s)
            .map(|e| Some(FieldValue::Email(e)))
            .map_err(|e| FieldError::invalid_input(column, e.to_string()))
    }
}

impl ValueCodec for EmailCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::String
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        match raw {
            StorageValue::String(s) => Self::parse(column, s),
            other => Err(shape_mismatch(column, "email string", other)),
        }
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        match value {
            Some(FieldValue::Email(e)) => Ok(StorageValue::String(e.to_string())),
            other => Err(value_mismatch(column, "email", other)),
        }
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        match input {
            Input::Value(FieldValue::Email(e)) => Ok(Some(FieldValue::Email(e))),
            Input::Value(FieldValue::Text(s)) => Self::parse(column, &s),
            Input::Storage(raw) => self.decode(column, &raw),
            other => Err(unsupported_input(column, "email", &other)),
        }
    }

    fn absent_on_empty_string(&self) -> bool {
        true
    }
}

/// Absolute URL.
///
/// Storage round-trips exactly for URLs already in the parser's normalized
/// form (`https://example.com/` rather than `https://example.com`).
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlCodec;

impl UrlCodec {
    fn parse(column: &str, s: &str) -> FieldResult<Option<FieldValue>> {
        Url::parse(s)
            .map(|u| Some(FieldValue::Url(u)))
            .map_err(|e| FieldError::invalid_input(column, format!("\"{s}\" is not a valid URI: {e}")))
    }
}

impl ValueCodec for UrlCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::Text
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        match raw {
            StorageValue::String(s) => Self::parse(column, s),
            other => Err(shape_mismatch(column, "URL string", other)),
        }
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        match value {
            Some(FieldValue::Url(u)) => Ok(StorageValue::String(u.to_string())),
            other => Err(value_mismatch(column, "url", other)),
        }
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        match input {
            Input::Value(FieldValue::Url(u)) => Ok(Some(FieldValue::Url(u))),
            Input::Value(FieldValue::Text(s)) => Self::parse(column, &s),
            Input::Storage(raw) => self.decode(column, &raw),
            other => Err(unsupported_input(column, "url", &other)),
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
    fn test_email_round_trip() {
        let raw = StorageValue::from("someone@example.org");
        let decoded = EmailCodec.decode("email", &raw).unwrap();
        assert!(matches!(decoded, Some(FieldValue::Email(_))));
        assert_eq!(EmailCodec.encode("email", decoded.as_ref()).unwrap(), raw);
    }

    #[test]
    fn test_invalid_email() {
        assert!(EmailCodec
            .cast("email", Input::from("not-an-email"))
            .unwrap_err()
            .is_invalid_input());
    }

    #[test]
    fn test_url_round_trip() {
        let raw = StorageValue::from("https://example.com/docs?page=2");
        let decoded = UrlCodec.decode("homepage", &raw).unwrap();
        assert_eq!(UrlCodec.encode("homepage", decoded.as_ref()).unwrap(), raw);
    }

    #[test]
    fn test_relative_url_rejected() {
        assert!(UrlCodec
            .decode("homepage", &StorageValue::from("/relative/path"))
            .unwrap_err()
            .is_invalid_input());
    }
}
