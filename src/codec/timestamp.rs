use super::{shape_mismatch, unsupported_input, value_mismatch, ValueCodec};
use crate::error::{FieldError, FieldResult};
use crate::value::{DataKind, FieldValue, Input, StorageValue, TIMESTAMP_FORMAT};
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Zero-padded layout; chrono alone also accepts `2023-1-5 8:15:00`
static LAYOUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}$").expect("timestamp layout is valid")
});

/// Immutable UTC timestamp with whole-second storage granularity.
///
/// Sub-second precision is dropped on encode, so only whole-second values
/// survive a round trip unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampCodec;

impl TimestampCodec {
    fn parse(column: &str, s: &str) -> FieldResult<Option<FieldValue>> {
        if !LAYOUT.is_match(s) {
            return Err(FieldError::invalid_input(
                column,
                format!("\"{s}\" does not match YYYY-MM-DD HH:MM:SS"),
            ));
        }
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map(|naive| Some(FieldValue::Timestamp(naive.and_utc())))
            .map_err(|e| {
                FieldError::invalid_input(
                    column,
                    format!("\"{s}\" does not match YYYY-MM-DD HH:MM:SS: {e}"),
                )
            })
    }

    pub fn format(value: &DateTime<Utc>) -> String {
        value.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl ValueCodec for TimestampCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::DateTime
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        match raw {
            StorageValue::String(s) => Self::parse(column, s),
            other => Err(shape_mismatch(column, "timestamp string", other)),
        }
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        match value {
            Some(FieldValue::Timestamp(t)) => Ok(StorageValue::String(Self::format(t))),
            other => Err(value_mismatch(column, "timestamp", other)),
        }
    }

    /// Unix seconds are accepted as a convenience literal.
    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        match input {
            Input::Value(FieldValue::Timestamp(t)) => Ok(Some(FieldValue::Timestamp(t))),
            Input::Value(FieldValue::Text(s)) => Self::parse(column, &s),
            Input::Value(FieldValue::Integer(secs)) | Input::Storage(StorageValue::Integer(secs)) => {
                DateTime::from_timestamp(secs, 0)
                    .map(|t| Some(FieldValue::Timestamp(t)))
                    .ok_or_else(|| {
                        FieldError::invalid_input(column, format!("{secs} is out of timestamp range"))
                    })
            }
            Input::Storage(raw) => self.decode(column, &raw),
            other => Err(unsupported_input(column, "timestamp", &other)),
        }
    }

    fn absent_on_empty_string(&self) -> bool {
        true
    }
}
