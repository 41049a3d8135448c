//! The host query engine's view of a column.
//!
//! A descriptor is plain data: it carries no codec hooks and no validators.
//! Defaults travel with it, including generator functions.
//! `Column::descriptor` and `Column::from_descriptor` convert field by field.

use crate::codec::{
    BooleanCodec, ColumnCodec, EmailCodec, GuidCodec, IntegerCodec, JsonCodec, ListCodec,
    NonEmptyStringCodec, NullCodec, NullableIntegerCodec, RawCodec, TextCodec, TimestampCodec,
    UrlCodec, GUID_LENGTH,
};
use super::DefaultValue;
use crate::error::{FieldError, FieldResult};
use crate::value::DataKind;
use sea_query::ColumnDef;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Codec name as reported by `ColumnCodec::type_name`
    pub column_type: String,
    pub data_kind: DataKind,
    pub nullable: bool,
    pub required: bool,
    pub unique: bool,
    pub primary: bool,
    pub auto_generated: bool,
    pub size: Option<u32>,
    /// Compiled template of a computed column
    pub expression: Option<String>,
    pub build_from: Vec<String>,
    pub parameters: BTreeMap<String, serde_json::Value>,
    /// Fixed value or generator used when a new row leaves the column unset
    pub default_value: Option<DefaultValue>,
}

impl ColumnDescriptor {
    pub fn is_computed(&self) -> bool {
        self.expression.is_some()
    }

    /// Codec for `column_type`
    pub(crate) fn codec(&self) -> FieldResult<ColumnCodec> {
        let codec: ColumnCodec = match self.column_type.as_str() {
            "text" => TextCodec.into(),
            "non_empty_string" => NonEmptyStringCodec.into(),
            "integer" => IntegerCodec::default().into(),
            "positive_integer" => IntegerCodec::positive().into(),
            "non_negative_integer" => IntegerCodec::non_negative().into(),
            "nullable_integer" => NullableIntegerCodec.into(),
            "boolean" => BooleanCodec.into(),
            "guid" => GuidCodec.into(),
            "email" => EmailCodec.into(),
            "url" => UrlCodec.into(),
            "json" => JsonCodec.into(),
            "timestamp" => TimestampCodec.into(),
            "list" => ListCodec.into(),
            "null" => NullCodec.into(),
            "raw" => RawCodec.into(),
            other => {
                return Err(FieldError::construction(format!(
                    "column {} of type {other} cannot be rebuilt from a descriptor",
                    self.name
                )))
            }
        };
        Ok(codec)
    }

    /// Schema definition for a stored column; computed columns have none.
    ///
    /// GUIDs map to `char(36)`. Auto-increment is only emitted for integer
    /// primary keys, so generated GUID keys stay plain.
    pub fn to_column_def(&self) -> Option<ColumnDef> {
        if self.is_computed() {
            return None;
        }
        let mut def = ColumnDef::new(self.name.clone());

        match (self.column_type.as_str(), self.data_kind) {
            ("guid", _) => {
                def.char_len(GUID_LENGTH as u32);
            }
            (_, DataKind::String) => match self.size {
                Some(size) => {
                    def.string_len(size);
                }
                None => {
                    def.string();
                }
            },
            (_, DataKind::Text) => {
                def.text();
            }
            (_, DataKind::Integer) => {
                def.integer();
            }
            (_, DataKind::Boolean) => {
                def.boolean();
            }
            (_, DataKind::DateTime) => {
                def.date_time();
            }
        }

        if self.nullable {
            def.null();
        } else {
            def.not_null();
        }
        if self.primary {
            def.primary_key();
            if self.auto_generated && self.data_kind == DataKind::Integer {
                def.auto_increment();
            }
        } else if self.unique {
            def.unique_key();
        }

        Some(def)
    }
}
