//! Factories for the scalar column types.
//!
//! Every factory has the same three entry points: `required(name)`,
//! `nullable(name)` and `on(name, options)`. Each attaches the validators
//! that enforce its domain invariant, see [`default_validators`].

use crate::codec::{
    BooleanCodec, ColumnCodec, EmailCodec, EnumCodec, GuidCodec, IntegerBound, IntegerCodec,
    JsonCodec, ListCodec, NonEmptyStringCodec, NullCodec, NullableIntegerCodec, ObjectCodec,
    TextCodec, TimestampCodec, UrlCodec, GUID_LENGTH,
};
use crate::column::{Column, ColumnOptions, DefaultValue};
use crate::error::FieldResult;
use crate::validator::{
    from_fn, EmailValidator, LengthValidator, RegexValidator, Validation, Validator,
};
use crate::value::{FieldValue, StoredEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use uuid::Uuid;

/// Canonical hyphenated UUID layout
pub const GUID_PATTERN: &str =
    r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

/// Validators enforcing the domain invariant of `codec`'s column type
pub fn default_validators(codec: &ColumnCodec) -> FieldResult<Vec<Arc<dyn Validator>>> {
    let validators = match codec {
        ColumnCodec::Text(_) => vec![kind_check("The value must be a string.", |v| {
            matches!(v, FieldValue::Text(_))
        })],
        ColumnCodec::NonEmptyString(_) => vec![kind_check(
            "The value must be a non-empty string.",
            |v| matches!(v, FieldValue::Text(s) if !s.is_empty()),
        )],
        ColumnCodec::Integer(c) => vec![integer_check(c.bound())],
        ColumnCodec::NullableInteger(_) => vec![integer_check(IntegerBound::Any)],
        ColumnCodec::Boolean(_) => vec![kind_check("The value must be a boolean.", |v| {
            matches!(v, FieldValue::Boolean(_))
        })],
        ColumnCodec::Guid(_) => vec![
            Arc::new(
                RegexValidator::parse(GUID_PATTERN)?.with_message("The value must be a valid GUID."),
            ) as Arc<dyn Validator>,
            Arc::new(LengthValidator::exactly(GUID_LENGTH)),
        ],
        ColumnCodec::Email(_) => vec![Arc::new(EmailValidator::default()) as Arc<dyn Validator>],
        ColumnCodec::Url(_) => vec![kind_check("The value must be a valid URL.", |v| match v {
            FieldValue::Url(_) => true,
            FieldValue::Text(s) => url::Url::parse(s).is_ok(),
            _ => false,
        })],
        ColumnCodec::Json(_) => vec![kind_check("The value must be a JSON document.", |v| {
            matches!(v, FieldValue::Json(_))
        })],
        ColumnCodec::Object(c) => {
            let expected = c.type_name();
            vec![from_fn(move |value, _, _, column| {
                Validation::check(
                    matches!(value, Some(FieldValue::Object(o)) if o.type_name() == expected),
                    column,
                    &format!("The value must be an instance of {expected}."),
                )
            })]
        }
        ColumnCodec::Enum(c) => {
            let (min, max) = c.length_range();
            vec![Arc::new(LengthValidator::between(min, max)) as Arc<dyn Validator>]
        }
        ColumnCodec::Timestamp(_) => vec![kind_check("The value must be a timestamp.", |v| {
            matches!(v, FieldValue::Timestamp(_))
        })],
        ColumnCodec::List(_) => vec![kind_check("The value must be a list of strings.", |v| {
            matches!(v, FieldValue::List(_))
        })],
        ColumnCodec::Null(_) | ColumnCodec::Raw(_) => Vec::new(),
    };
    Ok(validators)
}

fn kind_check(message: &'static str, accepts: fn(&FieldValue) -> bool) -> Arc<dyn Validator> {
    from_fn(move |value, _, _, column| Validation::check(value.is_some_and(accepts), column, message))
}

fn integer_check(bound: IntegerBound) -> Arc<dyn Validator> {
    let message = match bound {
        IntegerBound::Any => "The value must be an integer.",
        IntegerBound::Positive => "The value must be a positive integer.",
        IntegerBound::NonNegative => "The value must be a non-negative integer.",
    };
    from_fn(move |value, _, _, column| {
        Validation::check(
            value
                .and_then(FieldValue::as_integer)
                .is_some_and(|i| bound.admits(i)),
            column,
            message,
        )
    })
}

fn scalar(
    name: impl Into<String>,
    codec: impl Into<ColumnCodec>,
    options: ColumnOptions,
    default_nullable: bool,
) -> FieldResult<Column> {
    let codec = codec.into();
    let mut builder = Column::builder(name, codec.clone());
    if let ColumnCodec::Guid(_) = codec {
        builder = builder.size(GUID_LENGTH as u32);
    }
    if let ColumnCodec::Enum(c) = &codec {
        builder = builder.size(c.length_range().1 as u32);
    }
    builder = builder.options(options, default_nullable);
    for validator in default_validators(&codec)? {
        builder = builder.validator(validator);
    }
    builder.build()
}

macro_rules! scalar_field {
    ($(#[$doc:meta])* $field:ident => $codec:expr, nullable by default: $default_nullable:expr) => {
        $(#[$doc])*
        pub struct $field;

        impl $field {
            pub fn required(name: impl Into<String>) -> FieldResult<Column> {
                Self::on(name, ColumnOptions::new().required(true))
            }

            pub fn nullable(name: impl Into<String>) -> FieldResult<Column> {
                Self::on(name, ColumnOptions::new().nullable(true))
            }

            pub fn on(name: impl Into<String>, options: ColumnOptions) -> FieldResult<Column> {
                scalar(name, $codec, options, $default_nullable)
            }
        }
    };
}

scalar_field!(
    /// Unbounded text; `""` is a value, not absence
    TextField => TextCodec, nullable by default: false
);
scalar_field!(
    /// Short string that must not be empty
    NonEmptyStringField => NonEmptyStringCodec, nullable by default: false
);
scalar_field!(IntegerField => IntegerCodec::default(), nullable by default: false);
scalar_field!(PositiveIntegerField => IntegerCodec::positive(), nullable by default: false);
scalar_field!(NonNegativeIntegerField => IntegerCodec::non_negative(), nullable by default: false);
scalar_field!(
    /// Boolean stored as `0`/`1`
    BooleanField => BooleanCodec, nullable by default: false
);
scalar_field!(
    /// UUID in its 36-character canonical form
    GuidField => GuidCodec, nullable by default: false
);
scalar_field!(EmailField => EmailCodec, nullable by default: false);
scalar_field!(UrlField => UrlCodec, nullable by default: false);
scalar_field!(JsonField => JsonCodec, nullable by default: false);
scalar_field!(
    /// Whole-second timestamp. `on` without flags declares a nullable column.
    TimestampField => TimestampCodec, nullable by default: true
);
scalar_field!(
    /// Comma-delimited list of strings.
    ///
    /// An empty list and an absent value are both stored as `NULL` and read
    /// back as absent.
    ListField => ListCodec, nullable by default: false
);

impl GuidField {
    pub fn required_unique(name: impl Into<String>) -> FieldResult<Column> {
        Self::on(name, ColumnOptions::new().required(true).unique(true))
    }
}

/// Integer stored as a string; `""` means absent
pub struct NullableIntegerField;

impl NullableIntegerField {
    pub fn on(name: impl Into<String>) -> FieldResult<Column> {
        scalar(name, NullableIntegerCodec, ColumnOptions::new().nullable(true), true)
    }
}

/// Column whose value is always absent
pub struct NullField;

impl NullField {
    pub fn on(name: impl Into<String>) -> FieldResult<Column> {
        scalar(name, NullCodec, ColumnOptions::new().nullable(true), true)
    }
}

/// Auto-incrementing integer primary key
pub struct PrimaryIntegerField;

impl PrimaryIntegerField {
    pub fn on(name: impl Into<String>) -> FieldResult<Column> {
        let codec = ColumnCodec::from(IntegerCodec::default());
        let mut builder = Column::builder(name, codec.clone())
            .primary(true)
            .required(true)
            .unique(true)
            .auto_generated(true);
        for validator in default_validators(&codec)? {
            builder = builder.validator(validator);
        }
        builder.build()
    }
}

/// GUID primary key generated (v4) when a new row has none
pub struct PrimaryGuidField;

impl PrimaryGuidField {
    pub fn on(name: impl Into<String>) -> FieldResult<Column> {
        let codec = ColumnCodec::from(GuidCodec);
        let mut builder = Column::builder(name, codec.clone())
            .primary(true)
            .required(true)
            .unique(true)
            .auto_generated(true)
            .size(GUID_LENGTH as u32)
            .default_value(DefaultValue::Generated(|| FieldValue::Guid(Uuid::new_v4())));
        for validator in default_validators(&codec)? {
            builder = builder.validator(validator);
        }
        builder.build()
    }
}

/// Member of a [`StoredEnum`], stored as a string
pub struct EnumField;

impl EnumField {
    pub fn required<E: StoredEnum>(name: impl Into<String>) -> FieldResult<Column> {
        Self::on::<E>(name, ColumnOptions::new().required(true))
    }

    pub fn nullable<E: StoredEnum>(name: impl Into<String>) -> FieldResult<Column> {
        Self::on::<E>(name, ColumnOptions::new().nullable(true))
    }

    pub fn on<E: StoredEnum>(name: impl Into<String>, options: ColumnOptions) -> FieldResult<Column> {
        Self::with_codec(name, EnumCodec::of::<E>(), options)
    }

    /// Enum column with restore/persist hooks already set on `codec`
    pub fn with_codec(
        name: impl Into<String>,
        codec: EnumCodec,
        options: ColumnOptions,
    ) -> FieldResult<Column> {
        scalar(name, codec, options, false)
    }
}

/// Opaque object serialized by caller-supplied hooks
pub struct ObjectField;

impl ObjectField {
    /// Object stored as its JSON serialization
    pub fn json<T>(name: impl Into<String>, options: ColumnOptions) -> FieldResult<Column>
    where
        T: Serialize + DeserializeOwned + Any + Send + Sync,
    {
        Self::with_codec(name, ObjectCodec::json::<T>(), options)
    }

    pub fn with_codec(
        name: impl Into<String>,
        codec: ObjectCodec,
        options: ColumnOptions,
    ) -> FieldResult<Column> {
        scalar(name, codec, options, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use crate::validator::{IssueKind, Row};
    use crate::value::{Input, ObjectValue, StorageValue};
    use chrono::{TimeZone, Utc};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Size {
        Xs,
        Large,
        Gigantic,
    }

    impl StoredEnum for Size {
        fn variants() -> &'static [Self] {
            &[Size::Xs, Size::Large, Size::Gigantic]
        }

        fn value(&self) -> &'static str {
            match self {
                Size::Xs => "xs",
                Size::Large => "large",
                Size::Gigantic => "gigantic",
            }
        }
    }

    fn issues(column: &Column, value: FieldValue) -> Vec<crate::validator::FieldIssue> {
        column.validate(Some(&value), None, &Row::new())
    }

    #[test]
    fn test_factory_flags() {
        let required = TextField::required("a").unwrap();
        assert!(required.is_required() && !required.is_nullable());
        let nullable = TextField::nullable("a").unwrap();
        assert!(nullable.is_nullable() && !nullable.is_required());
        assert!(TimestampField::on("at", ColumnOptions::new()).unwrap().is_nullable());
        assert!(!TextField::on("a", ColumnOptions::new()).unwrap().is_nullable());
    }

    #[test]
    fn test_non_negative_integer_cast() {
        let column = NonNegativeIntegerField::required("stock").unwrap();
        assert_eq!(column.cast("10").unwrap(), Some(FieldValue::Integer(10)));
        assert!(column.cast("-1").unwrap_err().is_invalid_input());
        assert!(column.cast(Input::null()).is_err());

        let nullable = NonNegativeIntegerField::nullable("stock").unwrap();
        assert_eq!(nullable.cast(Input::null()).unwrap(), None);
    }

    #[test]
    fn test_positive_integer_validator() {
        let column = PositiveIntegerField::required("qty").unwrap();
        assert!(issues(&column, FieldValue::Integer(1)).is_empty());
        assert_eq!(issues(&column, FieldValue::Integer(0)).len(), 1);
    }

    #[test]
    fn test_enum_length_bounds() {
        let column = EnumField::required::<Size>("size").unwrap();
        assert_eq!(column.size(), Some(8));
        assert!(issues(&column, FieldValue::Text("ab".into())).is_empty());
        assert!(issues(&column, FieldValue::Text("abcdefgh".into())).is_empty());
        assert_eq!(issues(&column, FieldValue::Text("a".into())).len(), 1);
        assert_eq!(issues(&column, FieldValue::Text("abcdefghi".into())).len(), 1);
        assert!(issues(&column, FieldValue::Enum("large")).is_empty());
    }

    #[test]
    fn test_guid_validators() {
        let column = GuidField::required_unique("ref").unwrap();
        assert!(column.is_unique());
        assert_eq!(column.size(), Some(36));
        assert!(issues(&column, FieldValue::Guid(Uuid::new_v4())).is_empty());
        let bad = issues(&column, FieldValue::Text("not-a-guid".into()));
        assert_eq!(bad.len(), 2);
        assert!(bad.iter().all(|i| i.kind == IssueKind::InvalidValue));
    }

    #[test]
    fn test_primary_guid_generates_default() {
        let column = PrimaryGuidField::on("id").unwrap();
        assert!(column.is_primary() && column.is_auto_generated());
        let a = column.default_value().unwrap();
        let b = column.default_value().unwrap();
        assert!(a.as_guid().is_some());
        assert_ne!(a, b);
    }

    #[test]
    fn test_timestamp_decode_shapes() {
        let column = TimestampField::required("created").unwrap();
        let at = Utc.with_ymd_and_hms(2022, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(
            column.decode(&StorageValue::from("2022-05-06 07:08:09")).unwrap(),
            Some(FieldValue::Timestamp(at))
        );
        assert!(column
            .decode(&StorageValue::Boolean(true))
            .unwrap_err()
            .is_type_mismatch());
    }

    #[test]
    fn test_list_collapses_empty() {
        let column = ListField::nullable("tags").unwrap();
        assert_eq!(column.encode(Some(&FieldValue::List(vec![]))).unwrap(), StorageValue::Null);
        assert_eq!(column.encode(None).unwrap(), StorageValue::Null);
    }

    #[test]
    fn test_null_field() {
        let column = NullField::on("placeholder").unwrap();
        assert_eq!(column.decode(&StorageValue::from("x")).unwrap(), None);
        assert!(column.cast("x").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_nullable_integer_field() {
        let column = NullableIntegerField::on("legacy_id").unwrap();
        assert_eq!(column.encode(None).unwrap(), StorageValue::from(""));
        assert_eq!(column.decode(&StorageValue::from("42")).unwrap(), Some(FieldValue::Integer(42)));
    }

    #[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
    struct Dimensions {
        w: u32,
        h: u32,
    }

    #[test]
    fn test_object_field_type_check() {
        let column = ObjectField::json::<Dimensions>("dims", ColumnOptions::new()).unwrap();
        let ok = FieldValue::Object(ObjectValue::new(Dimensions { w: 1, h: 2 }));
        assert!(issues(&column, ok).is_empty());
        let wrong = FieldValue::Object(ObjectValue::new(5_u8));
        assert_eq!(issues(&column, wrong).len(), 1);
    }

    #[test]
    fn test_required_and_nullable_options_rejected() {
        let result = EmailField::on("mail", ColumnOptions::new().required(true).nullable(true));
        assert!(matches!(result, Err(FieldError::Construction(_))));
    }
}
