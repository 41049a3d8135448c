//! # Fieldguard
//!
//! Typed table columns for sea-query based data layers.
//!
//! Columns are declared once per entity through the factories in [`fields`],
//! [`expression`], [`subquery`] and [`relation`]. Each column carries a codec
//! that converts between storage values (`string`, `integer`, `boolean`,
//! `null`) and domain values, a nullability wrapper, and validators that run
//! when rows are persisted. Computed columns compile into SQL fragments with
//! `%s` placeholders for the local columns they are built from.
//!
//! ```
//! use fieldguard::fields::PositiveIntegerField;
//! use fieldguard::{FieldValue, StorageValue};
//!
//! let qty = PositiveIntegerField::required("qty").unwrap();
//! assert_eq!(qty.decode(&StorageValue::Integer(3)).unwrap(), Some(FieldValue::Integer(3)));
//! assert!(qty.cast("0").is_err());
//! ```

pub mod codec;
pub mod column;
pub mod config;
pub mod dialect;
pub mod error;
pub mod expression;
pub mod fields;
pub mod relation;
pub mod schema;
pub mod session;
pub mod subquery;
pub mod validator;
pub mod value;

pub use column::{Column, ColumnBuilder, ColumnDescriptor, ColumnOptions, ColumnSource, DefaultValue};
pub use config::{AliasPolicy, FieldsConfig};
pub use dialect::Dialect;
pub use error::{FieldError, FieldResult};
pub use expression::{CastField, Expression, ExpressionField, Literal, StaticValueField};
pub use relation::{LookupField, MimicField, ReferenceField};
pub use schema::TableSchema;
pub use session::QuerySession;
pub use subquery::{ExternalField, ExternalListField, SubquerySpec};
pub use validator::{FieldIssue, IssueKind, Validation, Validator};
pub use value::{DataKind, FieldValue, Input, StorageValue, StoredEnum};
