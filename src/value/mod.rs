//! Values on both sides of the storage boundary.
//!
//! - `storage`: raw storage shapes and `sea_query::Value` conversion
//! - `field_value`: decoded domain values, cast inputs, enum and object support
//! - `email`: the email address value object

mod email;
mod field_value;
mod storage;

pub use email::{EmailAddress, InvalidEmail};
pub use field_value::{FieldValue, Input, ObjectValue, StoredEnum};
pub use storage::{DataKind, StorageValue};

/// Storage layout of timestamps, whole seconds
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
