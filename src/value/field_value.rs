//! In-memory domain values produced by decode/cast.

use super::email::EmailAddress;
use super::storage::StorageValue;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Domain representation of one column value in one row
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Guid(Uuid),
    Email(EmailAddress),
    Url(Url),
    Json(serde_json::Value),
    Timestamp(DateTime<Utc>),
    /// Canonical value of an enumeration member
    Enum(&'static str),
    List(Vec<String>),
    Object(ObjectValue),
}

impl FieldValue {
    /// Kind name used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Integer(_) => "integer",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Guid(_) => "guid",
            FieldValue::Email(_) => "email",
            FieldValue::Url(_) => "url",
            FieldValue::Json(_) => "json",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Enum(_) => "enum",
            FieldValue::List(_) => "list",
            FieldValue::Object(o) => o.type_name(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<&Uuid> {
        match self {
            FieldValue::Guid(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(l) => Some(l),
            _ => None,
        }
    }

    /// Textual form used by string validators (length, pattern, email).
    ///
    /// Returns `None` for values that have no natural string representation.
    pub fn text_form(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(s) => Some(Cow::Borrowed(s)),
            FieldValue::Enum(v) => Some(Cow::Borrowed(v)),
            FieldValue::Email(e) => Some(Cow::Borrowed(e.as_str())),
            FieldValue::Url(u) => Some(Cow::Borrowed(u.as_str())),
            FieldValue::Guid(g) => Some(Cow::Owned(g.hyphenated().to_string())),
            _ => None,
        }
    }

    /// Typed enumeration member, if this is a member of `E`
    pub fn to_enum<E: StoredEnum>(&self) -> Option<E> {
        match self {
            FieldValue::Enum(v) => E::from_value(v),
            _ => None,
        }
    }

    /// Typed object, if this holds a `T`
    pub fn downcast_object<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            FieldValue::Object(o) => o.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Guid(value)
    }
}

impl From<EmailAddress> for FieldValue {
    fn from(value: EmailAddress) -> Self {
        FieldValue::Email(value)
    }
}

impl From<Url> for FieldValue {
    fn from(value: Url) -> Self {
        FieldValue::Url(value)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::Json(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl From<ObjectValue> for FieldValue {
    fn from(value: ObjectValue) -> Self {
        FieldValue::Object(value)
    }
}

/// Type-erased object held by an object column.
///
/// Equality is identity: two `ObjectValue`s are equal when they share the same allocation.
#[derive(Clone)]
pub struct ObjectValue {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ObjectValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    pub(crate) fn from_boxed(type_name: &'static str, inner: Box<dyn Any + Send + Sync>) -> Self {
        Self {
            type_name,
            inner: Arc::from(inner),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub(crate) fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.inner
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// A closed set of string-valued variants that an enum column can store.
///
/// ```
/// use fieldguard::StoredEnum;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Status { Draft, Published }
///
/// impl StoredEnum for Status {
///     fn variants() -> &'static [Self] { &[Status::Draft, Status::Published] }
///     fn value(&self) -> &'static str {
///         match self { Status::Draft => "draft", Status::Published => "published" }
///     }
/// }
///
/// assert_eq!(Status::from_value("draft"), Some(Status::Draft));
/// ```
pub trait StoredEnum: Copy + Send + Sync + 'static {
    fn variants() -> &'static [Self];

    /// Canonical stored value of this variant
    fn value(&self) -> &'static str;

    fn from_value(value: &str) -> Option<Self> {
        Self::variants().iter().copied().find(|v| v.value() == value)
    }
}

/// Anything a column can be asked to cast
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// A raw storage-shaped value
    Storage(StorageValue),
    /// An already decoded domain value
    Value(FieldValue),
}

impl Input {
    pub fn null() -> Self {
        Input::Storage(StorageValue::Null)
    }

    pub(crate) fn shape(&self) -> &'static str {
        match self {
            Input::Storage(s) => s.shape(),
            Input::Value(v) => v.kind(),
        }
    }

    /// `null`, `""` or an empty domain text value
    pub fn is_null_or_empty(&self) -> bool {
        match self {
            Input::Storage(s) => s.is_null_or_empty(),
            Input::Value(FieldValue::Text(s)) => s.is_empty(),
            Input::Value(_) => false,
        }
    }
}

impl From<StorageValue> for Input {
    fn from(value: StorageValue) -> Self {
        Input::Storage(value)
    }
}

impl From<FieldValue> for Input {
    fn from(value: FieldValue) -> Self {
        Input::Value(value)
    }
}

impl From<Option<FieldValue>> for Input {
    fn from(value: Option<FieldValue>) -> Self {
        value.map_or(Input::null(), Input::Value)
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Input::Storage(value.into())
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Input::Storage(value.into())
    }
}

impl From<i64> for Input {
    fn from(value: i64) -> Self {
        Input::Storage(value.into())
    }
}

impl From<i32> for Input {
    fn from(value: i32) -> Self {
        Input::Storage(value.into())
    }
}

impl From<bool> for Input {
    fn from(value: bool) -> Self {
        Input::Storage(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Color {
        Red,
        Green,
    }

    impl StoredEnum for Color {
        fn variants() -> &'static [Self] {
            &[Color::Red, Color::Green]
        }

        fn value(&self) -> &'static str {
            match self {
                Color::Red => "red",
                Color::Green => "green",
            }
        }
    }

    #[test]
    fn test_enum_round_trip() {
        let v = FieldValue::Enum(Color::Green.value());
        assert_eq!(v.to_enum::<Color>(), Some(Color::Green));
        assert_eq!(FieldValue::Enum("blue").to_enum::<Color>(), None);
    }

    #[test]
    fn test_object_identity_equality() {
        let a = ObjectValue::new(vec![1u8, 2, 3]);
        let b = a.clone();
        let c = ObjectValue::new(vec![1u8, 2, 3]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.downcast_ref::<Vec<u8>>(), Some(&vec![1, 2, 3]));
        assert!(a.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_input_null_or_empty() {
        assert!(Input::null().is_null_or_empty());
        assert!(Input::from("").is_null_or_empty());
        assert!(Input::from(FieldValue::Text(String::new())).is_null_or_empty());
        assert!(!Input::from(0i64).is_null_or_empty());
        assert!(!Input::from(FieldValue::List(vec![])).is_null_or_empty());
    }

    #[test]
    fn test_text_form() {
        let guid = Uuid::nil();
        assert_eq!(
            FieldValue::Guid(guid).text_form().as_deref(),
            Some("00000000-0000-0000-0000-000000000000")
        );
        assert_eq!(FieldValue::Enum("red").text_form().as_deref(), Some("red"));
        assert!(FieldValue::Integer(3).text_form().is_none());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(FieldValue::from(5i64).as_integer(), Some(5));
        assert_eq!(FieldValue::from("x".to_string()).as_text(), Some("x"));
        assert_eq!(FieldValue::from(true).as_bool(), Some(true));
        assert_eq!(FieldValue::from(true).as_integer(), None);
    }
}
