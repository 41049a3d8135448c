use super::{shape_mismatch, value_mismatch, ValueCodec};
use crate::error::{FieldError, FieldResult};
use crate::value::{DataKind, FieldValue, Input, ObjectValue, StorageValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Boxed value returned by a restorer hook
pub type Restored = Box<dyn Any + Send + Sync>;

type Persister = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> FieldResult<StorageValue> + Send + Sync>;
type Restorer = Arc<dyn Fn(&str) -> FieldResult<Restored> + Send + Sync>;

fn is_instance<T: Any>(value: &(dyn Any + Send + Sync)) -> bool {
    value.is::<T>()
}

/// Opaque object column with caller-supplied persist/restore hooks.
///
/// Both hook contracts are checked on every call: a restorer must produce the
/// declared type and a persister must produce a string (or null).
#[derive(Clone)]
pub struct ObjectCodec {
    type_name: &'static str,
    accepts: fn(&(dyn Any + Send + Sync)) -> bool,
    persister: Persister,
    restorer: Restorer,
}

impl ObjectCodec {
    /// Codec for objects of type `T` with explicit hooks.
    ///
    /// The restorer is deliberately untyped: its result is verified against `T`.
    pub fn new<T, P, R>(persister: P, restorer: R) -> Self
    where
        T: Any + Send + Sync,
        P: Fn(&T) -> FieldResult<StorageValue> + Send + Sync + 'static,
        R: Fn(&str) -> FieldResult<Restored> + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let persister: Persister = Arc::new(move |object: &(dyn Any + Send + Sync)| {
            match object.downcast_ref::<T>() {
                Some(typed) => persister(typed),
                None => Err(FieldError::type_mismatch("<object>", type_name, "another object type")),
            }
        });
        Self {
            type_name,
            accepts: is_instance::<T>,
            persister,
            restorer: Arc::new(restorer),
        }
    }

    /// Codec storing `T` as its JSON serialization
    pub fn json<T>() -> Self
    where
        T: Serialize + DeserializeOwned + Any + Send + Sync,
    {
        Self::new::<T, _, _>(
            |object: &T| {
                serde_json::to_string(object)
                    .map(StorageValue::String)
                    .map_err(|e| FieldError::invalid_input("<object>", e.to_string()))
            },
            |stored: &str| {
                serde_json::from_str::<T>(stored)
                    .map(|v| Box::new(v) as Restored)
                    .map_err(|e| FieldError::invalid_input("<object>", e.to_string()))
            },
        )
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn restore(&self, column: &str, stored: &str) -> FieldResult<Option<FieldValue>> {
        let restored = (self.restorer)(stored).map_err(|e| rename_column(e, column))?;
        if !(self.accepts)(restored.as_ref()) {
            return Err(FieldError::RestoreContractViolation {
                column: column.to_string(),
                expected: self.type_name.to_string(),
                actual: "a value of another type".to_string(),
            });
        }
        Ok(Some(FieldValue::Object(ObjectValue::from_boxed(
            self.type_name,
            restored,
        ))))
    }
}

fn rename_column(err: FieldError, column: &str) -> FieldError {
    match err {
        FieldError::InvalidInput { message, .. } => FieldError::invalid_input(column, message),
        FieldError::TypeMismatch { expected, actual, .. } => {
            FieldError::type_mismatch(column, expected, actual)
        }
        other => other,
    }
}

impl fmt::Debug for ObjectCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectCodec")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl ValueCodec for ObjectCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::Text
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        match raw {
            StorageValue::String(s) => self.restore(column, s),
            other => Err(shape_mismatch(column, "serialized object string", other)),
        }
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        let object = match value {
            Some(FieldValue::Object(o)) if (self.accepts)(o.as_any()) => o,
            other => return Err(value_mismatch(column, self.type_name, other)),
        };
        match (self.persister)(object.as_any()).map_err(|e| rename_column(e, column))? {
            stored @ (StorageValue::String(_) | StorageValue::Null) => Ok(stored),
            other => Err(FieldError::PersistContractViolation {
                column: column.to_string(),
                actual: other.shape().to_string(),
            }),
        }
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        match input {
            Input::Value(FieldValue::Object(o)) if (self.accepts)(o.as_any()) => {
                Ok(Some(FieldValue::Object(o)))
            }
            Input::Value(FieldValue::Text(s)) => self.restore(column, &s),
            Input::Storage(raw) => self.decode(column, &raw),
            Input::Value(other) => Err(FieldError::invalid_input(
                column,
                format!("cannot interpret {} as {}", other.kind(), self.type_name),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_json_round_trip() {
        let codec = ObjectCodec::json::<Point>();
        let raw = StorageValue::from(r#"{"x":1,"y":2}"#);
        let decoded = codec.decode("pos", &raw).unwrap().unwrap();
        assert_eq!(decoded.downcast_object::<Point>(), Some(&Point { x: 1, y: 2 }));
        assert_eq!(codec.encode("pos", Some(&decoded)).unwrap(), raw);
    }

    #[test]
    fn test_restorer_contract_violation() {
        let codec = ObjectCodec::new::<Point, _, _>(
            |_p: &Point| Ok(StorageValue::from("ignored")),
            |_s: &str| Ok(Box::new("not a point".to_string()) as Restored),
        );
        let err = codec.decode("pos", &StorageValue::from("x")).unwrap_err();
        assert!(matches!(err, FieldError::RestoreContractViolation { .. }));
    }

    #[test]
    fn test_persister_contract_violation() {
        let codec = ObjectCodec::new::<Point, _, _>(
            |p: &Point| Ok(StorageValue::Integer(p.x.into())),
            |_s: &str| Ok(Box::new(Point { x: 0, y: 0 }) as Restored),
        );
        let value = FieldValue::Object(ObjectValue::new(Point { x: 3, y: 4 }));
        let err = codec.encode("pos", Some(&value)).unwrap_err();
        assert!(matches!(err, FieldError::PersistContractViolation { .. }));
    }

    #[test]
    fn test_foreign_object_rejected() {
        let codec = ObjectCodec::json::<Point>();
        let value = FieldValue::Object(ObjectValue::new(42u8));
        assert!(codec.encode("pos", Some(&value)).unwrap_err().is_type_mismatch());
    }
}
