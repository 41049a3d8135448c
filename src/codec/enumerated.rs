use super::{shape_mismatch, value_mismatch, ValueCodec};
use crate::error::{FieldError, FieldResult};
use crate::value::{DataKind, FieldValue, Input, StoredEnum, StorageValue};
use std::fmt;
use std::sync::Arc;

type RestoreHook = Arc<dyn Fn(&str) -> Option<&'static str> + Send + Sync>;
type PersistHook = Arc<dyn Fn(&'static str) -> String + Send + Sync>;

/// Enumeration stored as a string.
///
/// By default the stored string is the variant's canonical value. Restore and
/// persist hooks let the storage representation differ, e.g. legacy codes.
#[derive(Clone)]
pub struct EnumCodec {
    type_name: &'static str,
    variants: Vec<&'static str>,
    restorer: Option<RestoreHook>,
    persister: Option<PersistHook>,
}

impl EnumCodec {
    pub fn of<E: StoredEnum>() -> Self {
        Self {
            type_name: std::any::type_name::<E>(),
            variants: E::variants().iter().map(StoredEnum::value).collect(),
            restorer: None,
            persister: None,
        }
    }

    /// Map a stored string onto a variant (return `None` for unknown codes)
    pub fn with_restorer<E, F>(mut self, restorer: F) -> Self
    where
        E: StoredEnum,
        F: Fn(&str) -> Option<E> + Send + Sync + 'static,
    {
        self.restorer = Some(Arc::new(move |stored: &str| restorer(stored).map(|e| e.value())));
        self
    }

    /// Map a variant onto its stored string
    pub fn with_persister<E, F>(mut self, persister: F) -> Self
    where
        E: StoredEnum,
        F: Fn(E) -> String + Send + Sync + 'static,
    {
        self.persister = Some(Arc::new(move |value: &'static str| match E::from_value(value) {
            Some(variant) => persister(variant),
            None => value.to_string(),
        }));
        self
    }

    pub fn variants(&self) -> &[&'static str] {
        &self.variants
    }

    /// Minimum and maximum character length across all variants.
    ///
    /// An empty variant set yields `(1, 1)`.
    pub fn length_range(&self) -> (usize, usize) {
        let mut lengths = self.variants.iter().map(|v| v.chars().count());
        match lengths.next() {
            None => (1, 1),
            Some(first) => lengths.fold((first, first), |(min, max), len| (min.min(len), max.max(len))),
        }
    }

    fn member(&self, value: &str) -> Option<&'static str> {
        self.variants.iter().copied().find(|v| *v == value)
    }

    fn restore(&self, column: &str, stored: &str) -> FieldResult<Option<FieldValue>> {
        let canonical = match &self.restorer {
            Some(hook) => hook(stored),
            None => self.member(stored),
        };
        canonical
            .map(|v| Some(FieldValue::Enum(v)))
            .ok_or_else(|| {
                FieldError::invalid_input(
                    column,
                    format!("\"{stored}\" is not a member of {}", self.type_name),
                )
            })
    }
}

impl fmt::Debug for EnumCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumCodec")
            .field("type_name", &self.type_name)
            .field("variants", &self.variants)
            .field("restorer", &self.restorer.is_some())
            .field("persister", &self.persister.is_some())
            .finish()
    }
}

impl ValueCodec for EnumCodec {
    fn data_kind(&self) -> DataKind {
        DataKind::String
    }

    fn decode(&self, column: &str, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        match raw {
            StorageValue::String(s) => self.restore(column, s),
            other => Err(shape_mismatch(column, "enum string", other)),
        }
    }

    fn encode(&self, column: &str, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        let canonical = match value {
            Some(FieldValue::Enum(v)) => self.member(v).ok_or_else(|| {
                FieldError::invalid_input(
                    column,
                    format!("\"{v}\" is not a member of {}", self.type_name),
                )
            })?,
            other => return Err(value_mismatch(column, self.type_name, other)),
        };
        let stored = match &self.persister {
            Some(hook) => hook(canonical),
            None => canonical.to_string(),
        };
        Ok(StorageValue::String(stored))
    }

    fn cast(&self, column: &str, input: Input) -> FieldResult<Option<FieldValue>> {
        match input {
            Input::Value(FieldValue::Enum(v)) if self.member(v).is_some() => {
                Ok(Some(FieldValue::Enum(v)))
            }
            Input::Value(FieldValue::Text(s)) => self.restore(column, &s),
            Input::Storage(StorageValue::Integer(i)) => self.restore(column, &i.to_string()),
            Input::Storage(raw) => self.decode(column, &raw),
            Input::Value(other) => Err(FieldError::invalid_input(
                column,
                format!("unsupported value for {}: {}", self.type_name, other.kind()),
            )),
        }
    }

    fn absent_on_empty_string(&self) -> bool {
        true
    }
}
