use super::{PrimaryKey, Row, Validation, Validator};
use crate::column::Column;
use crate::value::FieldValue;
use std::sync::Arc;

/// Skips the wrapped validator for absent values
pub struct NullableValidator {
    inner: Arc<dyn Validator>,
}

impl NullableValidator {
    /// Wrap `validator` when `should_wrap` is set.
    ///
    /// A validator that is already a nullable wrapper is returned as-is (the
    /// same `Arc`), so attaching it twice never nests wrappers.
    pub fn wrap_if(should_wrap: bool, validator: Arc<dyn Validator>) -> Arc<dyn Validator> {
        if !should_wrap || validator.is_nullable_wrapper() {
            validator
        } else {
            Arc::new(Self { inner: validator })
        }
    }

    pub fn inner(&self) -> &Arc<dyn Validator> {
        &self.inner
    }
}

impl Validator for NullableValidator {
    fn validate(
        &self,
        value: Option<&FieldValue>,
        primary: Option<&PrimaryKey>,
        row: &Row,
        column: &Column,
    ) -> Validation {
        match value {
            None => Validation::Valid,
            Some(_) => self.inner.validate(value, primary, row, column),
        }
    }

    fn is_nullable_wrapper(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::TextField;
    use crate::validator::from_fn;

    fn always_invalid() -> Arc<dyn Validator> {
        from_fn(|_, _, _, _| Validation::Invalid("always".into()))
    }

    #[test]
    fn test_absent_value_skips_inner() {
        let column = TextField::nullable("note").unwrap();
        let wrapped = NullableValidator::wrap_if(true, always_invalid());
        let row = Row::new();
        assert!(wrapped.validate(None, None, &row, &column).is_valid());
        assert!(!wrapped
            .validate(Some(&FieldValue::Text("x".into())), None, &row, &column)
            .is_valid());
    }

    #[test]
    fn test_wrapping_is_idempotent() {
        let once = NullableValidator::wrap_if(true, always_invalid());
        let twice = NullableValidator::wrap_if(true, once.clone());
        assert!(Arc::ptr_eq(&once, &twice));
    }

    #[test]
    fn test_no_wrap_when_not_nullable() {
        let inner = always_invalid();
        let result = NullableValidator::wrap_if(false, inner.clone());
        assert!(Arc::ptr_eq(&inner, &result));
        assert!(!result.is_nullable_wrapper());
    }
}
