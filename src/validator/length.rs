use super::{FieldIssue, PrimaryKey, Row, Validation, Validator};
use crate::column::Column;
use crate::value::FieldValue;

/// Bounds the character count of a string-like value (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthValidator {
    min: Option<usize>,
    max: Option<usize>,
}

impl LengthValidator {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub fn exactly(len: usize) -> Self {
        Self::between(len, len)
    }

    pub fn min(&self) -> Option<usize> {
        self.min
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }
}

impl Validator for LengthValidator {
    fn validate(
        &self,
        value: Option<&FieldValue>,
        _primary: Option<&PrimaryKey>,
        _row: &Row,
        column: &Column,
    ) -> Validation {
        let Some(text) = value.and_then(FieldValue::text_form) else {
            return Validation::Issue(FieldIssue::invalid(column, "The value is not a string."));
        };
        let len = text.chars().count();

        if let Some(min) = self.min.filter(|min| len < *min) {
            return Validation::Issue(FieldIssue::invalid(
                column,
                format!("The value must be at least {min} characters long."),
            ));
        }
        if let Some(max) = self.max.filter(|max| len > *max) {
            return Validation::Issue(FieldIssue::invalid(
                column,
                format!("The value must be at most {max} characters long."),
            ));
        }
        Validation::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::TextField;

    fn check(validator: &LengthValidator, s: &str) -> bool {
        let column = TextField::required("code").unwrap();
        validator
            .validate(Some(&FieldValue::Text(s.to_string())), None, &Row::new(), &column)
            .is_valid()
    }

    #[test]
    fn test_bounds_inclusive() {
        let v = LengthValidator::between(2, 8);
        assert!(!check(&v, "a"));
        assert!(check(&v, "ab"));
        assert!(check(&v, "abcdefgh"));
        assert!(!check(&v, "abcdefghi"));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert!(check(&LengthValidator::exactly(3), "ёжи"));
    }

    #[test]
    fn test_non_string_value() {
        let column = TextField::required("code").unwrap();
        let result = LengthValidator::between(1, 2).validate(
            Some(&FieldValue::Integer(5)),
            None,
            &Row::new(),
            &column,
        );
        assert!(!result.is_valid());
    }
}
