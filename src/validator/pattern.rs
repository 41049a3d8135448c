use super::{FieldIssue, PrimaryKey, Row, Validation, Validator};
use crate::column::Column;
use crate::error::{FieldError, FieldResult};
use crate::value::FieldValue;
use regex::Regex;

/// Requires the value's textual form to match a pattern
#[derive(Debug, Clone)]
pub struct RegexValidator {
    pattern: Regex,
    message: String,
}

impl RegexValidator {
    pub fn new(pattern: Regex) -> Self {
        Self {
            pattern,
            message: "The value has an invalid format.".to_string(),
        }
    }

    /// Compile `pattern`, failing at declaration time if it is malformed
    pub fn parse(pattern: &str) -> FieldResult<Self> {
        Regex::new(pattern)
            .map(Self::new)
            .map_err(|e| FieldError::construction(format!("invalid pattern {pattern:?}: {e}")))
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

impl Validator for RegexValidator {
    fn validate(
        &self,
        value: Option<&FieldValue>,
        _primary: Option<&PrimaryKey>,
        _row: &Row,
        column: &Column,
    ) -> Validation {
        match value.and_then(FieldValue::text_form) {
            Some(text) if self.pattern.is_match(&text) => Validation::Valid,
            _ => Validation::Issue(FieldIssue::invalid(column, self.message.clone())),
        }
    }
}
