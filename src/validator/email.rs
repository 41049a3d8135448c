use super::{FieldIssue, PrimaryKey, Row, Validation, Validator};
use crate::column::Column;
use crate::value::{EmailAddress, FieldValue};

const DEFAULT_MESSAGE: &str = "Value is not a valid email address.";

/// Accepts email values and strings that parse as email addresses
#[derive(Debug, Clone)]
pub struct EmailValidator {
    message: String,
}

impl EmailValidator {
    pub fn with_default_message() -> Self {
        Self::on(DEFAULT_MESSAGE)
    }

    pub fn on(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for EmailValidator {
    fn default() -> Self {
        Self::with_default_message()
    }
}

impl Validator for EmailValidator {
    fn validate(
        &self,
        value: Option<&FieldValue>,
        _primary: Option<&PrimaryKey>,
        _row: &Row,
        column: &Column,
    ) -> Validation {
        let ok = match value {
            Some(FieldValue::Email(_)) => true,
            Some(FieldValue::Text(s)) => EmailAddress::parse(s).is_ok(),
            _ => false,
        };
        if ok {
            Validation::Valid
        } else {
            Validation::Issue(FieldIssue::invalid(column, self.message.clone()))
        }
    }
}
