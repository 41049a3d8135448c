use super::{FieldIssue, IssueKind, PrimaryKey, Row, Validation, Validator};
use crate::column::Column;
use crate::value::FieldValue;

/// Rejects writes to rows that already exist (the row has a primary key).
///
/// The column can be set on insert only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonUpdatableValidator;

impl Validator for NonUpdatableValidator {
    fn validate(
        &self,
        _value: Option<&FieldValue>,
        primary: Option<&PrimaryKey>,
        _row: &Row,
        column: &Column,
    ) -> Validation {
        match primary {
            None => Validation::Valid,
            Some(_) => Validation::Issue(FieldIssue::new(
                column.name(),
                format!("Updating column \"{}\" is not allowed.", column.name()),
                IssueKind::NonUpdatable,
            )),
        }
    }
}
