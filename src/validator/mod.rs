//! Column validators.
//!
//! A validator is a check bound to a column. It sees the domain value, the
//! row's primary key (absent for new rows), the whole row and the column, and
//! reports a [`Validation`]. Failures are data, never errors: the persistence
//! pipeline collects them per row as [`FieldIssue`]s.
//!
//! Every validator attached to a column goes through
//! [`NullableValidator::wrap_if`], so a nullable column never runs a check
//! against an absent value.

mod email;
mod length;
mod non_updatable;
mod nullable;
mod pattern;

pub use email::EmailValidator;
pub use length::LengthValidator;
pub use non_updatable::NonUpdatableValidator;
pub use nullable::NullableValidator;
pub use pattern::RegexValidator;

use crate::column::Column;
use crate::value::FieldValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Values of one row keyed by column name; absent values are simply missing
pub type Row = BTreeMap<String, FieldValue>;

/// Primary key values of an existing row
pub type PrimaryKey = BTreeMap<String, FieldValue>;

/// Kind of a structured validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    InvalidValue,
    RequiredValueMissing,
    /// An update touched a column that may only be written on insert
    NonUpdatable,
}

/// Structured validation failure for one column of one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub column: String,
    pub message: String,
    pub kind: IssueKind,
}

impl FieldIssue {
    pub fn new(column: impl Into<String>, message: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            column: column.into(),
            message: message.into(),
            kind,
        }
    }

    pub fn invalid(column: &Column, message: impl Into<String>) -> Self {
        Self::new(column.name(), message, IssueKind::InvalidValue)
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.column, self.message)
    }
}

/// Outcome of a single validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    /// Invalid, described by a bare message
    Invalid(String),
    Issue(FieldIssue),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    /// `Valid` when `ok`, otherwise an `InvalidValue` issue for `column`
    pub fn check(ok: bool, column: &Column, message: &str) -> Self {
        if ok {
            Validation::Valid
        } else {
            Validation::Issue(FieldIssue::invalid(column, message))
        }
    }

    /// Normalize into an issue for `column`, or `None` when valid
    pub fn into_issue(self, column: &Column) -> Option<FieldIssue> {
        match self {
            Validation::Valid => None,
            Validation::Invalid(message) => Some(FieldIssue::invalid(column, message)),
            Validation::Issue(issue) => Some(issue),
        }
    }
}

/// A check attached to a column
pub trait Validator: Send + Sync {
    fn validate(
        &self,
        value: Option<&FieldValue>,
        primary: Option<&PrimaryKey>,
        row: &Row,
        column: &Column,
    ) -> Validation;

    /// Whether this validator already bypasses absent values
    fn is_nullable_wrapper(&self) -> bool {
        false
    }
}

/// Validator backed by a closure with the fixed four-argument shape
pub struct FnValidator<F> {
    check: F,
}

impl<F> FnValidator<F>
where
    F: Fn(Option<&FieldValue>, Option<&PrimaryKey>, &Row, &Column) -> Validation + Send + Sync,
{
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(Option<&FieldValue>, Option<&PrimaryKey>, &Row, &Column) -> Validation + Send + Sync,
{
    fn validate(
        &self,
        value: Option<&FieldValue>,
        primary: Option<&PrimaryKey>,
        row: &Row,
        column: &Column,
    ) -> Validation {
        (self.check)(value, primary, row, column)
    }
}

/// Shorthand for `Arc::new(FnValidator::new(check))`
pub fn from_fn<F>(check: F) -> Arc<dyn Validator>
where
    F: Fn(Option<&FieldValue>, Option<&PrimaryKey>, &Row, &Column) -> Validation
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnValidator::new(check))
}
