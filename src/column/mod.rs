//! Immutable column declarations.
//!
//! A [`Column`] is built once when an entity is declared and shared by every
//! row operation afterwards. It bundles the codec, the nullability and
//! required-ness flags, attached validators and, for computed columns, the
//! source the host query engine selects instead of a stored value.

mod descriptor;

pub use descriptor::ColumnDescriptor;

use crate::codec::{ColumnCodec, Nullable, ValueCodec};
use crate::error::{FieldError, FieldResult};
use crate::expression::Expression;
use crate::subquery::Subquery;
use crate::validator::{FieldIssue, IssueKind, NullableValidator, PrimaryKey, Row, Validator};
use crate::value::{FieldValue, Input, StorageValue};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Where a column's value comes from
#[derive(Debug, Clone)]
pub enum ColumnSource {
    /// A physical column of the entity's table
    Stored,
    Expression(Expression),
    /// Correlated subquery against another table, compiled on first use
    Subquery(Arc<Subquery>),
}

/// Value used for a column when a new row does not provide one
#[derive(Debug, Clone)]
pub enum DefaultValue {
    Fixed(FieldValue),
    /// Produced fresh for every row
    Generated(fn() -> FieldValue),
}

impl DefaultValue {
    pub fn produce(&self) -> FieldValue {
        match self {
            DefaultValue::Fixed(v) => v.clone(),
            DefaultValue::Generated(f) => f(),
        }
    }
}

impl PartialEq for DefaultValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DefaultValue::Fixed(a), DefaultValue::Fixed(b)) => a == b,
            (DefaultValue::Generated(a), DefaultValue::Generated(b)) => *a as usize == *b as usize,
            _ => false,
        }
    }
}

/// Caller-supplied settings for the `on(name, options)` factories.
///
/// Leaving `nullable` and `required` unset lets each factory apply its own
/// default; setting `required` alone implies not nullable and vice versa.
#[derive(Debug, Clone, Default)]
pub struct ColumnOptions {
    nullable: Option<bool>,
    required: Option<bool>,
    unique: bool,
    size: Option<u32>,
    default_value: Option<FieldValue>,
    parameters: BTreeMap<String, serde_json::Value>,
}

impl ColumnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn parameters(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.parameters
    }

    /// Resolve `(nullable, required)` against a factory default
    fn flags(&self, default_nullable: bool) -> (bool, bool) {
        let required = self.required.unwrap_or(false);
        let nullable = self.nullable.unwrap_or(default_nullable && !required);
        (nullable, required)
    }
}

/// An immutable column declaration
#[derive(Clone)]
pub struct Column {
    name: String,
    codec: ColumnCodec,
    nullable: bool,
    required: bool,
    unique: bool,
    primary: bool,
    auto_generated: bool,
    size: Option<u32>,
    default_value: Option<DefaultValue>,
    parameters: BTreeMap<String, serde_json::Value>,
    validators: Vec<Arc<dyn Validator>>,
    source: ColumnSource,
}

impl Column {
    pub fn builder(name: impl Into<String>, codec: impl Into<ColumnCodec>) -> ColumnBuilder {
        ColumnBuilder {
            name: name.into(),
            codec: codec.into(),
            nullable: false,
            required: false,
            unique: false,
            primary: false,
            auto_generated: false,
            size: None,
            default_value: None,
            parameters: BTreeMap::new(),
            validators: Vec::new(),
            source: ColumnSource::Stored,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_auto_generated(&self) -> bool {
        self.auto_generated
    }

    pub fn size(&self) -> Option<u32> {
        self.size
    }

    pub fn parameters(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.parameters
    }

    pub fn parameter(&self, key: &str) -> Option<&serde_json::Value> {
        self.parameters.get(key)
    }

    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    pub fn source(&self) -> &ColumnSource {
        &self.source
    }

    /// The column's codec behind its nullability wrapper
    pub fn codec(&self) -> Nullable<&ColumnCodec> {
        Nullable::wrap_if(self.nullable, &self.codec)
    }

    /// The bare codec, without nullability handling
    pub fn raw_codec(&self) -> &ColumnCodec {
        &self.codec
    }

    pub fn decode(&self, raw: &StorageValue) -> FieldResult<Option<FieldValue>> {
        self.codec().decode(&self.name, raw)
    }

    pub fn encode(&self, value: Option<&FieldValue>) -> FieldResult<StorageValue> {
        self.codec().encode(&self.name, value)
    }

    pub fn cast(&self, input: impl Into<Input>) -> FieldResult<Option<FieldValue>> {
        self.codec().cast(&self.name, input.into())
    }

    pub fn is_empty(&self, input: &Input) -> bool {
        self.codec().is_empty(input)
    }

    /// Copy of this column with one more validator, wrapped for nullability
    pub fn add_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validators
            .push(NullableValidator::wrap_if(self.nullable, validator));
        self
    }

    /// Run the required-ness check and then every validator in order.
    ///
    /// A missing value on a required column yields a single
    /// `RequiredValueMissing` issue and skips the validators. Otherwise all
    /// issues are collected.
    pub fn validate(
        &self,
        value: Option<&FieldValue>,
        primary: Option<&PrimaryKey>,
        row: &Row,
    ) -> Vec<FieldIssue> {
        let value = value.filter(|v| !(self.nullable && self.is_absent_text(v)));
        let missing = match value {
            None => true,
            Some(FieldValue::Text(s)) => s.is_empty(),
            Some(_) => false,
        };
        if self.required && missing {
            return vec![FieldIssue::new(
                &self.name,
                "Value is required.",
                IssueKind::RequiredValueMissing,
            )];
        }
        self.validators
            .iter()
            .filter_map(|v| v.validate(value, primary, row, self).into_issue(self))
            .collect()
    }

    fn is_absent_text(&self, value: &FieldValue) -> bool {
        matches!(value, FieldValue::Text(s) if s.is_empty()) && self.codec.absent_on_empty_string()
    }

    pub fn default_value(&self) -> Option<FieldValue> {
        self.default_value.as_ref().map(DefaultValue::produce)
    }

    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }

    pub fn is_computed(&self) -> bool {
        !matches!(self.source, ColumnSource::Stored)
    }

    /// The SQL expression behind a computed column.
    ///
    /// Subquery columns compile their fragment here on first call.
    pub fn expression(&self) -> FieldResult<Option<&Expression>> {
        match &self.source {
            ColumnSource::Stored => Ok(None),
            ColumnSource::Expression(expr) => Ok(Some(expr)),
            ColumnSource::Subquery(sub) => sub.fragment().map(Some),
        }
    }

    /// Columns of the same entity this column is computed from
    pub fn build_from(&self) -> &[String] {
        match &self.source {
            ColumnSource::Stored => &[],
            ColumnSource::Expression(expr) => expr.build_from(),
            ColumnSource::Subquery(sub) => sub.build_from(),
        }
    }

    pub fn subquery(&self) -> Option<&Subquery> {
        match &self.source {
            ColumnSource::Subquery(sub) => Some(sub),
            _ => None,
        }
    }

    /// The host engine's view of this column
    pub fn descriptor(&self) -> FieldResult<ColumnDescriptor> {
        let expression = self.expression()?;
        Ok(ColumnDescriptor {
            name: self.name.clone(),
            column_type: self.codec.type_name().to_string(),
            data_kind: self.codec.data_kind(),
            nullable: self.nullable,
            required: self.required,
            unique: self.unique,
            primary: self.primary,
            auto_generated: self.auto_generated,
            size: self.size,
            expression: expression.map(|e| e.template().to_string()),
            build_from: expression.map_or_else(Vec::new, |e| e.build_from().to_vec()),
            parameters: self.parameters.clone(),
            default_value: self.default_value.clone(),
        })
    }

    /// Rebuild a column from the host engine's view.
    ///
    /// Codec and default validators come from `column_type`; enum and object
    /// columns need caller-supplied hooks and cannot be rebuilt this way.
    pub fn from_descriptor(descriptor: &ColumnDescriptor) -> FieldResult<Column> {
        let codec = descriptor.codec()?;
        let source = match &descriptor.expression {
            Some(template) => ColumnSource::Expression(Expression::new(
                template.clone(),
                descriptor.build_from.clone(),
            )?),
            None => ColumnSource::Stored,
        };
        let mut builder = Column::builder(descriptor.name.clone(), codec.clone())
            .nullable(descriptor.nullable)
            .required(descriptor.required)
            .unique(descriptor.unique)
            .primary(descriptor.primary)
            .auto_generated(descriptor.auto_generated)
            .source(source);
        if let Some(size) = descriptor.size {
            builder = builder.size(size);
        }
        if let Some(default) = &descriptor.default_value {
            builder = builder.default_value(default.clone());
        }
        for (key, value) in &descriptor.parameters {
            builder = builder.parameter(key.clone(), value.clone());
        }
        for validator in crate::fields::default_validators(&codec)? {
            builder = builder.validator(validator);
        }
        builder.build()
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("codec", &self.codec.type_name())
            .field("nullable", &self.nullable)
            .field("required", &self.required)
            .field("unique", &self.unique)
            .field("primary", &self.primary)
            .field("validators", &self.validators.len())
            .field("source", &self.source)
            .finish()
    }
}

/// Builder for [`Column`]; `build` checks the declaration
pub struct ColumnBuilder {
    name: String,
    codec: ColumnCodec,
    nullable: bool,
    required: bool,
    unique: bool,
    primary: bool,
    auto_generated: bool,
    size: Option<u32>,
    default_value: Option<DefaultValue>,
    parameters: BTreeMap<String, serde_json::Value>,
    validators: Vec<Arc<dyn Validator>>,
    source: ColumnSource,
}

impl ColumnBuilder {
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub fn auto_generated(mut self, auto_generated: bool) -> Self {
        self.auto_generated = auto_generated;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn default_value(mut self, default: DefaultValue) -> Self {
        self.default_value = Some(default);
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn source(mut self, source: ColumnSource) -> Self {
        self.source = source;
        self
    }

    /// Apply factory options; `default_nullable` is used when the options
    /// leave both flags unset
    pub fn options(mut self, options: ColumnOptions, default_nullable: bool) -> Self {
        let (nullable, required) = options.flags(default_nullable);
        self.nullable = nullable;
        self.required = required;
        self.unique |= options.unique;
        if let Some(size) = options.size {
            self.size = Some(size);
        }
        if let Some(value) = options.default_value {
            self.default_value = Some(DefaultValue::Fixed(value));
        }
        self.parameters.extend(options.parameters);
        self
    }

    pub fn build(self) -> FieldResult<Column> {
        if self.name.trim().is_empty() {
            return Err(FieldError::construction("column name must not be empty"));
        }
        if self.required && self.nullable {
            return Err(FieldError::construction(format!(
                "column {} cannot be both required and nullable",
                self.name
            )));
        }
        if self.parameters.keys().any(|k| k.is_empty()) {
            return Err(FieldError::construction(format!(
                "column {} has a parameter with an empty key",
                self.name
            )));
        }
        let nullable = self.nullable;
        Ok(Column {
            name: self.name,
            codec: self.codec,
            nullable,
            required: self.required,
            unique: self.unique,
            primary: self.primary,
            auto_generated: self.auto_generated,
            size: self.size,
            default_value: self.default_value,
            parameters: self.parameters,
            validators: self
                .validators
                .into_iter()
                .map(|v| NullableValidator::wrap_if(nullable, v))
                .collect(),
            source: self.source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{IntegerCodec, NonEmptyStringCodec, TextCodec};
    use crate::validator::{from_fn, Validation};

    fn reject_all() -> Arc<dyn Validator> {
        from_fn(|_, _, _, _| Validation::Invalid("rejected".into()))
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(
            Column::builder("  ", TextCodec).build(),
            Err(FieldError::Construction(_))
        ));
    }

    #[test]
    fn test_required_and_nullable_conflict() {
        let result = Column::builder("c", TextCodec)
            .options(ColumnOptions::new().required(true).nullable(true), false)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_option_flags() {
        let required = Column::builder("c", TextCodec)
            .options(ColumnOptions::new().required(true), true)
            .build()
            .unwrap();
        assert!(required.is_required());
        assert!(!required.is_nullable());

        let defaulted = Column::builder("c", TextCodec)
            .options(ColumnOptions::new(), true)
            .build()
            .unwrap();
        assert!(defaulted.is_nullable());
        assert!(!defaulted.is_required());
    }

    #[test]
    fn test_non_nullable_decode_of_null_fails() {
        let column = Column::builder("n", IntegerCodec::default()).build().unwrap();
        assert!(column.decode(&StorageValue::Null).unwrap_err().is_type_mismatch());

        let nullable = Column::builder("n", IntegerCodec::default())
            .nullable(true)
            .build()
            .unwrap();
        assert_eq!(nullable.decode(&StorageValue::Null).unwrap(), None);
        assert_eq!(nullable.encode(None).unwrap(), StorageValue::Null);
    }

    #[test]
    fn test_required_missing_short_circuits() {
        let column = Column::builder("title", TextCodec)
            .required(true)
            .validator(reject_all())
            .build()
            .unwrap();
        let issues = column.validate(None, None, &Row::new());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::RequiredValueMissing);

        let empty = FieldValue::Text(String::new());
        assert_eq!(column.validate(Some(&empty), None, &Row::new()).len(), 1);
    }

    #[test]
    fn test_all_issues_collected() {
        let column = Column::builder("title", TextCodec)
            .validator(reject_all())
            .build()
            .unwrap()
            .add_validator(reject_all());
        let value = FieldValue::Text("x".into());
        assert_eq!(column.validate(Some(&value), None, &Row::new()).len(), 2);
    }

    #[test]
    fn test_nullable_column_skips_validators_for_sentinels() {
        let column = Column::builder("nick", NonEmptyStringCodec)
            .nullable(true)
            .validator(reject_all())
            .build()
            .unwrap();
        assert!(column.validate(None, None, &Row::new()).is_empty());
        let empty = FieldValue::Text(String::new());
        assert!(column.validate(Some(&empty), None, &Row::new()).is_empty());
        assert!(column.validators()[0].is_nullable_wrapper());
    }

    #[test]
    fn test_add_validator_wraps_once() {
        let column = Column::builder("nick", TextCodec)
            .nullable(true)
            .build()
            .unwrap();
        let wrapped = NullableValidator::wrap_if(true, reject_all());
        let column = column.add_validator(wrapped.clone());
        assert!(Arc::ptr_eq(&column.validators()[0], &wrapped));
    }

    #[test]
    fn test_defaults() {
        let fixed = Column::builder("status", TextCodec)
            .options(ColumnOptions::new().default_value("draft".to_string()), false)
            .build()
            .unwrap();
        assert_eq!(fixed.default_value(), Some(FieldValue::Text("draft".into())));

        let generated = Column::builder("seq", IntegerCodec::default())
            .default_value(DefaultValue::Generated(|| FieldValue::Integer(7)))
            .build()
            .unwrap();
        assert_eq!(generated.default_value(), Some(FieldValue::Integer(7)));
    }

    #[test]
    fn test_empty_parameter_key_rejected() {
        assert!(Column::builder("c", TextCodec)
            .parameter("", 1)
            .build()
            .is_err());
    }
}
