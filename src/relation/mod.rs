//! Columns that reach into related tables.
//!
//! [`ReferenceField`] declares a join; [`LookupField`] and [`MimicField`]
//! select a value through one, either typed like the referenced column or
//! passed through untouched.

use crate::codec::RawCodec;
use crate::column::{Column, ColumnOptions, ColumnSource, DefaultValue};
use crate::error::{FieldError, FieldResult};
use crate::expression::{Expression, ExpressionField};
use crate::schema::TableSchema;
use sea_query::{Condition, Expr, ExprTrait, JoinType, SelectStatement};

/// A single-column reference (`reference.field`) typed like the referenced column
pub struct LookupField;

impl LookupField {
    /// Mirror `referenced`, which is reached through `path` (e.g. `author.name`)
    pub fn for_ref(
        name: impl Into<String>,
        path: impl Into<String>,
        referenced: &Column,
    ) -> FieldResult<Column> {
        Self::mirror(name.into(), path.into(), referenced, ColumnOptions::new())
    }

    /// Look the referenced column up in `target` by the last segment of `path`.
    ///
    /// The referenced column's parameters are inherited; parameters set in
    /// `options` take precedence.
    pub fn configured(
        name: impl Into<String>,
        path: impl Into<String>,
        target: &TableSchema,
        options: ColumnOptions,
    ) -> FieldResult<Column> {
        let name = name.into();
        let path = path.into();
        let field = path.rsplit('.').next().unwrap_or(&path);
        let referenced = target.column(field).ok_or_else(|| {
            FieldError::construction(format!(
                "lookup column {name}: table {} has no column {field}",
                target.table()
            ))
        })?;
        Self::mirror(name, path, referenced, options)
    }

    fn mirror(
        name: String,
        path: String,
        referenced: &Column,
        options: ColumnOptions,
    ) -> FieldResult<Column> {
        let mut builder = Column::builder(name, referenced.raw_codec().clone())
            .nullable(referenced.is_nullable())
            .source(ColumnSource::Expression(Expression::new("%s", vec![path])?));
        if let Some(size) = referenced.size() {
            builder = builder.size(size);
        }
        if let Some(default) = referenced.default_value() {
            builder = builder.default_value(DefaultValue::Fixed(default));
        }
        for (key, value) in referenced.parameters() {
            if !options.parameters().contains_key(key) {
                builder = builder.parameter(key.clone(), value.clone());
            }
        }
        for (key, value) in options.parameters() {
            builder = builder.parameter(key.clone(), value.clone());
        }
        builder.build()
    }
}

/// Another column's raw value under a new name, with no type translation
pub struct MimicField;

impl MimicField {
    pub fn of(name: impl Into<String>, source: impl Into<String>) -> FieldResult<Column> {
        let expression = Expression::new("%s", vec![source.into()])?;
        ExpressionField::with_codec(name, RawCodec, expression)
    }
}

/// A join from this table to `target`, made under the reference's name as alias
#[derive(Debug, Clone)]
pub struct ReferenceField {
    name: String,
    target: String,
    this_field: String,
    ref_field: String,
    join_type: JoinType,
    extra: Option<Condition>,
}

impl ReferenceField {
    /// `this.this_field = <name>.ref_field`, as a left join
    pub fn on(
        name: impl Into<String>,
        target: impl Into<String>,
        this_field: impl Into<String>,
        ref_field: impl Into<String>,
    ) -> FieldResult<Self> {
        let reference = Self {
            name: name.into(),
            target: target.into(),
            this_field: this_field.into(),
            ref_field: ref_field.into(),
            join_type: JoinType::LeftJoin,
            extra: None,
        };
        let parts = [
            &reference.name,
            &reference.target,
            &reference.this_field,
            &reference.ref_field,
        ];
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(FieldError::construction(format!(
                "reference {:?} needs a name, target table and both join columns",
                reference.name
            )));
        }
        Ok(reference)
    }

    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self
    }

    /// Additional condition ANDed onto the join
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.extra = Some(condition);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn kind(&self) -> JoinType {
        self.join_type
    }

    /// The join condition with this table known as `this_alias`
    pub fn condition(&self, this_alias: &str) -> Condition {
        let mut condition = Condition::all().add(
            Expr::col((this_alias.to_string(), self.this_field.clone()))
                .eq(Expr::col((self.name.clone(), self.ref_field.clone()))),
        );
        if let Some(extra) = &self.extra {
            condition = condition.add(extra.clone());
        }
        condition
    }

    pub fn join(&self, select: &mut SelectStatement, this_alias: &str) {
        select.join_as(
            self.join_type,
            self.target.clone(),
            self.name.clone(),
            self.condition(this_alias),
        );
    }
}
