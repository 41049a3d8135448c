//! Per-entity column sets.
//!
//! A [`TableSchema`] owns the columns of one table plus the references
//! (joins) that lookup columns go through. It checks that computed columns
//! only build from columns that exist and turns any column into an SQL
//! fragment qualified with a table alias.

use crate::column::{Column, ColumnSource};
use crate::dialect::Dialect;
use crate::error::{FieldError, FieldResult};
use crate::relation::ReferenceField;
use crate::session::QuerySession;
use sea_query::{Expr, Query, SelectStatement};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct TableSchema {
    table: String,
    dialect: Dialect,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    references: Vec<ReferenceField>,
}

impl TableSchema {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            dialect: Dialect::default(),
            columns: Vec::new(),
            index: HashMap::new(),
            references: Vec::new(),
        }
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with(mut self, column: Column) -> FieldResult<Self> {
        self.add(column)?;
        Ok(self)
    }

    pub fn with_reference(mut self, reference: ReferenceField) -> FieldResult<Self> {
        if self.reference(reference.name()).is_some() || self.index.contains_key(reference.name()) {
            return Err(FieldError::construction(format!(
                "table {} already declares {}",
                self.table,
                reference.name()
            )));
        }
        self.references.push(reference);
        Ok(self)
    }

    /// Add a column; names are unique across columns and references
    pub fn add(&mut self, column: Column) -> FieldResult<()> {
        if self.index.contains_key(column.name()) || self.reference(column.name()).is_some() {
            return Err(FieldError::construction(format!(
                "table {} already declares {}",
                self.table,
                column.name()
            )));
        }
        self.index.insert(column.name().to_string(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn reference(&self, name: &str) -> Option<&ReferenceField> {
        self.references.iter().find(|r| r.name() == name)
    }

    pub fn references(&self) -> &[ReferenceField] {
        &self.references
    }

    /// Check that every build-from entry names a column of this table or a
    /// `reference.field` path through a declared reference.
    pub fn validate(&self) -> FieldResult<()> {
        let mut missing = Vec::new();
        for column in &self.columns {
            for dependency in column.build_from() {
                if !self.resolves(dependency) {
                    missing.push(format!("{} -> {}", column.name(), dependency));
                }
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FieldError::construction(format!(
                "table {} has computed columns built from unknown columns: {}",
                self.table,
                missing.join(", ")
            )))
        }
    }

    fn resolves(&self, dependency: &str) -> bool {
        match dependency.split_once('.') {
            Some((reference, _)) => self.reference(reference).is_some(),
            None => self.index.contains_key(dependency),
        }
    }

    /// SQL for column `name` with this table aliased as `table_alias`.
    ///
    /// Stored columns become `"alias"."name"`. Computed columns are inlined,
    /// recursively for computed dependencies, which are parenthesized.
    /// A dependency cycle is a construction error.
    pub fn fragment(&self, name: &str, table_alias: &str) -> FieldResult<String> {
        let mut stack = Vec::new();
        self.resolve(name, table_alias, &mut stack)
    }

    fn resolve(&self, name: &str, table_alias: &str, stack: &mut Vec<String>) -> FieldResult<String> {
        if let Some((reference, field)) = name.split_once('.') {
            if self.reference(reference).is_none() {
                return Err(FieldError::construction(format!(
                    "table {} has no reference {reference}",
                    self.table
                )));
            }
            return Ok(format!(
                "{}.{}",
                self.dialect.quote(reference),
                self.dialect.quote(field)
            ));
        }

        let column = self.column(name).ok_or_else(|| {
            FieldError::construction(format!("table {} has no column {name}", self.table))
        })?;
        let Some(expression) = column.expression()? else {
            return Ok(format!(
                "{}.{}",
                self.dialect.quote(table_alias),
                self.dialect.quote(name)
            ));
        };

        if stack.iter().any(|seen| seen == name) {
            stack.push(name.to_string());
            return Err(FieldError::construction(format!(
                "computed columns of table {} form a cycle: {}",
                self.table,
                stack.join(" -> ")
            )));
        }
        stack.push(name.to_string());
        let sql = expression.render_with(|dependency| {
            let inner = self.resolve(dependency, table_alias, stack)?;
            let nested = self
                .column(dependency)
                .is_some_and(|c| matches!(c.source(), ColumnSource::Expression(_)));
            Ok(if nested { format!("({inner})") } else { inner })
        })?;
        stack.pop();
        Ok(sql)
    }

    /// A select of every column, computed ones inlined, with all references
    /// joined. Subquery and join aliases are registered with `session`.
    pub fn select(&self, table_alias: &str, session: &QuerySession) -> FieldResult<SelectStatement> {
        session.register_alias(table_alias)?;
        let mut select = Query::select();
        select.from_as(self.table.clone(), table_alias.to_string());

        for reference in &self.references {
            session.register_alias(reference.name())?;
            reference.join(&mut select, table_alias);
        }
        for column in &self.columns {
            session.track(column)?;
            if column.is_computed() {
                let sql = self.fragment(column.name(), table_alias)?;
                select.expr_as(Expr::cust(sql), column.name().to_string());
            } else {
                select.column((table_alias.to_string(), column.name().to_string()));
            }
        }
        Ok(select)
    }
}
