//! Query-building sessions.
//!
//! A [`QuerySession`] scopes the state that would otherwise be process-wide:
//! the allocator for anonymous expression names and the set of table
//! aliases already used by the query being built.

use crate::column::Column;
use crate::config::{AliasPolicy, FieldsConfig};
use crate::dialect::Dialect;
use crate::error::{FieldError, FieldResult};
use crate::expression::{ExpressionBuilder, ExpressionField, NameAllocator};
use crate::subquery::SubquerySpec;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
pub struct QuerySession {
    config: FieldsConfig,
    names: NameAllocator,
    aliases: Mutex<HashSet<String>>,
}

impl QuerySession {
    pub fn new(config: FieldsConfig) -> Self {
        let names = NameAllocator::new(config.anonymous_prefix.clone());
        Self {
            config,
            names,
            aliases: Mutex::new(HashSet::new()),
        }
    }

    /// Session configured from `config/fieldguard.toml` and the environment
    pub fn load() -> FieldResult<Self> {
        Ok(Self::new(FieldsConfig::load()?))
    }

    pub fn config(&self) -> &FieldsConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    pub fn names(&self) -> &NameAllocator {
        &self.names
    }

    /// Anonymous expression column named from this session's allocator
    pub fn expression<F>(&self, worker: F) -> FieldResult<Column>
    where
        F: FnOnce(&mut ExpressionBuilder) -> String,
    {
        ExpressionField::unnamed_in(&self.names, worker)
    }

    /// Subquery spec rendered with this session's dialect
    pub fn subquery(&self, table: impl Into<String>, target_field: impl Into<String>) -> SubquerySpec {
        SubquerySpec::new(table, target_field).dialect(self.dialect())
    }

    /// Record a table alias used by the query.
    ///
    /// Returns `Ok(false)` for a repeat under the best-effort policy (after
    /// logging a warning); the strict policy fails instead.
    pub fn register_alias(&self, alias: &str) -> FieldResult<bool> {
        let mut aliases = self.aliases.lock().unwrap_or_else(PoisonError::into_inner);
        if aliases.insert(alias.to_string()) {
            return Ok(true);
        }
        match self.config.alias_policy {
            AliasPolicy::BestEffort => {
                log::warn!(
                    "Table alias {} is used more than once in this query; later references may shadow earlier ones",
                    alias
                );
                Ok(false)
            }
            AliasPolicy::Strict => Err(FieldError::AliasCollision {
                alias: alias.to_string(),
            }),
        }
    }

    /// Register the table alias of a subquery column; other columns are ignored
    pub fn track(&self, column: &Column) -> FieldResult<()> {
        if let Some(subquery) = column.subquery() {
            self.register_alias(subquery.alias())?;
        }
        Ok(())
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(alias)
    }
}

impl Default for QuerySession {
    fn default() -> Self {
        Self::new(FieldsConfig::default())
    }
}
