//! SQL dialect selection for rendered fragments.
//!
//! The dialect decides which `sea_query` backend renders a subquery, how
//! identifiers inside hand-built aggregate expressions are quoted, and which
//! ordered string aggregation function is emitted.

use sea_query::{
    MysqlQueryBuilder, Order, PostgresQueryBuilder, QueryStatementWriter, SelectStatement,
    SqliteQueryBuilder,
};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Quote an identifier, doubling any embedded quote character
    pub fn quote(self, ident: &str) -> String {
        let q = match self {
            Dialect::MySql => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        };
        let escaped = ident.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Quote a possibly dotted reference (`table.column`) part by part
    pub fn quote_path(self, path: &str) -> String {
        path.split('.')
            .map(|part| self.quote(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Render a select statement with values inlined
    pub fn render(self, statement: &SelectStatement) -> String {
        match self {
            Dialect::Postgres => statement.to_string(PostgresQueryBuilder),
            Dialect::MySql => statement.to_string(MysqlQueryBuilder),
            Dialect::Sqlite => statement.to_string(SqliteQueryBuilder),
        }
    }

    /// Ordered, delimited string aggregation of `value` (already quoted).
    ///
    /// `order` holds already quoted column references with their direction.
    pub fn ordered_concat(self, value: &str, delimiter: char, order: &[(String, Order)]) -> String {
        let order_clause = if order.is_empty() {
            String::new()
        } else {
            let terms = order
                .iter()
                .map(|(col, dir)| format!("{} {}", col, order_keyword(dir)))
                .collect::<Vec<_>>()
                .join(", ");
            format!(" ORDER BY {terms}")
        };
        let separator = literal_char(delimiter);

        match self {
            Dialect::Postgres => {
                format!("STRING_AGG(CAST({value} AS TEXT), {separator}{order_clause})")
            }
            Dialect::MySql => {
                format!("GROUP_CONCAT({value}{order_clause} SEPARATOR {separator})")
            }
            Dialect::Sqlite => {
                format!("GROUP_CONCAT(CAST({value} AS TEXT), {separator}{order_clause})")
            }
        }
    }
}

fn order_keyword(order: &Order) -> &'static str {
    match order {
        Order::Desc => "DESC",
        _ => "ASC",
    }
}

fn literal_char(c: char) -> String {
    if c == '\'' {
        "''''".to_string()
    } else {
        format!("'{c}'")
    }
}
