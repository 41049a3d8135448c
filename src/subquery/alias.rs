//! Table aliases for correlated subqueries.

/// Last segment of a possibly schema-qualified table name
pub fn simple_name(table: &str) -> &str {
    table.rsplit('.').next().unwrap_or(table)
}

/// `<simple table name, lowercased>_<column>_<target field>`.
///
/// Built from the declaring column so that two subqueries into the same
/// table from one entity still differ. This is a naming convention only; a
/// hand-written alias in the enclosing query can still match it, which is
/// what [`QuerySession`](crate::session::QuerySession) watches for.
pub fn table_alias(table: &str, column: &str, target_field: &str) -> String {
    format!(
        "{}_{}_{}",
        simple_name(table).to_lowercase(),
        column,
        target_field
    )
}
