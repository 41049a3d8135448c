//! Correlated subqueries against another table.
//!
//! An [`ExternalField`] selects one value of a remote table, an
//! [`ExternalListField`] aggregates all matching values into a delimited
//! string. Both filter the remote table by equality against local columns.
//! The local side is never interpolated: it is left as a `%s` placeholder
//! that the host engine fills with a reference to the outer row.
//!
//! The fragment is assembled lazily, at most once per column.

mod alias;

pub use alias::{simple_name, table_alias};

use crate::codec::{ColumnCodec, ListCodec, RawCodec, LIST_DELIMITER};
use crate::column::{Column, ColumnSource};
use crate::dialect::Dialect;
use crate::error::{FieldError, FieldResult};
use crate::expression::Expression;
use once_cell::sync::OnceCell;
use sea_query::{Expr, ExprTrait, Order, Query, SelectStatement};
use std::fmt;
use std::sync::Arc;

/// Stand-in for a local column reference while the statement is rendered
const LOCAL_MARKER: &str = "__FIELDGUARD_LOCAL__";

/// Name of the aggregated expression in list subqueries
pub const LIST_ALIAS: &str = "LIST";

/// Hook that adjusts the remote query before it is rendered
pub type Customizer = Arc<dyn Fn(&mut SelectStatement) + Send + Sync>;

/// What to select from which table, and how to correlate it
#[derive(Clone)]
pub struct SubquerySpec {
    table: String,
    target_field: String,
    filter: Vec<(String, String)>,
    order: Vec<(String, Order)>,
    customizer: Option<Customizer>,
    dialect: Dialect,
}

impl SubquerySpec {
    pub fn new(table: impl Into<String>, target_field: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            target_field: target_field.into(),
            filter: Vec::new(),
            order: Vec::new(),
            customizer: None,
            dialect: Dialect::default(),
        }
    }

    /// Require `remote = <local column of the outer row>`
    pub fn filter(mut self, local: impl Into<String>, remote: impl Into<String>) -> Self {
        self.filter.push((local.into(), remote.into()));
        self
    }

    /// Order by a remote column; terms apply in the order they are added
    pub fn order_by(mut self, remote: impl Into<String>, order: Order) -> Self {
        self.order.push((remote.into(), order));
        self
    }

    pub fn customize<F>(mut self, customizer: F) -> Self
    where
        F: Fn(&mut SelectStatement) + Send + Sync + 'static,
    {
        self.customizer = Some(Arc::new(customizer));
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn target_field(&self) -> &str {
        &self.target_field
    }

    /// `(local, remote)` pairs in declaration order
    pub fn filters(&self) -> &[(String, String)] {
        &self.filter
    }

    fn check(&self, column: &str) -> FieldResult<()> {
        if self.table.trim().is_empty() || self.target_field.trim().is_empty() {
            return Err(FieldError::construction(format!(
                "subquery column {column} needs a target table and field"
            )));
        }
        if self.filter.is_empty() {
            return Err(FieldError::construction(format!(
                "subquery column {column} needs at least one filter pair"
            )));
        }
        if self
            .filter
            .iter()
            .any(|(local, remote)| local.is_empty() || remote.is_empty())
        {
            return Err(FieldError::construction(format!(
                "subquery column {column} has an empty filter column"
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for SubquerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubquerySpec")
            .field("table", &self.table)
            .field("target_field", &self.target_field)
            .field("filter", &self.filter)
            .field("order", &self.order)
            .field("customized", &self.customizer.is_some())
            .field("dialect", &self.dialect)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubqueryKind {
    /// First matching value, `LIMIT 1`
    Scalar,
    /// All matching values, aggregated with the list delimiter
    List,
}

/// A subquery bound to the column that declares it
pub struct Subquery {
    column: String,
    kind: SubqueryKind,
    spec: SubquerySpec,
    alias: String,
    locals: Vec<String>,
    fragment: OnceCell<Expression>,
}

impl Subquery {
    pub fn new(column: impl Into<String>, kind: SubqueryKind, spec: SubquerySpec) -> FieldResult<Self> {
        let column = column.into();
        spec.check(&column)?;
        let alias = table_alias(&spec.table, &column, &spec.target_field);
        let locals = spec.filter.iter().map(|(local, _)| local.clone()).collect();
        Ok(Self {
            column,
            kind,
            spec,
            alias,
            locals,
            fragment: OnceCell::new(),
        })
    }

    pub fn kind(&self) -> SubqueryKind {
        self.kind
    }

    pub fn spec(&self) -> &SubquerySpec {
        &self.spec
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Local columns feeding the filter, in filter order
    pub fn build_from(&self) -> &[String] {
        &self.locals
    }

    pub fn is_materialized(&self) -> bool {
        self.fragment.get().is_some()
    }

    /// The parenthesized subquery, compiled on first call
    pub fn fragment(&self) -> FieldResult<&Expression> {
        self.fragment.get_or_try_init(|| self.compile())
    }

    /// The remote statement with local references as opaque markers
    pub fn statement(&self) -> SelectStatement {
        let alias = self.alias.clone();
        let mut select = Query::select();

        match self.kind {
            SubqueryKind::Scalar => {
                select.column((alias.clone(), self.spec.target_field.clone()));
            }
            SubqueryKind::List => {
                let dialect = self.spec.dialect;
                let value = format!(
                    "{}.{}",
                    dialect.quote(&alias),
                    dialect.quote(&self.spec.target_field)
                );
                let order: Vec<(String, Order)> = self
                    .spec
                    .order
                    .iter()
                    .map(|(col, dir)| {
                        (format!("{}.{}", dialect.quote(&alias), dialect.quote(col)), dir.clone())
                    })
                    .collect();
                select.expr_as(
                    Expr::cust(dialect.ordered_concat(&value, LIST_DELIMITER, &order)),
                    LIST_ALIAS,
                );
            }
        }

        match self.spec.table.split_once('.') {
            Some((schema, table)) => {
                select.from_as((schema.to_string(), table.to_string()), alias.clone());
            }
            None => {
                select.from_as(self.spec.table.clone(), alias.clone());
            }
        }

        for (_, remote) in &self.spec.filter {
            select.and_where(Expr::col((alias.clone(), remote.clone())).eq(Expr::cust(LOCAL_MARKER)));
        }

        if let Some(customize) = &self.spec.customizer {
            customize(&mut select);
        }

        if self.kind == SubqueryKind::Scalar {
            for (col, dir) in &self.spec.order {
                select.order_by((alias.clone(), col.clone()), dir.clone());
            }
            select.limit(1);
        }

        select
    }

    fn compile(&self) -> FieldResult<Expression> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("subquery_fragment", column = %self.column, alias = %self.alias)
            .entered();

        let sql = self.spec.dialect.render(&self.statement());
        let markers = sql.matches(LOCAL_MARKER).count();
        if markers != self.locals.len() {
            return Err(FieldError::construction(format!(
                "subquery column {} renders {markers} local references for {} filter pairs",
                self.column,
                self.locals.len()
            )));
        }
        let template = format!("({})", sql.replace('%', "%%").replace(LOCAL_MARKER, "%s"));
        log::debug!(
            "Materialized subquery for column {} as {}",
            self.column,
            template
        );
        Expression::new(template, self.locals.clone())
    }
}

impl fmt::Debug for Subquery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subquery")
            .field("column", &self.column)
            .field("kind", &self.kind)
            .field("alias", &self.alias)
            .field("spec", &self.spec)
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

fn subquery_column(
    name: impl Into<String>,
    codec: impl Into<ColumnCodec>,
    kind: SubqueryKind,
    spec: SubquerySpec,
) -> FieldResult<Column> {
    let name = name.into();
    let subquery = Subquery::new(name.clone(), kind, spec)?;
    Column::builder(name, codec)
        .nullable(true)
        .source(ColumnSource::Subquery(Arc::new(subquery)))
        .build()
}

/// Single value pulled from another table.
///
/// Picks the first row after ordering. Without an order that fully breaks
/// ties the chosen row is whatever the database returns first.
pub struct ExternalField;

impl ExternalField {
    pub fn from(name: impl Into<String>, spec: SubquerySpec) -> FieldResult<Column> {
        Self::typed(name, RawCodec, spec)
    }

    /// Lookup whose values are decoded by `codec`
    pub fn typed(
        name: impl Into<String>,
        codec: impl Into<ColumnCodec>,
        spec: SubquerySpec,
    ) -> FieldResult<Column> {
        subquery_column(name, codec, SubqueryKind::Scalar, spec)
    }
}

/// All matching values of another table, ordered inside the aggregate and
/// decoded as a list
pub struct ExternalListField;

impl ExternalListField {
    pub fn from(name: impl Into<String>, spec: SubquerySpec) -> FieldResult<Column> {
        subquery_column(name, ListCodec, SubqueryKind::List, spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn template(column: &Column) -> String {
        column.expression().unwrap().unwrap().template().to_string()
    }

    #[test]
    fn test_scalar_lookup() {
        let column = ExternalField::from(
            "last_total",
            SubquerySpec::new("orders", "total").filter("id", "customer_id"),
        )
        .unwrap();
        let sql = template(&column);
        assert_eq!(
            sql,
            r#"(SELECT "orders_last_total_total"."total" FROM "orders" AS "orders_last_total_total" WHERE "orders_last_total_total"."customer_id" = %s LIMIT 1)"#
        );
        assert_eq!(column.build_from(), ["id".to_string()]);
        assert_eq!(sql.matches("%s").count(), 1);
    }

    #[test]
    fn test_scalar_order_direction() {
        let column = ExternalField::from(
            "latest_rank",
            SubquerySpec::new("scores", "value")
                .filter("id", "player_id")
                .order_by("rank", Order::Desc),
        )
        .unwrap();
        let sql = template(&column);
        assert!(sql.contains(r#"ORDER BY "scores_latest_rank_value"."rank" DESC LIMIT 1"#), "{sql}");
    }

    #[test]
    fn test_multiple_filters_keep_order() {
        let column = ExternalField::from(
            "price",
            SubquerySpec::new("prices", "amount")
                .filter("product_id", "product")
                .filter("region", "region_code"),
        )
        .unwrap();
        assert_eq!(column.build_from(), ["product_id".to_string(), "region".to_string()]);
        let rendered = column
            .expression()
            .unwrap()
            .unwrap()
            .render(&["p.id", "p.region"])
            .unwrap();
        assert!(rendered.contains(r#""product" = p.id AND "prices_price_amount"."region_code" = p.region"#), "{rendered}");
    }

    #[test]
    fn test_list_aggregation_orders_inside() {
        let column = ExternalListField::from(
            "tags",
            SubquerySpec::new("post_tags", "tag")
                .filter("id", "post_id")
                .order_by("seq", Order::Asc),
        )
        .unwrap();
        let sql = template(&column);
        assert!(
            sql.contains(r#"STRING_AGG(CAST("post_tags_tags_tag"."tag" AS TEXT), ',' ORDER BY "post_tags_tags_tag"."seq" ASC) AS "LIST""#),
            "{sql}"
        );
        assert!(!sql.contains("LIMIT"));
        assert_eq!(column.raw_codec().type_name(), "list");
    }

    #[test]
    fn test_percent_in_customized_query_escaped() {
        let column = ExternalField::from(
            "promo",
            SubquerySpec::new("codes", "code")
                .filter("id", "owner_id")
                .customize(|q| {
                    q.and_where(Expr::col("code").like("SALE%"));
                }),
        )
        .unwrap();
        let expr = column.expression().unwrap().unwrap();
        assert!(expr.template().contains("SALE%%"));
        assert!(expr.render(&["o.id"]).unwrap().contains("'SALE%'"));
    }

    #[test]
    fn test_fragment_compiled_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let column = ExternalField::from(
            "n",
            SubquerySpec::new("t", "v")
                .filter("id", "ref_id")
                .customize(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .unwrap();
        assert!(!column.subquery().unwrap().is_materialized());
        let first = column.expression().unwrap().unwrap().clone();
        let second = column.expression().unwrap().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let copy = column.clone();
        copy.expression().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_materialization() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let column = Arc::new(
            ExternalField::from(
                "n",
                SubquerySpec::new("t", "v")
                    .filter("id", "ref_id")
                    .customize(move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
            )
            .unwrap(),
        );
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let column = Arc::clone(&column);
                std::thread::spawn(move || column.expression().unwrap().unwrap().template().to_string())
            })
            .collect();
        let templates: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(templates.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_filter_rejected() {
        assert!(matches!(
            ExternalField::from("x", SubquerySpec::new("t", "v")),
            Err(FieldError::Construction(_))
        ));
        assert!(ExternalField::from("x", SubquerySpec::new("", "v").filter("a", "b")).is_err());
    }

    #[test]
    fn test_schema_qualified_table() {
        let column = ExternalField::from(
            "owner",
            SubquerySpec::new("crm.Accounts", "name").filter("account_id", "id"),
        )
        .unwrap();
        let sql = template(&column);
        assert!(sql.contains(r#"FROM "crm"."Accounts" AS "accounts_owner_name""#), "{sql}");
    }

    #[test]
    fn test_mysql_dialect() {
        let column = ExternalListField::from(
            "tags",
            SubquerySpec::new("post_tags", "tag")
                .filter("id", "post_id")
                .order_by("seq", Order::Desc)
                .dialect(Dialect::MySql),
        )
        .unwrap();
        let sql = template(&column);
        assert!(
            sql.contains("GROUP_CONCAT(`post_tags_tags_tag`.`tag` ORDER BY `post_tags_tags_tag`.`seq` DESC SEPARATOR ',')"),
            "{sql}"
        );
    }
}
