//! Computed columns backed by SQL expression templates.
//!
//! A worker closure receives an [`ExpressionBuilder`] and returns a format
//! string. Each call to [`ExpressionBuilder::field`] records a column
//! reference and leaves a placeholder that survives compilation; each call to
//! [`ExpressionBuilder::value`] exports a literal that is substituted straight
//! away. The result is an [`Expression`]: a template whose remaining `%s`
//! placeholders line up one-to-one with its build-from list.
//!
//! ```
//! use fieldguard::expression::{Expression, ExpressionBuilder};
//!
//! let expr = Expression::compile(|e: &mut ExpressionBuilder| {
//!     format!("{} + {}", e.field("price"), e.value(5))
//! })
//! .unwrap();
//! assert_eq!(expr.template(), "%s + 5");
//! assert_eq!(expr.build_from(), ["price".to_string()]);
//! assert_eq!(expr.render(&["\"o\".\"price\""]).unwrap(), "\"o\".\"price\" + 5");
//! ```

mod literal;
mod names;

pub use literal::Literal;
pub use names::{process_names, NameAllocator, DEFAULT_PREFIX};

use crate::codec::{BooleanCodec, ColumnCodec, RawCodec};
use crate::column::{Column, ColumnSource};
use crate::dialect::Dialect;
use crate::error::{FieldError, FieldResult};

/// Left by `field()`; contains no `%`, so escaped raw SQL can never forge it
const FIELD_MARK: &str = "\u{1}field\u{1}";
const VALUE_MARK: &str = "%s";

/// A compiled SQL template plus the columns its placeholders stand for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    template: String,
    build_from: Vec<String>,
}

impl Expression {
    /// Wrap an already compiled template.
    ///
    /// `%s` marks a column reference and `%%` a literal percent sign. The
    /// number of placeholders must equal `build_from.len()`.
    pub fn new(template: impl Into<String>, build_from: Vec<String>) -> FieldResult<Self> {
        let template = template.into();
        let mut placeholders = 0;
        scan(&template, |_, _| {
            placeholders += 1;
            Ok(())
        })?;
        if placeholders != build_from.len() {
            return Err(FieldError::construction(format!(
                "expression {template:?} has {placeholders} placeholders but {} build-from columns",
                build_from.len()
            )));
        }
        Ok(Self {
            template,
            build_from,
        })
    }

    /// Compile with the default dialect's literal rules
    pub fn compile<F>(worker: F) -> FieldResult<Self>
    where
        F: FnOnce(&mut ExpressionBuilder) -> String,
    {
        Self::compile_for(Dialect::default(), worker)
    }

    pub fn compile_for<F>(dialect: Dialect, worker: F) -> FieldResult<Self>
    where
        F: FnOnce(&mut ExpressionBuilder) -> String,
    {
        let mut builder = ExpressionBuilder::new(dialect);
        let format = worker(&mut builder);
        if let Some(err) = builder.error {
            return Err(err);
        }
        let template = bind_literals(&format, &builder.values)?;
        Self::new(template, builder.fields)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Referenced columns in placeholder order, duplicates kept
    pub fn build_from(&self) -> &[String] {
        &self.build_from
    }

    /// Substitute already-rendered column references, in build-from order
    pub fn render<S: AsRef<str>>(&self, references: &[S]) -> FieldResult<String> {
        if references.len() != self.build_from.len() {
            return Err(FieldError::construction(format!(
                "expression expects {} column references, got {}",
                self.build_from.len(),
                references.len()
            )));
        }
        scan(&self.template, |i, out| {
            out.push_str(references[i].as_ref());
            Ok(())
        })
    }

    /// Substitute each build-from column with whatever `resolve` returns for it
    pub fn render_with<F>(&self, mut resolve: F) -> FieldResult<String>
    where
        F: FnMut(&str) -> FieldResult<String>,
    {
        scan(&self.template, |i, out| {
            out.push_str(&resolve(&self.build_from[i])?);
            Ok(())
        })
    }
}

/// Placeholder generator handed to expression workers
#[derive(Debug)]
pub struct ExpressionBuilder {
    dialect: Dialect,
    fields: Vec<String>,
    values: Vec<String>,
    error: Option<FieldError>,
}

impl ExpressionBuilder {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            fields: Vec::new(),
            values: Vec::new(),
            error: None,
        }
    }

    /// Reference another column of the same entity
    pub fn field(&mut self, name: impl Into<String>) -> &'static str {
        self.fields.push(name.into());
        FIELD_MARK
    }

    /// Bind a literal; it is exported and substituted at compile time
    pub fn value(&mut self, literal: impl Into<Literal>) -> &'static str {
        match literal.into().export(self.dialect) {
            Ok(sql) => self.values.push(sql),
            Err(err) => {
                self.error.get_or_insert(err);
                self.values.push("NULL".to_string());
            }
        }
        VALUE_MARK
    }

    /// Insert SQL verbatim. Percent signs are escaped so the fragment never
    /// introduces placeholders of its own.
    pub fn raw(&self, fragment: &str) -> String {
        fragment.replace('%', "%%")
    }
}

/// Walk a compiled template, calling `on_placeholder` for each `%s`
fn scan<F>(template: &str, mut on_placeholder: F) -> FieldResult<String>
where
    F: FnMut(usize, &mut String) -> FieldResult<()>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut index = 0;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("%s") {
            on_placeholder(index, &mut out)?;
            index += 1;
            rest = &tail[2..];
        } else if tail.starts_with("%%") {
            out.push('%');
            rest = &tail[2..];
        } else {
            return Err(dangling_percent(template));
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// First pass over worker output: literals go in, field marks become `%s`
fn bind_literals(format: &str, values: &[String]) -> FieldResult<String> {
    let mut out = String::with_capacity(format.len());
    let mut values = values.iter();
    let mut rest = format;
    while let Some(pos) = rest.find(|c: char| c == '%' || c == '\u{1}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with(FIELD_MARK) {
            out.push_str("%s");
            rest = &tail[FIELD_MARK.len()..];
        } else if tail.starts_with('\u{1}') {
            out.push('\u{1}');
            rest = &tail[1..];
        } else if tail.starts_with("%%") {
            out.push_str("%%");
            rest = &tail[2..];
        } else if tail.starts_with(VALUE_MARK) {
            let literal = values.next().ok_or_else(|| {
                FieldError::construction(format!("expression {format:?} uses an unbound value"))
            })?;
            out.push_str(&literal.replace('%', "%%"));
            rest = &tail[2..];
        } else {
            return Err(dangling_percent(format));
        }
    }
    out.push_str(rest);
    if values.next().is_some() {
        return Err(FieldError::construction(format!(
            "expression {format:?} leaves bound values unused"
        )));
    }
    Ok(out)
}

fn dangling_percent(template: &str) -> FieldError {
    FieldError::construction(format!(
        "expression {template:?} contains a '%' that is neither a placeholder nor escaped"
    ))
}

/// Factories for expression-backed columns
pub struct ExpressionField;

impl ExpressionField {
    pub fn compile<F>(name: impl Into<String>, worker: F) -> FieldResult<Column>
    where
        F: FnOnce(&mut ExpressionBuilder) -> String,
    {
        Self::with_codec(name, RawCodec, Expression::compile(worker)?)
    }

    /// Expression column with a specific codec for its computed values
    pub fn with_codec(
        name: impl Into<String>,
        codec: impl Into<ColumnCodec>,
        expression: Expression,
    ) -> FieldResult<Column> {
        Column::builder(name, codec)
            .nullable(true)
            .source(ColumnSource::Expression(expression))
            .build()
    }

    /// Anonymous expression named from the process-wide allocator
    pub fn unnamed<F>(worker: F) -> FieldResult<Column>
    where
        F: FnOnce(&mut ExpressionBuilder) -> String,
    {
        Self::unnamed_in(process_names(), worker)
    }

    pub fn unnamed_in<F>(names: &NameAllocator, worker: F) -> FieldResult<Column>
    where
        F: FnOnce(&mut ExpressionBuilder) -> String,
    {
        let expression = Expression::compile(worker)?;
        Self::with_codec(names.next_name(), RawCodec, expression)
    }
}

/// `<source> IS NOT NULL` as a boolean column
pub struct CastField;

impl CastField {
    pub fn bool_from_nullable(
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> FieldResult<Column> {
        let source = source.into();
        let expression = Expression::new("%s IS NOT NULL", vec![source])?;
        ExpressionField::with_codec(name, BooleanCodec, expression)
    }
}

/// A constant selected under a column name
pub struct StaticValueField;

impl StaticValueField {
    pub fn on(name: impl Into<String>, literal: impl Into<Literal>) -> FieldResult<Column> {
        let literal = literal.into();
        let sql = literal.export(Dialect::default())?;
        let expression = Expression::new(sql.replace('%', "%%"), Vec::new())?;
        if literal.is_bool() {
            ExpressionField::with_codec(name, BooleanCodec, expression)
        } else {
            ExpressionField::with_codec(name, RawCodec, expression)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ValueCodec;
    use crate::value::StorageValue;

    #[test]
    fn test_column_and_literal() {
        let expr = Expression::compile(|e| format!("{} + {}", e.field("qty"), e.value(5))).unwrap();
        assert_eq!(expr.template(), "%s + 5");
        assert_eq!(expr.build_from(), ["qty".to_string()]);
    }

    #[test]
    fn test_duplicate_references_kept() {
        let expr = Expression::compile(|e| {
            format!("{} * {} - {}", e.field("a"), e.field("a"), e.field("b"))
        })
        .unwrap();
        assert_eq!(expr.build_from(), ["a", "a", "b"].map(String::from));
        assert_eq!(expr.render(&["x", "x", "y"]).unwrap(), "x * x - y");
    }

    #[test]
    fn test_percent_in_literal_survives() {
        let expr = Expression::compile(|e| format!("{} LIKE {}", e.field("title"), e.value("50%")))
            .unwrap();
        assert_eq!(expr.template(), "%s LIKE '50%%'");
        assert_eq!(expr.render(&["t.title"]).unwrap(), "t.title LIKE '50%'");
    }

    #[test]
    fn test_raw_fragment_verbatim() {
        let expr = Expression::compile(|e| {
            let modulo = e.raw(" % 7");
            format!("{}{}", e.field("n"), modulo)
        })
        .unwrap();
        assert_eq!(expr.render(&["n"]).unwrap(), "n % 7");
    }

    #[test]
    fn test_raw_percent_s_is_not_a_placeholder() {
        let expr = Expression::compile_for(Dialect::MySql, |e| {
            let layout = e.raw("'%H:%i:%s'");
            format!("DATE_FORMAT({}, {})", e.field("created"), layout)
        })
        .unwrap();
        assert_eq!(expr.build_from(), ["created".to_string()]);
        assert_eq!(expr.template(), "DATE_FORMAT(%s, '%%H:%%i:%%s')");
        assert_eq!(
            expr.render(&["`o`.`created`"]).unwrap(),
            "DATE_FORMAT(`o`.`created`, '%H:%i:%s')"
        );
    }

    #[test]
    fn test_unused_field_with_raw_percent_s_is_rejected() {
        let result = Expression::compile(|e| {
            e.field("unused");
            e.raw("'%s'")
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_timestamp_literal_format() {
        use chrono::{TimeZone, Utc};
        let at = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let expr =
            Expression::compile(|e| format!("{} > {}", e.field("created"), e.value(at))).unwrap();
        assert_eq!(expr.template(), "%s > '2020-01-02 03:04:05'");
    }

    #[test]
    fn test_malformed_templates() {
        assert!(Expression::compile(|_| "100% wrong".to_string()).is_err());
        assert!(Expression::new("%s + %s", vec!["a".into()]).is_err());
        assert!(Expression::compile(|e| {
            e.value(1);
            "1".to_string()
        })
        .is_err());
        assert!(Expression::compile(|e| format!("{}", e.value(f64::INFINITY))).is_err());
    }

    #[test]
    fn test_render_arity() {
        let expr = Expression::new("%s = %s", vec!["a".into(), "b".into()]).unwrap();
        assert!(expr.render(&["only"]).is_err());
    }

    #[test]
    fn test_expression_column() {
        let column =
            ExpressionField::compile("total", |e| format!("{} * {}", e.field("qty"), e.value(2)))
                .unwrap();
        assert!(column.is_computed());
        assert!(column.is_nullable());
        assert_eq!(column.build_from(), ["qty".to_string()]);
    }

    #[test]
    fn test_unnamed_uses_session_allocator() {
        let names = NameAllocator::new("EXPR");
        let a = ExpressionField::unnamed_in(&names, |_| "1".to_string()).unwrap();
        let b = ExpressionField::unnamed_in(&names, |_| "2".to_string()).unwrap();
        assert_eq!(a.name(), "EXPR_1");
        assert_eq!(b.name(), "EXPR_2");
    }

    #[test]
    fn test_cast_and_static() {
        let flag = CastField::bool_from_nullable("has_avatar", "avatar_id").unwrap();
        assert_eq!(
            flag.expression().unwrap().map(Expression::template),
            Some("%s IS NOT NULL")
        );
        assert_eq!(
            flag.codec().decode("has_avatar", &StorageValue::Integer(1)).unwrap(),
            Some(crate::value::FieldValue::Boolean(true))
        );

        let origin = StaticValueField::on("origin", "import").unwrap();
        assert_eq!(
            origin.expression().unwrap().map(Expression::template),
            Some("'import'")
        );
        let yes = StaticValueField::on("always", true).unwrap();
        assert_eq!(yes.raw_codec().type_name(), "boolean");
    }
}
