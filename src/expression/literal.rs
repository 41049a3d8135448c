use crate::dialect::Dialect;
use crate::error::{FieldError, FieldResult};
use crate::value::TIMESTAMP_FORMAT;
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

/// A constant bound into an expression template
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Exported as a quoted `YYYY-MM-DD HH:MM:SS` string
    Timestamp(DateTime<Utc>),
    Guid(Uuid),
}

impl Literal {
    /// Render as an SQL literal for `dialect`.
    ///
    /// Strings are single-quoted with embedded quotes doubled; MySQL also
    /// gets its backslashes doubled. Non-finite floats have no SQL spelling
    /// and are rejected.
    pub fn export(&self, dialect: Dialect) -> FieldResult<String> {
        Ok(match self {
            Literal::Null => "NULL".to_string(),
            Literal::Bool(true) => "TRUE".to_string(),
            Literal::Bool(false) => "FALSE".to_string(),
            Literal::Integer(i) => i.to_string(),
            Literal::Float(f) if f.is_finite() => format!("{f:?}"),
            Literal::Float(f) => {
                return Err(FieldError::construction(format!(
                    "{f} cannot be used as an SQL literal"
                )))
            }
            Literal::Text(s) => quote(s, dialect),
            Literal::Timestamp(t) => format!("'{}'", t.format(TIMESTAMP_FORMAT)),
            Literal::Guid(g) => format!("'{}'", g.hyphenated()),
        })
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Literal::Bool(_))
    }
}

fn quote(s: &str, dialect: Dialect) -> String {
    let mut escaped = s.replace('\'', "''");
    if dialect == Dialect::MySql {
        escaped = escaped.replace('\\', "\\\\");
    }
    format!("'{escaped}'")
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Integer(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Integer(value.into())
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Literal::Integer(value.into())
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(value: DateTime<Utc>) -> Self {
        Literal::Timestamp(value)
    }
}

impl From<NaiveDateTime> for Literal {
    fn from(value: NaiveDateTime) -> Self {
        Literal::Timestamp(value.and_utc())
    }
}

impl From<Uuid> for Literal {
    fn from(value: Uuid) -> Self {
        Literal::Guid(value)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map_or(Literal::Null, Into::into)
    }
}
