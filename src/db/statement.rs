//! SQL statements with bound parameters, and validated identifiers.

use crate::db::dialect::Dialect;
use crate::error::{DbError, DbResult};
use sqlx::any::{Any, AnyArguments};
use sqlx::query::Query;

const MAX_IDENTIFIER_LEN: usize = 64;

/// A positional parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(v as i64)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(v)
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Param::Null)
    }
}

/// SQL text with `?` placeholders and the values bound to them, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Param>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Statement {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub(crate) fn to_query(&self) -> Query<'_, Any, AnyArguments<'_>> {
        let mut query = sqlx::query(&self.sql);
        for param in &self.params {
            query = match param {
                Param::Null => query.bind(Option::<String>::None),
                Param::Int(v) => query.bind(*v),
                Param::Float(v) => query.bind(*v),
                Param::Text(v) => query.bind(v.clone()),
                Param::Bool(v) => query.bind(*v),
            };
        }
        query
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Statement::new(sql)
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::new(sql)
    }
}

/// A database or table name that is safe to interpolate into SQL text.
///
/// Parameter binding cannot stand in for identifiers, so names are checked
/// against `[A-Za-z_][A-Za-z0-9_]*` before they are ever formatted into a
/// statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: &str) -> DbResult<Self> {
        let mut chars = name.chars();
        let valid_head = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if valid_head && valid_tail && name.len() <= MAX_IDENTIFIER_LEN {
            Ok(Identifier(name.to_string()))
        } else {
            Err(DbError::InvalidIdentifier(name.to_string()))
        }
    }

    /// For names fixed at compile time.
    pub(crate) fn trusted(name: &'static str) -> Self {
        debug_assert!(Identifier::new(name).is_ok(), "invalid identifier {name}");
        Identifier(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self, dialect: Dialect) -> String {
        dialect.quote_identifier(&self.0)
    }
}
