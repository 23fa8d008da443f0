//! Parameterized query assembly.
//!
//! A [`ComposedQuery`] is built only from `&'static str` fragments; every
//! client-supplied value travels as a bound [`SqlValue`]. The placeholder
//! count of the emitted SQL always equals the number of bound values.

use sqlx::sqlite::SqliteRow;
use sqlx::{Sqlite, SqlitePool};

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

/// A single read statement and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    sql: String,
    params: Vec<SqlValue>,
}

impl ComposedQuery {
    /// Start from a fixed SELECT (with its JOINs and a `WHERE` clause).
    pub fn new(base: &'static str) -> Self {
        Self {
            sql: base.to_string(),
            params: Vec::new(),
        }
    }

    /// Append a fragment together with the values for its placeholders.
    pub fn push<I, V>(&mut self, fragment: &'static str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let before = self.params.len();
        self.sql.push(' ');
        self.sql.push_str(fragment);
        self.params.extend(values.into_iter().map(Into::into));
        debug_assert_eq!(
            count_placeholders(fragment),
            self.params.len() - before,
            "placeholder/value mismatch in fragment: {fragment}"
        );
        self
    }

    /// Append `AND <predicate>`.
    pub fn and<I, V>(&mut self, predicate: &'static str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.sql.push_str(" AND");
        self.push(predicate, values)
    }

    /// Append a fragment without parameters.
    pub fn push_static(&mut self, fragment: &'static str) -> &mut Self {
        self.push(fragment, std::iter::empty::<SqlValue>())
    }

    /// Append `LIMIT ?` when a limit is given.
    pub fn limit(&mut self, limit: Option<i64>) -> &mut Self {
        if let Some(limit) = limit {
            self.push("LIMIT ?", [limit]);
        }
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Number of `?` placeholders in the emitted SQL.
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }

    fn bound(&self) -> sqlx::query::Query<'_, Sqlite, <Sqlite as sqlx::Database>::Arguments<'_>> {
        let mut query = sqlx::query(&self.sql);
        for value in &self.params {
            query = match value {
                SqlValue::Text(s) => query.bind(s.clone()),
                SqlValue::Integer(i) => query.bind(*i),
            };
        }
        query
    }

    pub async fn fetch_all(&self, pool: &SqlitePool) -> Result<Vec<SqliteRow>, sqlx::Error> {
        self.bound().fetch_all(pool).await
    }

    pub async fn fetch_optional(
        &self,
        pool: &SqlitePool,
    ) -> Result<Option<SqliteRow>, sqlx::Error> {
        self.bound().fetch_optional(pool).await
    }
}

/// Count `?` placeholders outside single-quoted literals.
pub fn count_placeholders(sql: &str) -> usize {
    let mut in_literal = false;
    let mut count = 0;
    for c in sql.chars() {
        match c {
            '\'' => in_literal = !in_literal,
            '?' if !in_literal => count += 1,
            _ => {}
        }
    }
    count
}
