//! SQLite-backed identifier resolver.

use sqlx::{Row, SqlitePool};

use crate::db::resolver::resolution_query;
use crate::db::{DbResult, EntityKind, Id, IdResolver};

pub struct SqliteResolver<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl IdResolver for SqliteResolver<'_> {
    async fn resolve(
        &self,
        kind: EntityKind,
        token: Option<&str>,
        scope: Option<&str>,
    ) -> DbResult<Option<Id>> {
        let Some(query) = resolution_query(kind, token, scope) else {
            return Ok(None);
        };
        let row = query.fetch_optional(self.pool).await?;
        Ok(row.map(|r| r.get("id")))
    }
}
