//! SQLite user repository.

use sqlx::SqlitePool;

use super::SqliteResolver;
use super::helpers::row_to_user;
use crate::db::{DbError, DbResult, EntityKind, IdResolver, User, UserFilter};

pub struct SqliteUserRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> SqliteUserRepository<'a> {
    pub async fn list(&self, filter: &UserFilter) -> DbResult<Vec<User>> {
        let rows = filter.compose().fetch_all(self.pool).await?;
        Ok(rows.iter().map(row_to_user).collect())
    }

    /// Look a user up by id, email, name, or `"me"`.
    pub async fn get(&self, token: &str) -> DbResult<User> {
        let id = SqliteResolver { pool: self.pool }
            .resolve_required(EntityKind::User, token, None)
            .await?;
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(&id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", token))?;
        Ok(row_to_user(&row))
    }
}
