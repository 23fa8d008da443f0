//! SQLite comment repository.

use sqlx::SqlitePool;
use tracing::instrument;

use super::SqliteResolver;
use super::helpers::row_to_comment;
use crate::db::utils::{current_timestamp, generate_id};
use crate::db::{Comment, DbError, DbResult, EntityKind, Id, IdResolver, ME_TOKEN};

macro_rules! comment_select {
    () => {
        "SELECT c.*, u.name AS user_name, u.email AS user_email \
         FROM comments c LEFT JOIN users u ON c.user_id = u.id"
    };
}

const COMMENTS_OF_ISSUE: &str = concat!(
    comment_select!(),
    " WHERE c.issue_id = ? ORDER BY c.created_at ASC, c.id ASC"
);
const COMMENT_BY_ID: &str = concat!(comment_select!(), " WHERE c.id = ?");

fn require_body(body: &str) -> DbResult<()> {
    if body.trim().is_empty() {
        return Err(DbError::validation("Comment body is required"));
    }
    Ok(())
}

pub struct SqliteCommentRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> SqliteCommentRepository<'a> {
    fn resolver(&self) -> SqliteResolver<'a> {
        SqliteResolver { pool: self.pool }
    }

    /// Comments on an issue, oldest first.
    pub async fn list(&self, issue: &str) -> DbResult<Vec<Comment>> {
        let issue_id = self
            .resolver()
            .resolve_required(EntityKind::Issue, issue, None)
            .await?;
        let rows = sqlx::query(COMMENTS_OF_ISSUE)
            .bind(&issue_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.iter().map(row_to_comment).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Comment> {
        let row = sqlx::query(COMMENT_BY_ID)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Comment", id))?;
        Ok(row_to_comment(&row))
    }

    /// Comment on an issue as the acting user.
    ///
    /// A reply's parent must be a comment on the same issue.
    #[instrument(skip(self, body))]
    pub async fn create(&self, issue: &str, body: &str, parent_id: Option<&str>) -> DbResult<Comment> {
        require_body(body)?;
        let resolver = self.resolver();
        let issue_id = resolver
            .resolve_required(EntityKind::Issue, issue, None)
            .await?;
        let user_id = resolver.resolve(EntityKind::User, Some(ME_TOKEN), None).await?;
        let parent_id = parent_id.filter(|p| !p.is_empty());
        if let Some(parent_id) = parent_id {
            let parent = self.get_by_id(parent_id).await?;
            if parent.issue_id != issue_id {
                return Err(DbError::validation(format!(
                    "Comment '{}' belongs to a different issue",
                    parent_id
                )));
            }
        }

        let id = generate_id("comment");
        let now = current_timestamp();

        sqlx::query(
            "INSERT INTO comments (id, body, issue_id, user_id, parent_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(body)
        .bind(&issue_id)
        .bind(&user_id)
        .bind(parent_id)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.get_by_id(&id).await
    }

    pub async fn update(&self, id: &str, body: &str) -> DbResult<Comment> {
        require_body(body)?;
        self.get_by_id(id).await?;
        sqlx::query("UPDATE comments SET body = ?, updated_at = ? WHERE id = ?")
            .bind(body)
            .bind(current_timestamp())
            .bind(id)
            .execute(self.pool)
            .await?;
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<Id> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Comment", id));
        }
        Ok(id.to_string())
    }
}
