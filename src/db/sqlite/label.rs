//! SQLite label repository.

use sqlx::SqlitePool;

use super::SqliteResolver;
use super::helpers::row_to_label;
use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{
    DbError, DbResult, EntityKind, Id, IdResolver, Label, LabelFilter, LabelUpdate, NewLabel,
    UnresolvedFilterPolicy,
};

pub const DEFAULT_LABEL_COLOR: &str = "#bec2c8";

pub struct SqliteLabelRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
    pub(crate) policy: UnresolvedFilterPolicy,
}

impl<'a> SqliteLabelRepository<'a> {
    fn resolver(&self) -> SqliteResolver<'a> {
        SqliteResolver { pool: self.pool }
    }

    pub async fn list(&self, filter: &LabelFilter) -> DbResult<Vec<Label>> {
        let resolved = filter.resolve(&self.resolver(), self.policy).await?;
        let rows = resolved.compose().fetch_all(self.pool).await?;
        Ok(rows.iter().map(row_to_label).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Label> {
        let row = sqlx::query("SELECT * FROM labels WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Label", id))?;
        Ok(row_to_label(&row))
    }

    /// Create a label for a team, or a workspace-wide label without one.
    pub async fn create(&self, label: &NewLabel) -> DbResult<Label> {
        let team_id = match label.team.as_deref().filter(|t| !t.is_empty()) {
            Some(team) => Some(
                self.resolver()
                    .resolve_required(EntityKind::Team, team, None)
                    .await?,
            ),
            None => None,
        };
        let id = generate_entity_id(EntityKind::Label);
        let now = current_timestamp();

        sqlx::query(
            "INSERT INTO labels (id, name, color, description, team_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&label.name)
        .bind(label.color.as_deref().unwrap_or(DEFAULT_LABEL_COLOR))
        .bind(&label.description)
        .bind(&team_id)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.get_by_id(&id).await
    }

    /// Update name and color; an empty update returns the label unchanged.
    pub async fn update(&self, token: &str, update: &LabelUpdate) -> DbResult<Label> {
        let id = self.resolve(token).await?;
        if update.name.is_some() || update.color.is_some() {
            sqlx::query(
                "UPDATE labels SET name = COALESCE(?, name), color = COALESCE(?, color), \
                 updated_at = ? WHERE id = ?",
            )
            .bind(&update.name)
            .bind(&update.color)
            .bind(current_timestamp())
            .bind(&id)
            .execute(self.pool)
            .await?;
        }
        self.get_by_id(&id).await
    }

    pub async fn delete(&self, token: &str) -> DbResult<Id> {
        let id = self.resolve(token).await?;
        sqlx::query("DELETE FROM labels WHERE id = ?")
            .bind(&id)
            .execute(self.pool)
            .await?;
        Ok(id)
    }

    async fn resolve(&self, token: &str) -> DbResult<Id> {
        self.resolver()
            .resolve_required(EntityKind::Label, token, None)
            .await
    }
}
