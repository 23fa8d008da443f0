//! SQLite team repository.

use sqlx::SqlitePool;
use tracing::instrument;

use super::SqliteResolver;
use super::helpers::{row_to_status, row_to_team};
use crate::db::utils::current_timestamp;
use crate::db::{
    DbError, DbResult, EntityKind, IdResolver, IssueStatus, NewTeam, Team, TeamFilter,
};

pub const DEFAULT_TEAM_COLOR: &str = "#5e6ad2";

pub struct SqliteTeamRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> SqliteTeamRepository<'a> {
    fn resolver(&self) -> SqliteResolver<'a> {
        SqliteResolver { pool: self.pool }
    }

    pub async fn list(&self, filter: &TeamFilter) -> DbResult<Vec<Team>> {
        let rows = filter.compose().fetch_all(self.pool).await?;
        Ok(rows.iter().map(row_to_team).collect())
    }

    /// Look a team up by id, key or name.
    pub async fn get(&self, token: &str) -> DbResult<Team> {
        let id = self
            .resolver()
            .resolve_required(EntityKind::Team, token, None)
            .await?;
        self.get_by_id(&id).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Team> {
        let row = sqlx::query("SELECT * FROM teams WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Team", id))?;
        Ok(row_to_team(&row))
    }

    /// Create a team. Its workflow statuses are seeded by the schema.
    #[instrument(skip(self, team), fields(key = %team.key))]
    pub async fn create(&self, team: &NewTeam) -> DbResult<Team> {
        if team.name.trim().is_empty() {
            return Err(DbError::validation("Team name is required"));
        }
        validate_team_key(&team.key)?;

        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM teams WHERE key = ?")
            .bind(&team.key)
            .fetch_optional(self.pool)
            .await?;
        if existing.is_some() {
            return Err(DbError::AlreadyExists {
                entity_type: "Team".to_string(),
                id: team.key.clone(),
            });
        }

        let id = format!("team_{}", team.key.to_lowercase());
        let now = current_timestamp();

        sqlx::query(
            "INSERT INTO teams (id, name, key, color, icon, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&team.name)
        .bind(&team.key)
        .bind(team.color.as_deref().unwrap_or(DEFAULT_TEAM_COLOR))
        .bind(&team.icon)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.get_by_id(&id).await
    }

    /// Statuses of a team plus global statuses, in workflow order.
    pub async fn statuses(&self, token: &str) -> DbResult<Vec<IssueStatus>> {
        let team_id = self
            .resolver()
            .resolve_required(EntityKind::Team, token, None)
            .await?;
        let rows = sqlx::query(
            "SELECT * FROM issue_statuses WHERE team_id = ? OR team_id IS NULL \
             ORDER BY position ASC, id ASC",
        )
        .bind(&team_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.iter().map(row_to_status).collect())
    }
}

/// Team keys are two to five uppercase ASCII letters.
pub fn validate_team_key(key: &str) -> DbResult<()> {
    let valid = (2..=5).contains(&key.len()) && key.bytes().all(|b| b.is_ascii_uppercase());
    if valid {
        Ok(())
    } else {
        Err(DbError::validation(format!(
            "Invalid team key '{}': must be 2-5 uppercase letters",
            key
        )))
    }
}
