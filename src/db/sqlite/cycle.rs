//! SQLite cycle repository.

use sqlx::SqlitePool;

use super::SqliteResolver;
use super::helpers::row_to_cycle;
use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{
    Cycle, CycleFilter, CycleType, CycleUpdate, DbError, DbResult, EntityKind, Id, IdResolver,
    NewCycle,
};

/// Status given to new cycles.
pub const INITIAL_CYCLE_STATUS: &str = "upcoming";

pub struct SqliteCycleRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> SqliteCycleRepository<'a> {
    fn resolver(&self) -> SqliteResolver<'a> {
        SqliteResolver { pool: self.pool }
    }

    /// Cycles of a team, newest first. The team is required.
    pub async fn list(&self, team: &str, cycle_type: Option<CycleType>) -> DbResult<Vec<Cycle>> {
        let team_id = self
            .resolver()
            .resolve_required(EntityKind::Team, team, None)
            .await?;
        let filter = CycleFilter {
            team_id,
            cycle_type,
        };
        let rows = filter.compose().fetch_all(self.pool).await?;
        Ok(rows.iter().map(row_to_cycle).collect())
    }

    pub async fn get(&self, token: &str) -> DbResult<Cycle> {
        let id = self.resolve(token).await?;
        self.get_by_id(&id).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Cycle> {
        let row = sqlx::query("SELECT * FROM cycles WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Cycle", id))?;
        Ok(row_to_cycle(&row))
    }

    pub async fn create(&self, cycle: &NewCycle) -> DbResult<Cycle> {
        let team_id = self
            .resolver()
            .resolve_required(EntityKind::Team, &cycle.team, None)
            .await?;
        let id = generate_entity_id(EntityKind::Cycle);
        let now = current_timestamp();

        sqlx::query(
            "INSERT INTO cycles (id, name, description, status, start_date, end_date, team_id, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&cycle.name)
        .bind(&cycle.description)
        .bind(INITIAL_CYCLE_STATUS)
        .bind(&cycle.start_date)
        .bind(&cycle.end_date)
        .bind(&team_id)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.get_by_id(&id).await
    }

    /// Update the given fields; an empty update returns the cycle unchanged.
    pub async fn update(&self, token: &str, update: &CycleUpdate) -> DbResult<Cycle> {
        let id = self.resolve(token).await?;
        let touched = update.name.is_some()
            || update.description.is_some()
            || update.status.is_some()
            || update.start_date.is_some()
            || update.end_date.is_some();

        if touched {
            sqlx::query(
                "UPDATE cycles SET \
                 name = COALESCE(?, name), \
                 description = COALESCE(?, description), \
                 status = COALESCE(?, status), \
                 start_date = COALESCE(?, start_date), \
                 end_date = COALESCE(?, end_date), \
                 updated_at = ? \
                 WHERE id = ?",
            )
            .bind(&update.name)
            .bind(&update.description)
            .bind(&update.status)
            .bind(&update.start_date)
            .bind(&update.end_date)
            .bind(current_timestamp())
            .bind(&id)
            .execute(self.pool)
            .await?;
        }
        self.get_by_id(&id).await
    }

    pub async fn delete(&self, token: &str) -> DbResult<Id> {
        let id = self.resolve(token).await?;
        sqlx::query("DELETE FROM cycles WHERE id = ?")
            .bind(&id)
            .execute(self.pool)
            .await?;
        Ok(id)
    }

    async fn resolve(&self, token: &str) -> DbResult<Id> {
        self.resolver()
            .resolve_required(EntityKind::Cycle, token, None)
            .await
    }
}
