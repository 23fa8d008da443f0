//! SQLite project and milestone repository.

use sqlx::SqlitePool;
use tracing::instrument;

use super::SqliteResolver;
use super::helpers::{row_to_milestone, row_to_project};
use crate::db::filter::resolve_filter;
use crate::db::utils::{current_timestamp, generate_entity_id, generate_id};
use crate::db::{
    DbError, DbResult, EntityKind, Id, IdResolver, Milestone, NewMilestone, NewProject, Project,
    ProjectDetail, ProjectFilter, ProjectUpdate, UnresolvedFilterPolicy,
};

pub const DEFAULT_PROJECT_STATE: &str = "started";

const PROJECT_BY_ID: &str = "SELECT p.*, t.name AS team_name, u.name AS lead_name FROM projects p \
     LEFT JOIN teams t ON p.team_id = t.id \
     LEFT JOIN users u ON p.lead_id = u.id WHERE p.id = ?";

pub struct SqliteProjectRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
    pub(crate) policy: UnresolvedFilterPolicy,
}

impl<'a> SqliteProjectRepository<'a> {
    fn resolver(&self) -> SqliteResolver<'a> {
        SqliteResolver { pool: self.pool }
    }

    pub async fn list(&self, filter: &ProjectFilter) -> DbResult<Vec<Project>> {
        let resolved = filter.resolve(&self.resolver(), self.policy).await?;
        let rows = resolved.compose().fetch_all(self.pool).await?;
        Ok(rows.iter().map(row_to_project).collect())
    }

    /// Look a project up by id or name, optionally with its milestones.
    pub async fn get(&self, token: &str, include_milestones: bool) -> DbResult<ProjectDetail> {
        let id = self
            .resolver()
            .resolve_required(EntityKind::Project, token, None)
            .await?;
        let project = self.get_by_id(&id).await?;
        let milestones = if include_milestones {
            Some(self.milestones_of(&id).await?)
        } else {
            None
        };
        Ok(ProjectDetail {
            project,
            milestones,
        })
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Project> {
        let row = sqlx::query(PROJECT_BY_ID)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Project", id))?;
        Ok(row_to_project(&row))
    }

    #[instrument(skip(self, project), fields(name = %project.name))]
    pub async fn create(&self, project: &NewProject) -> DbResult<Project> {
        let resolver = self.resolver();
        let team_id = resolver
            .resolve_required(EntityKind::Team, &project.team, None)
            .await?;
        let lead_id = resolve_filter(
            &resolver,
            EntityKind::User,
            project.lead.as_deref(),
            None,
            self.policy,
        )
        .await?;

        let id = generate_entity_id(EntityKind::Project);
        let now = current_timestamp();

        sqlx::query(
            "INSERT INTO projects (id, name, description, icon, color, status, lead_id, team_id, \
             priority, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.icon)
        .bind(&project.color)
        .bind(project.state.as_deref().unwrap_or(DEFAULT_PROJECT_STATE))
        .bind(&lead_id)
        .bind(&team_id)
        .bind(project.priority.unwrap_or(0))
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.get_by_id(&id).await
    }

    /// Apply an update. Returns `None` when the update carries no fields.
    #[instrument(skip(self, update))]
    pub async fn update(&self, token: &str, update: &ProjectUpdate) -> DbResult<Option<Project>> {
        let resolver = self.resolver();
        let id = resolver
            .resolve_required(EntityKind::Project, token, None)
            .await?;
        if update.is_empty() {
            return Ok(None);
        }

        let lead_id = match &update.lead {
            Some(Some(lead)) => Some(
                resolve_filter(&resolver, EntityKind::User, Some(lead), None, self.policy).await?,
            ),
            Some(None) => Some(None),
            None => None,
        };

        // Absent fields keep their value. The CASE flag separates a cleared
        // lead from an untouched one.
        sqlx::query(
            "UPDATE projects SET \
             name = COALESCE(?, name), \
             description = COALESCE(?, description), \
             status = COALESCE(?, status), \
             lead_id = CASE WHEN ? THEN ? ELSE lead_id END, \
             updated_at = ? \
             WHERE id = ?",
        )
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.state)
        .bind(lead_id.is_some())
        .bind(lead_id.flatten())
        .bind(current_timestamp())
        .bind(&id)
        .execute(self.pool)
        .await?;

        self.get_by_id(&id).await.map(Some)
    }

    /// Milestones of a project, earliest target first.
    pub async fn milestones(&self, project: &str) -> DbResult<Vec<Milestone>> {
        let id = self
            .resolver()
            .resolve_required(EntityKind::Project, project, None)
            .await?;
        self.milestones_of(&id).await
    }

    async fn milestones_of(&self, project_id: &Id) -> DbResult<Vec<Milestone>> {
        let rows = sqlx::query(
            "SELECT * FROM milestones WHERE project_id = ? ORDER BY target_date ASC, id ASC",
        )
        .bind(project_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.iter().map(row_to_milestone).collect())
    }

    pub async fn create_milestone(
        &self,
        project: &str,
        milestone: &NewMilestone,
    ) -> DbResult<Milestone> {
        let project_id = self
            .resolver()
            .resolve_required(EntityKind::Project, project, None)
            .await?;
        let id = generate_id("mile");
        let now = current_timestamp();

        sqlx::query(
            "INSERT INTO milestones (id, name, description, target_date, project_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&milestone.name)
        .bind(&milestone.description)
        .bind(&milestone.target_date)
        .bind(&project_id)
        .bind(&now)
        .execute(self.pool)
        .await?;

        let row = sqlx::query("SELECT * FROM milestones WHERE id = ?")
            .bind(&id)
            .fetch_one(self.pool)
            .await?;
        Ok(row_to_milestone(&row))
    }
}
