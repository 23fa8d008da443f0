//! SQLite issue repository.
//!
//! Issue identifiers (`ENG-12`) come from a per-team counter row that is
//! incremented atomically inside the insert transaction, so concurrent
//! creates in one team never share a number.

use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};

use super::SqliteResolver;
use super::helpers::{row_to_comment, row_to_issue, row_to_label};
use crate::db::filter::{issue_select, resolve_filter};
use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{
    DbError, DbResult, EntityKind, Id, IdResolver, Issue, IssueDetail, IssueFilter, IssueUpdate,
    ME_TOKEN, NewIssue, RelationType, UnresolvedFilterPolicy, priority_id,
};

/// Identifier prefix used when a team has no key.
pub const FALLBACK_ISSUE_KEY: &str = "ISS";

const ISSUE_BY_ID: &str = concat!(issue_select!(), " WHERE i.id = ?");

const BLOCKS: &str = concat!(
    issue_select!(),
    " JOIN issue_relations ir ON i.id = ir.target_issue_id \
     WHERE ir.source_issue_id = ? AND ir.relation_type = 'blocks' ORDER BY i.identifier ASC"
);

const BLOCKED_BY: &str = concat!(
    issue_select!(),
    " JOIN issue_relations ir ON i.id = ir.source_issue_id \
     WHERE ir.target_issue_id = ? AND ir.relation_type = 'blocks' ORDER BY i.identifier ASC"
);

const RELATED: &str = concat!(
    issue_select!(),
    " JOIN issue_relations ir \
     ON (ir.source_issue_id = ? AND i.id = ir.target_issue_id) \
     OR (ir.target_issue_id = ? AND i.id = ir.source_issue_id) \
     WHERE ir.relation_type = 'related' ORDER BY i.identifier ASC"
);

const NEXT_ISSUE_NUMBER: &str = "INSERT INTO issue_counters (team_id, last_number) \
     VALUES (?, (SELECT COUNT(*) FROM issues WHERE team_id = ?) + 1) \
     ON CONFLICT(team_id) DO UPDATE SET last_number = last_number + 1 \
     RETURNING last_number";

pub struct SqliteIssueRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
    pub(crate) policy: UnresolvedFilterPolicy,
}

impl<'a> SqliteIssueRepository<'a> {
    fn resolver(&self) -> SqliteResolver<'a> {
        SqliteResolver { pool: self.pool }
    }

    #[instrument(skip(self, filter))]
    pub async fn list(&self, filter: &IssueFilter) -> DbResult<Vec<Issue>> {
        let resolved = filter.resolve(&self.resolver(), self.policy).await?;
        let query = resolved.compose();
        debug!(sql = query.sql(), params = query.params().len(), "Listing issues");
        let rows = query.fetch_all(self.pool).await?;
        Ok(rows.iter().map(row_to_issue).collect())
    }

    /// Look an issue up by id or identifier, with labels and comments.
    pub async fn get(&self, token: &str, include_relations: bool) -> DbResult<IssueDetail> {
        let id = self
            .resolver()
            .resolve_required(EntityKind::Issue, token, None)
            .await?;
        let issue = self.get_by_id(&id).await?;

        let labels = sqlx::query(
            "SELECT l.* FROM labels l JOIN issue_labels il ON l.id = il.label_id \
             WHERE il.issue_id = ? ORDER BY l.name ASC",
        )
        .bind(&id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(row_to_label)
        .collect();

        let comments = sqlx::query(
            "SELECT c.*, u.name AS user_name, u.email AS user_email FROM comments c \
             LEFT JOIN users u ON c.user_id = u.id \
             WHERE c.issue_id = ? ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(&id)
        .fetch_all(self.pool)
        .await?
        .iter()
        .map(row_to_comment)
        .collect();

        let (blocks, blocked_by, related) = if include_relations {
            (
                Some(self.related_issues(BLOCKS, &id, 1).await?),
                Some(self.related_issues(BLOCKED_BY, &id, 1).await?),
                Some(self.related_issues(RELATED, &id, 2).await?),
            )
        } else {
            (None, None, None)
        };

        Ok(IssueDetail {
            issue,
            labels,
            comments,
            blocks,
            blocked_by,
            related,
        })
    }

    async fn related_issues(&self, sql: &'static str, id: &Id, binds: usize) -> DbResult<Vec<Issue>> {
        let mut query = sqlx::query(sql);
        for _ in 0..binds {
            query = query.bind(id);
        }
        let rows = query.fetch_all(self.pool).await?;
        Ok(rows.iter().map(row_to_issue).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Issue> {
        let row = sqlx::query(ISSUE_BY_ID)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Issue", id))?;
        Ok(row_to_issue(&row))
    }

    /// Resolve a status id, name or type among the team's and global statuses.
    async fn resolve_status(&self, team_id: Option<&str>, state: Option<&str>) -> DbResult<Option<Id>> {
        let Some(state) = state.filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        let id: Option<Id> = sqlx::query_scalar(
            "SELECT id FROM issue_statuses \
             WHERE (team_id = ? OR team_id IS NULL) AND (id = ? OR name = ? OR type = ?) \
             ORDER BY (id = ?) DESC, (team_id IS NULL) ASC, position ASC, id ASC LIMIT 1",
        )
        .bind(team_id)
        .bind(state)
        .bind(state)
        .bind(state)
        .bind(state)
        .fetch_optional(self.pool)
        .await?;

        match (id, self.policy) {
            (None, UnresolvedFilterPolicy::Reject) => Err(DbError::not_found("Status", state)),
            (id, _) => Ok(id),
        }
    }

    /// Resolve every token of a list, dropping or rejecting misses per policy.
    async fn resolve_all(
        &self,
        kind: EntityKind,
        tokens: &[String],
        scope: Option<&str>,
    ) -> DbResult<Vec<Id>> {
        let resolver = self.resolver();
        let mut ids = Vec::with_capacity(tokens.len());
        for token in tokens {
            if let Some(id) = resolve_filter(&resolver, kind, Some(token), scope, self.policy).await? {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    #[instrument(skip(self, issue), fields(team = %issue.team))]
    pub async fn create(&self, issue: &NewIssue) -> DbResult<Issue> {
        if issue.title.trim().is_empty() {
            return Err(DbError::validation("Issue title is required"));
        }

        let resolver = self.resolver();
        let team_id = resolver
            .resolve_required(EntityKind::Team, &issue.team, None)
            .await?;
        let scope = Some(team_id.as_str());

        let project_id = resolve_filter(
            &resolver,
            EntityKind::Project,
            issue.project.as_deref(),
            scope,
            self.policy,
        )
        .await?;
        let assignee_id = resolve_filter(
            &resolver,
            EntityKind::User,
            issue.assignee.as_deref(),
            None,
            self.policy,
        )
        .await?;
        let creator_id = resolver.resolve(EntityKind::User, Some(ME_TOKEN), None).await?;
        let status_id = self.resolve_status(scope, issue.state.as_deref()).await?;
        let label_ids = self.resolve_all(EntityKind::Label, &issue.labels, scope).await?;
        let blocks = self.resolve_all(EntityKind::Issue, &issue.blocks, None).await?;
        let blocked_by = self.resolve_all(EntityKind::Issue, &issue.blocked_by, None).await?;
        let related = self.resolve_all(EntityKind::Issue, &issue.related_to, None).await?;

        let priority = issue.priority.unwrap_or(0);
        let id = generate_entity_id(EntityKind::Issue);
        let now = current_timestamp();

        let mut tx = self.pool.begin().await?;

        // Take the write lock first so concurrent creates queue on it.
        let number: i64 = sqlx::query_scalar(NEXT_ISSUE_NUMBER)
            .bind(&team_id)
            .bind(&team_id)
            .fetch_one(&mut *tx)
            .await?;
        let key: Option<String> = sqlx::query_scalar("SELECT key FROM teams WHERE id = ?")
            .bind(&team_id)
            .fetch_optional(&mut *tx)
            .await?;
        let identifier = format!(
            "{}-{}",
            key.as_deref().unwrap_or(FALLBACK_ISSUE_KEY),
            number
        );

        sqlx::query(
            "INSERT INTO issues (id, identifier, title, description, priority_id, priority_value, \
             status_id, project_id, team_id, assignee_id, creator_id, due_date, estimate, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&identifier)
        .bind(&issue.title)
        .bind(&issue.description)
        .bind(priority_id(priority))
        .bind(priority)
        .bind(&status_id)
        .bind(&project_id)
        .bind(&team_id)
        .bind(&assignee_id)
        .bind(&creator_id)
        .bind(&issue.due_date)
        .bind(issue.estimate)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for label_id in &label_ids {
            sqlx::query("INSERT INTO issue_labels (issue_id, label_id) VALUES (?, ?)")
                .bind(&id)
                .bind(label_id)
                .execute(&mut *tx)
                .await?;
        }

        let relations = blocks
            .iter()
            .map(|target| (&id, target, RelationType::Blocks))
            .chain(blocked_by.iter().map(|source| (source, &id, RelationType::Blocks)))
            .chain(related.iter().map(|target| (&id, target, RelationType::Related)));
        for (source, target, relation) in relations {
            sqlx::query(
                "INSERT OR IGNORE INTO issue_relations (source_issue_id, target_issue_id, relation_type) \
                 VALUES (?, ?, ?)",
            )
            .bind(source)
            .bind(target)
            .bind(relation.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(%id, %identifier, "Created issue");

        self.get_by_id(&id).await
    }

    /// Apply an update. Returns `None` when the update carries no fields.
    #[instrument(skip(self, update))]
    pub async fn update(&self, token: &str, update: &IssueUpdate) -> DbResult<Option<Issue>> {
        let resolver = self.resolver();
        let id = resolver
            .resolve_required(EntityKind::Issue, token, None)
            .await?;
        if update.is_empty() {
            return Ok(None);
        }

        let team_id: Option<Id> = sqlx::query("SELECT team_id FROM issues WHERE id = ?")
            .bind(&id)
            .fetch_one(self.pool)
            .await?
            .get("team_id");
        let scope = team_id.as_deref();

        let status_id = self.resolve_status(scope, update.state.as_deref()).await?;
        let assignee_id = match &update.assignee {
            Some(Some(assignee)) => Some(
                resolve_filter(&resolver, EntityKind::User, Some(assignee), None, self.policy)
                    .await?,
            ),
            Some(None) => Some(None),
            None => None,
        };
        let label_ids = match &update.labels {
            Some(labels) => Some(self.resolve_all(EntityKind::Label, labels, scope).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE issues SET \
             title = COALESCE(?, title), \
             description = COALESCE(?, description), \
             priority_value = COALESCE(?, priority_value), \
             priority_id = CASE WHEN ? THEN ? ELSE priority_id END, \
             status_id = COALESCE(?, status_id), \
             assignee_id = CASE WHEN ? THEN ? ELSE assignee_id END, \
             estimate = COALESCE(?, estimate), \
             due_date = COALESCE(?, due_date), \
             updated_at = ? \
             WHERE id = ?",
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.priority)
        .bind(update.priority.is_some())
        .bind(update.priority.and_then(priority_id))
        .bind(&status_id)
        .bind(assignee_id.is_some())
        .bind(assignee_id.flatten())
        .bind(update.estimate)
        .bind(&update.due_date)
        .bind(current_timestamp())
        .bind(&id)
        .execute(&mut *tx)
        .await?;

        if let Some(label_ids) = label_ids {
            sqlx::query("DELETE FROM issue_labels WHERE issue_id = ?")
                .bind(&id)
                .execute(&mut *tx)
                .await?;
            for label_id in &label_ids {
                sqlx::query("INSERT INTO issue_labels (issue_id, label_id) VALUES (?, ?)")
                    .bind(&id)
                    .bind(label_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        self.get_by_id(&id).await.map(Some)
    }

    /// Delete an issue with its labels, relations and comments.
    #[instrument(skip(self))]
    pub async fn delete(&self, token: &str) -> DbResult<Id> {
        let id = self
            .resolver()
            .resolve_required(EntityKind::Issue, token, None)
            .await?;
        sqlx::query("DELETE FROM issues WHERE id = ?")
            .bind(&id)
            .execute(self.pool)
            .await?;
        Ok(id)
    }
}
