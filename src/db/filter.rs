//! Typed list filters and the query composer behind every list operation.
//!
//! Composition runs in two phases. `resolve` turns human-supplied tokens
//! (team key, project name, user email, ...) into ids through an
//! [`IdResolver`]; `compose` is a pure, fixed pipeline of predicate
//! contributors over the resolved filter. Predicates are appended in a fixed
//! priority order so the generated SQL is deterministic.

use tracing::debug;

use crate::db::{ComposedQuery, DbError, DbResult, EntityKind, Id, IdResolver};

/// What to do when a filter value does not resolve to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedFilterPolicy {
    /// Drop the clause; the filter narrows nothing.
    #[default]
    Ignore,
    /// Fail the list call with a not-found error.
    Reject,
}

/// Resolve one optional filter token under `policy`.
pub async fn resolve_filter<R: IdResolver>(
    resolver: &R,
    kind: EntityKind,
    token: Option<&str>,
    scope: Option<&str>,
    policy: UnresolvedFilterPolicy,
) -> DbResult<Option<Id>> {
    let Some(token) = non_empty(token) else {
        return Ok(None);
    };
    match resolver.resolve(kind, Some(token), scope).await? {
        Some(id) => Ok(Some(id)),
        None => match policy {
            UnresolvedFilterPolicy::Ignore => {
                debug!(kind = ?kind, token, "dropping unresolved filter");
                Ok(None)
            }
            UnresolvedFilterPolicy::Reject => {
                Err(DbError::not_found(kind.display_name(), token))
            }
        },
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn contains_pattern(value: &str) -> String {
    format!("%{value}%")
}

fn positive(limit: Option<i64>) -> Option<i64> {
    limit.filter(|l| *l > 0)
}

// =============================================================================
// Issues
// =============================================================================

macro_rules! issue_select {
    () => {
        "SELECT i.id, i.identifier, i.title, i.description, i.priority_id, i.priority_value, \
         i.status_id, i.project_id, i.team_id, i.assignee_id, i.creator_id, i.cycle_id, \
         i.estimate, i.due_date, i.created_at, i.updated_at, i.archived_at, i.completed_at, \
         i.canceled_at, u.name AS assignee_name, p.name AS project_name, t.name AS team_name, \
         s.name AS status_name, s.type AS status_type \
         FROM issues i \
         LEFT JOIN users u ON i.assignee_id = u.id \
         LEFT JOIN projects p ON i.project_id = p.id \
         LEFT JOIN teams t ON i.team_id = t.id \
         LEFT JOIN issue_statuses s ON i.status_id = s.id"
    };
}
pub(crate) use issue_select;

/// Column that issue lists are ordered by (always newest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueOrder {
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl IssueOrder {
    /// `"createdAt"` selects creation order; anything else means update order.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("createdAt") => IssueOrder::CreatedAt,
            _ => IssueOrder::UpdatedAt,
        }
    }

    fn clause(self) -> &'static str {
        match self {
            IssueOrder::CreatedAt => "ORDER BY i.created_at DESC, i.id ASC",
            IssueOrder::UpdatedAt => "ORDER BY i.updated_at DESC, i.id ASC",
        }
    }
}

/// Raw issue filters as supplied by a client.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub team: Option<String>,
    pub project: Option<String>,
    pub assignee: Option<String>,
    /// Status id, name, or type.
    pub state: Option<String>,
    pub label: Option<String>,
    /// Substring matched against title and description.
    pub query: Option<String>,
    pub order_by: IssueOrder,
    pub limit: Option<i64>,
    pub include_archived: bool,
}

/// Issue filters with every entity token replaced by its id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedIssueFilter {
    pub team_id: Option<Id>,
    pub project_id: Option<Id>,
    pub assignee_id: Option<Id>,
    pub state: Option<String>,
    pub label_id: Option<Id>,
    pub query: Option<String>,
    pub order_by: IssueOrder,
    pub limit: Option<i64>,
    pub include_archived: bool,
}

impl IssueFilter {
    /// Resolve entity tokens. Project and label lookups are scoped to the
    /// resolved team when one is given.
    pub async fn resolve<R: IdResolver>(
        &self,
        resolver: &R,
        policy: UnresolvedFilterPolicy,
    ) -> DbResult<ResolvedIssueFilter> {
        let team_id = resolve_filter(
            resolver,
            EntityKind::Team,
            self.team.as_deref(),
            None,
            policy,
        )
        .await?;
        let scope = team_id.as_deref();
        let project_id = resolve_filter(
            resolver,
            EntityKind::Project,
            self.project.as_deref(),
            scope,
            policy,
        )
        .await?;
        let assignee_id = resolve_filter(
            resolver,
            EntityKind::User,
            self.assignee.as_deref(),
            None,
            policy,
        )
        .await?;
        let label_id = resolve_filter(
            resolver,
            EntityKind::Label,
            self.label.as_deref(),
            scope,
            policy,
        )
        .await?;

        Ok(ResolvedIssueFilter {
            team_id,
            project_id,
            assignee_id,
            state: non_empty(self.state.as_deref()).map(str::to_string),
            label_id,
            query: non_empty(self.query.as_deref()).map(str::to_string),
            order_by: self.order_by,
            limit: positive(self.limit),
            include_archived: self.include_archived,
        })
    }
}

impl ResolvedIssueFilter {
    pub fn compose(&self) -> ComposedQuery {
        let mut q = ComposedQuery::new(concat!(issue_select!(), " WHERE 1=1"));
        if let Some(team_id) = &self.team_id {
            q.and("i.team_id = ?", [team_id.as_str()]);
        }
        if let Some(project_id) = &self.project_id {
            q.and("i.project_id = ?", [project_id.as_str()]);
        }
        if let Some(assignee_id) = &self.assignee_id {
            q.and("i.assignee_id = ?", [assignee_id.as_str()]);
        }
        if let Some(state) = &self.state {
            q.and(
                "(s.id = ? OR s.name = ? OR s.type = ?)",
                [state.as_str(), state.as_str(), state.as_str()],
            );
        }
        if let Some(label_id) = &self.label_id {
            q.and(
                "i.id IN (SELECT issue_id FROM issue_labels WHERE label_id = ?)",
                [label_id.as_str()],
            );
        }
        if let Some(text) = &self.query {
            let pattern = contains_pattern(text);
            q.and(
                "(i.title LIKE ? OR i.description LIKE ?)",
                [pattern.clone(), pattern],
            );
        }
        if !self.include_archived {
            q.and("i.archived_at IS NULL", std::iter::empty::<&str>());
        }
        q.push_static(self.order_by.clause());
        q.limit(self.limit);
        q
    }
}

// =============================================================================
// Projects
// =============================================================================

/// Raw project filters as supplied by a client.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub team: Option<String>,
    pub state: Option<String>,
    /// Substring matched against the project name.
    pub query: Option<String>,
    /// Project lead.
    pub member: Option<String>,
    pub limit: Option<i64>,
    pub include_archived: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedProjectFilter {
    pub team_id: Option<Id>,
    pub state: Option<String>,
    pub query: Option<String>,
    pub lead_id: Option<Id>,
    pub limit: Option<i64>,
    pub include_archived: bool,
}

impl ProjectFilter {
    pub async fn resolve<R: IdResolver>(
        &self,
        resolver: &R,
        policy: UnresolvedFilterPolicy,
    ) -> DbResult<ResolvedProjectFilter> {
        let team_id = resolve_filter(
            resolver,
            EntityKind::Team,
            self.team.as_deref(),
            None,
            policy,
        )
        .await?;
        let lead_id = resolve_filter(
            resolver,
            EntityKind::User,
            self.member.as_deref(),
            None,
            policy,
        )
        .await?;
        Ok(ResolvedProjectFilter {
            team_id,
            state: non_empty(self.state.as_deref()).map(str::to_string),
            query: non_empty(self.query.as_deref()).map(str::to_string),
            lead_id,
            limit: positive(self.limit),
            include_archived: self.include_archived,
        })
    }
}

impl ResolvedProjectFilter {
    pub fn compose(&self) -> ComposedQuery {
        let mut q = ComposedQuery::new(
            "SELECT p.*, t.name AS team_name, u.name AS lead_name FROM projects p \
             LEFT JOIN teams t ON p.team_id = t.id \
             LEFT JOIN users u ON p.lead_id = u.id WHERE 1=1",
        );
        if let Some(team_id) = &self.team_id {
            q.and("p.team_id = ?", [team_id.as_str()]);
        }
        if let Some(state) = &self.state {
            q.and("p.status = ?", [state.as_str()]);
        }
        if let Some(text) = &self.query {
            q.and("p.name LIKE ?", [contains_pattern(text)]);
        }
        if let Some(lead_id) = &self.lead_id {
            q.and("p.lead_id = ?", [lead_id.as_str()]);
        }
        if !self.include_archived {
            q.and(
                "(p.status != 'archived' OR p.status IS NULL)",
                std::iter::empty::<&str>(),
            );
        }
        q.push_static("ORDER BY p.updated_at DESC, p.id ASC");
        q.limit(self.limit);
        q
    }
}

// =============================================================================
// Teams, users, labels, cycles
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamFilter {
    /// Substring matched against name and key.
    pub query: Option<String>,
    pub limit: Option<i64>,
    pub include_archived: bool,
}

impl TeamFilter {
    pub fn compose(&self) -> ComposedQuery {
        let mut q = ComposedQuery::new("SELECT * FROM teams WHERE name IS NOT NULL");
        if let Some(text) = non_empty(self.query.as_deref()) {
            let pattern = contains_pattern(text);
            q.and("(name LIKE ? OR key LIKE ?)", [pattern.clone(), pattern]);
        }
        if !self.include_archived {
            q.and("archived_at IS NULL", std::iter::empty::<&str>());
        }
        q.push_static("ORDER BY updated_at DESC, id ASC");
        q.limit(positive(self.limit));
        q
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    /// Substring matched against name and email.
    pub query: Option<String>,
    pub limit: Option<i64>,
}

impl UserFilter {
    pub fn compose(&self) -> ComposedQuery {
        let mut q = ComposedQuery::new("SELECT * FROM users WHERE 1=1");
        if let Some(text) = non_empty(self.query.as_deref()) {
            let pattern = contains_pattern(text);
            q.and("(name LIKE ? OR email LIKE ?)", [pattern.clone(), pattern]);
        }
        q.push_static("ORDER BY name ASC, id ASC");
        q.limit(positive(self.limit));
        q
    }
}

pub const DEFAULT_LABEL_LIMIT: i64 = 50;

#[derive(Debug, Clone, Default)]
pub struct LabelFilter {
    pub team: Option<String>,
    /// Substring matched against the label name.
    pub name: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedLabelFilter {
    pub team_id: Option<Id>,
    pub name: Option<String>,
    pub limit: Option<i64>,
}

impl LabelFilter {
    pub async fn resolve<R: IdResolver>(
        &self,
        resolver: &R,
        policy: UnresolvedFilterPolicy,
    ) -> DbResult<ResolvedLabelFilter> {
        let team_id = resolve_filter(
            resolver,
            EntityKind::Team,
            self.team.as_deref(),
            None,
            policy,
        )
        .await?;
        Ok(ResolvedLabelFilter {
            team_id,
            name: non_empty(self.name.as_deref()).map(str::to_string),
            limit: positive(self.limit),
        })
    }
}

impl ResolvedLabelFilter {
    pub fn compose(&self) -> ComposedQuery {
        let mut q = ComposedQuery::new("SELECT * FROM labels WHERE 1=1");
        if let Some(team_id) = &self.team_id {
            // Team labels plus workspace-wide labels.
            q.and("(team_id = ? OR team_id IS NULL)", [team_id.as_str()]);
        }
        if let Some(name) = &self.name {
            q.and("name LIKE ?", [contains_pattern(name)]);
        }
        q.push_static("ORDER BY name ASC, id ASC");
        q.limit(Some(self.limit.unwrap_or(DEFAULT_LABEL_LIMIT)));
        q
    }
}

/// Which cycles of a team to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleType {
    Current,
    Previous,
    Next,
}

impl CycleType {
    pub fn from_param(value: Option<&str>) -> Option<Self> {
        match value? {
            "current" => Some(CycleType::Current),
            "previous" => Some(CycleType::Previous),
            "next" => Some(CycleType::Next),
            _ => None,
        }
    }

    fn status(self) -> &'static str {
        match self {
            CycleType::Current => "current",
            CycleType::Previous => "previous",
            CycleType::Next => "next",
        }
    }
}

/// Cycle filters; the team is already resolved because it is required.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleFilter {
    pub team_id: Id,
    pub cycle_type: Option<CycleType>,
}

impl CycleFilter {
    pub fn compose(&self) -> ComposedQuery {
        let mut q = ComposedQuery::new("SELECT * FROM cycles WHERE 1=1");
        q.and("team_id = ?", [self.team_id.as_str()]);
        if let Some(cycle_type) = self.cycle_type {
            q.and("status = ?", [cycle_type.status()]);
        }
        q.push_static("ORDER BY start_date DESC, id ASC");
        q
    }
}
