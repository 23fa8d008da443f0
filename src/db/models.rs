//! Domain models for the tracker database.
//!
//! These mirror the tables created by the bundled schema script. Joined
//! display columns (team name, assignee name, ...) are carried as optional
//! fields so list and detail reads share one row shape.

use serde::{Deserialize, Serialize};

/// Opaque text identifier used for every entity.
pub type Id = String;

// =============================================================================
// Entity kinds
// =============================================================================

/// Kinds of entity an identifier can be resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Team,
    User,
    Project,
    Issue,
    Label,
    Cycle,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Team,
        EntityKind::User,
        EntityKind::Project,
        EntityKind::Issue,
        EntityKind::Label,
        EntityKind::Cycle,
    ];

    /// Table holding rows of this kind.
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Team => "teams",
            EntityKind::User => "users",
            EntityKind::Project => "projects",
            EntityKind::Issue => "issues",
            EntityKind::Label => "labels",
            EntityKind::Cycle => "cycles",
        }
    }

    /// Human-facing columns that identify a row besides its id.
    pub fn alternate_keys(self) -> &'static [&'static str] {
        match self {
            EntityKind::Team => &["name", "key"],
            EntityKind::User => &["email", "name"],
            EntityKind::Project => &["name"],
            EntityKind::Issue => &["identifier"],
            EntityKind::Label => &["name"],
            EntityKind::Cycle => &["name"],
        }
    }

    /// Parent column that scopes alternate keys, if any.
    pub fn scope_column(self) -> Option<&'static str> {
        match self {
            EntityKind::Project | EntityKind::Label | EntityKind::Cycle => Some("team_id"),
            EntityKind::Team | EntityKind::User | EntityKind::Issue => None,
        }
    }

    /// Prefix for generated ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            EntityKind::Team => "team",
            EntityKind::User => "user",
            EntityKind::Project => "proj",
            EntityKind::Issue => "issue",
            EntityKind::Label => "label",
            EntityKind::Cycle => "cycle",
        }
    }

    /// Display name used in error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            EntityKind::Team => "Team",
            EntityKind::User => "User",
            EntityKind::Project => "Project",
            EntityKind::Issue => "Issue",
            EntityKind::Label => "Label",
            EntityKind::Cycle => "Cycle",
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: Id,
    pub name: String,
    /// Short uppercase code used in issue identifiers (e.g. `ENG`).
    pub key: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub archived_at: Option<String>,
}

/// Workflow state an issue can be in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueStatus {
    pub id: Id,
    /// One of backlog, unstarted, started, completed, canceled.
    #[serde(rename = "type")]
    pub status_type: String,
    pub name: String,
    pub color: Option<String>,
    pub position: i64,
    pub team_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub status: Option<String>,
    pub priority: i64,
    pub lead_id: Option<Id>,
    pub team_id: Option<Id>,
    pub start_date: Option<String>,
    pub target_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub target_date: Option<String>,
    pub status: Option<String>,
    pub project_id: Id,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: Id,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub team_id: Option<Id>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: Id,
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
    /// `None` for workspace-wide labels.
    pub team_id: Option<Id>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: Id,
    /// Human-readable `<TEAM-KEY>-<N>` code.
    pub identifier: String,
    pub title: String,
    pub description: Option<String>,
    pub priority_id: Option<Id>,
    pub priority_value: i64,
    pub status_id: Option<Id>,
    pub project_id: Option<Id>,
    pub team_id: Option<Id>,
    pub assignee_id: Option<Id>,
    pub creator_id: Option<Id>,
    pub cycle_id: Option<Id>,
    pub estimate: Option<f64>,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub archived_at: Option<String>,
    pub completed_at: Option<String>,
    pub canceled_at: Option<String>,
    pub assignee_name: Option<String>,
    pub project_name: Option<String>,
    pub team_name: Option<String>,
    pub status_name: Option<String>,
    pub status_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub body: String,
    pub issue_id: Id,
    pub user_id: Option<Id>,
    pub parent_id: Option<Id>,
    pub created_at: String,
    pub updated_at: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Kinds of issue-to-issue links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Blocks,
    Related,
}

impl RelationType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Blocks => "blocks",
            RelationType::Related => "related",
        }
    }
}

/// An issue with its labels, comments and (optionally) its relations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueDetail {
    #[serde(flatten)]
    pub issue: Issue,
    pub labels: Vec<Label>,
    pub comments: Vec<Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Issue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<Vec<Issue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<Vec<Issue>>,
}

/// A project with its milestones when requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestones: Option<Vec<Milestone>>,
}

/// Map a numeric priority to the seeded priority row id.
///
/// `0` (and anything outside 1..=4 that is not positive) means no priority.
pub fn priority_id(value: i64) -> Option<&'static str> {
    match value {
        v if v <= 0 => None,
        1 => Some("prio_urgent"),
        2 => Some("prio_high"),
        4 => Some("prio_low"),
        _ => Some("prio_normal"),
    }
}

// =============================================================================
// Inputs
// =============================================================================
//
// Association fields hold client tokens (id, name, key, email, identifier or
// "me") and are resolved by the repositories.

#[derive(Debug, Clone, Default)]
pub struct NewTeam {
    pub name: String,
    pub key: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub team: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub state: Option<String>,
    pub priority: Option<i64>,
    pub lead: Option<String>,
}

/// `Some(None)` on a nullable field clears it.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub state: Option<String>,
    pub lead: Option<Option<String>>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.state.is_none()
            && self.lead.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewMilestone {
    pub name: String,
    pub description: Option<String>,
    pub target_date: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub title: String,
    pub team: String,
    pub description: Option<String>,
    pub project: Option<String>,
    pub assignee: Option<String>,
    /// 0 (none) to 4 (low).
    pub priority: Option<i64>,
    /// Status id, name, or type within the team.
    pub state: Option<String>,
    pub labels: Vec<String>,
    pub estimate: Option<f64>,
    pub due_date: Option<String>,
    /// Issues this issue blocks.
    pub blocks: Vec<String>,
    /// Issues blocking this issue.
    pub blocked_by: Vec<String>,
    pub related_to: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` unassigns.
    pub assignee: Option<Option<String>>,
    pub priority: Option<i64>,
    pub state: Option<String>,
    /// Replaces the whole label set when present.
    pub labels: Option<Vec<String>>,
    pub estimate: Option<f64>,
    pub due_date: Option<String>,
}

impl IssueUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assignee.is_none()
            && self.priority.is_none()
            && self.state.is_none()
            && self.labels.is_none()
            && self.estimate.is_none()
            && self.due_date.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewLabel {
    pub name: String,
    /// Absent for a workspace-wide label.
    pub team: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LabelUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCycle {
    pub team: String,
    pub name: String,
    pub description: Option<String>,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default)]
pub struct CycleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
