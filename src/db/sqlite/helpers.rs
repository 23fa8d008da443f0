//! Row mapping shared by the SQLite repositories.

use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::db::{Comment, Cycle, Issue, IssueStatus, Label, Milestone, Project, Team, User};

pub fn row_to_user(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        avatar_url: row.get("avatar_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub fn row_to_team(row: &SqliteRow) -> Team {
    Team {
        id: row.get("id"),
        name: row.get("name"),
        key: row.get("key"),
        icon: row.get("icon"),
        color: row.get("color"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        archived_at: row.get("archived_at"),
    }
}

pub fn row_to_status(row: &SqliteRow) -> IssueStatus {
    IssueStatus {
        id: row.get("id"),
        status_type: row.get("type"),
        name: row.get("name"),
        color: row.get("color"),
        position: row.get("position"),
        team_id: row.get("team_id"),
    }
}

/// Expects the `team_name` and `lead_name` join columns.
pub fn row_to_project(row: &SqliteRow) -> Project {
    Project {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        icon: row.get("icon"),
        color: row.get("color"),
        status: row.get("status"),
        priority: row.get("priority"),
        lead_id: row.get("lead_id"),
        team_id: row.get("team_id"),
        start_date: row.get("start_date"),
        target_date: row.get("target_date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        team_name: row.get("team_name"),
        lead_name: row.get("lead_name"),
    }
}

pub fn row_to_milestone(row: &SqliteRow) -> Milestone {
    Milestone {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        target_date: row.get("target_date"),
        status: row.get("status"),
        project_id: row.get("project_id"),
        created_at: row.get("created_at"),
    }
}

pub fn row_to_cycle(row: &SqliteRow) -> Cycle {
    Cycle {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        status: row.get("status"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        team_id: row.get("team_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub fn row_to_label(row: &SqliteRow) -> Label {
    Label {
        id: row.get("id"),
        name: row.get("name"),
        color: row.get("color"),
        description: row.get("description"),
        team_id: row.get("team_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Expects the columns selected by `issue_select!`.
pub fn row_to_issue(row: &SqliteRow) -> Issue {
    Issue {
        id: row.get("id"),
        identifier: row.get("identifier"),
        title: row.get("title"),
        description: row.get("description"),
        priority_id: row.get("priority_id"),
        priority_value: row.get("priority_value"),
        status_id: row.get("status_id"),
        project_id: row.get("project_id"),
        team_id: row.get("team_id"),
        assignee_id: row.get("assignee_id"),
        creator_id: row.get("creator_id"),
        cycle_id: row.get("cycle_id"),
        estimate: row.get("estimate"),
        due_date: row.get("due_date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        archived_at: row.get("archived_at"),
        completed_at: row.get("completed_at"),
        canceled_at: row.get("canceled_at"),
        assignee_name: row.get("assignee_name"),
        project_name: row.get("project_name"),
        team_name: row.get("team_name"),
        status_name: row.get("status_name"),
        status_type: row.get("status_type"),
    }
}

/// Expects the `user_name` and `user_email` join columns.
pub fn row_to_comment(row: &SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        body: row.get("body"),
        issue_id: row.get("issue_id"),
        user_id: row.get("user_id"),
        parent_id: row.get("parent_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        user_name: row.get("user_name"),
        user_email: row.get("user_email"),
    }
}
