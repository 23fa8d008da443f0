//! MCP tool implementations
//!
//! Tools are grouped by entity type. Each group owns its parameter structs
//! and one `#[tool]` method per tool; its `ToolRouter` supplies the
//! definitions for `tools/list`.
//!
//! Every tool answers with a single text content holding a JSON envelope:
//! `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`.

mod comments;
mod cycles;
mod issues;
mod labels;
mod projects;
mod teams;
mod users;

#[cfg(test)]
mod projects_test;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

use crate::db::DbResult;

pub use comments::{
    CommentTools, CreateCommentParams, DeleteCommentParams, ListCommentsParams,
    UpdateCommentParams,
};
pub use cycles::{
    CreateCycleParams, CycleTools, DeleteCycleParams, GetCycleParams, ListCyclesParams,
    UpdateCycleParams,
};
pub use issues::{
    CreateIssueParams, DeleteIssueParams, GetIssueParams, IssueTools, ListIssuesParams,
    UpdateIssueParams,
};
pub use labels::{
    CreateLabelParams, DeleteLabelParams, LabelTools, ListLabelsParams, UpdateLabelParams,
};
pub use projects::{
    CreateMilestoneParams, CreateProjectParams, GetProjectParams, ListMilestonesParams,
    ListProjectsParams, ProjectTools, UpdateProjectParams,
};
pub use teams::{CreateTeamParams, GetTeamParams, ListStatusesParams, ListTeamsParams, TeamTools};
pub use users::{GetUserParams, ListUsersParams, UserTools};

fn envelope(value: Value) -> Vec<Content> {
    let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    vec![Content::text(text)]
}

/// Successful envelope around `data`.
pub fn success<T: Serialize>(data: &T) -> Result<CallToolResult, McpError> {
    let data = serde_json::to_value(data).map_err(|e| {
        McpError::internal_error(
            "serialization_error",
            Some(json!({"error": e.to_string()})),
        )
    })?;
    Ok(CallToolResult::success(envelope(json!({
        "success": true,
        "data": data,
    }))))
}

/// Failed envelope for an expected outcome (not found, validation).
pub fn failure(message: impl Into<String>) -> CallToolResult {
    CallToolResult::success(envelope(json!({
        "success": false,
        "error": message.into(),
    })))
}

/// Failed envelope flagged as a tool error, for store failures.
pub fn error_result(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(envelope(json!({
        "success": false,
        "error": message.into(),
    })))
}

/// Turn a repository result into an envelope.
///
/// Expected failures (not found, duplicates, validation) become a failed
/// envelope; other store errors are logged and flagged `isError`.
pub fn respond<T: Serialize>(result: DbResult<T>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(data) => success(&data),
        Err(e) if e.is_expected() => Ok(failure(e.to_string())),
        Err(e) => {
            error!(error = %e, "Tool call failed");
            Ok(error_result(e.to_string()))
        }
    }
}
