//! MCP tools for issues.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::CallToolResult,
    schemars,
    schemars::JsonSchema,
    tool, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::{DbError, IssueFilter, IssueOrder, IssueUpdate, NewIssue, SqliteDatabase};
use crate::mcp::tools::respond;

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListIssuesParams {
    #[schemars(description = "Team id, key or name")]
    pub team: Option<String>,
    #[schemars(description = "Project id or name")]
    pub project: Option<String>,
    #[schemars(description = "Assignee id, email, name, or 'me'")]
    pub assignee: Option<String>,
    #[schemars(description = "Status name or type (e.g. 'In Progress', 'completed')")]
    pub state: Option<String>,
    #[schemars(description = "Label id or name")]
    pub label: Option<String>,
    #[schemars(description = "Text matched against title and description")]
    pub query: Option<String>,
    #[schemars(description = "Sort order: 'createdAt' or 'updatedAt' (default)")]
    pub order_by: Option<String>,
    #[schemars(description = "Maximum number of issues to return")]
    pub limit: Option<i64>,
    #[schemars(description = "Include archived issues (default: false)")]
    pub include_archived: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetIssueParams {
    #[schemars(description = "Issue id or identifier (e.g. ENG-12)")]
    pub id: String,
    #[schemars(description = "Include blocking, blocked-by and related issues")]
    pub include_relations: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateIssueParams {
    #[schemars(description = "Issue title")]
    pub title: String,
    #[schemars(description = "Team id, key or name")]
    pub team: String,
    #[schemars(description = "Markdown description")]
    pub description: Option<String>,
    #[schemars(description = "Project id or name")]
    pub project: Option<String>,
    #[schemars(description = "Assignee id, email, name, or 'me'")]
    pub assignee: Option<String>,
    #[schemars(description = "Priority: 0 none, 1 urgent, 2 high, 3 normal, 4 low")]
    pub priority: Option<i64>,
    #[schemars(description = "Status id, name or type within the team")]
    pub state: Option<String>,
    #[schemars(description = "Label ids or names")]
    pub labels: Option<Vec<String>>,
    #[schemars(description = "Estimate in points")]
    pub estimate: Option<f64>,
    #[schemars(description = "Due date (YYYY-MM-DD)")]
    pub due_date: Option<String>,
    #[schemars(description = "Issues this issue blocks")]
    pub blocks: Option<Vec<String>>,
    #[schemars(description = "Issues blocking this issue")]
    pub blocked_by: Option<Vec<String>>,
    #[schemars(description = "Related issues")]
    pub related_to: Option<Vec<String>>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateIssueParams {
    #[schemars(description = "Issue id or identifier")]
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[schemars(description = "Assignee id, email, name, or 'me'. Null unassigns.")]
    #[schemars(with = "Option<String>")]
    #[serde(
        default,
        deserialize_with = "crate::serde_utils::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee: Option<Option<String>>,
    #[schemars(description = "Priority: 0 none, 1 urgent, 2 high, 3 normal, 4 low")]
    pub priority: Option<i64>,
    #[schemars(description = "Status id, name or type within the team")]
    pub state: Option<String>,
    #[schemars(description = "Label ids or names. Replaces all existing labels.")]
    pub labels: Option<Vec<String>>,
    pub estimate: Option<f64>,
    #[schemars(description = "Due date (YYYY-MM-DD)")]
    pub due_date: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct DeleteIssueParams {
    #[schemars(description = "Issue id or identifier")]
    pub id: String,
}

// =============================================================================
// Issue Tools
// =============================================================================

#[derive(Clone)]
pub struct IssueTools {
    db: Arc<SqliteDatabase>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl IssueTools {
    pub fn new(db: Arc<SqliteDatabase>) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    pub fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    #[tool(
        description = "List issues. Filter by team, project, assignee ('me' for yourself), state, label or text."
    )]
    pub async fn list_issues(
        &self,
        Parameters(params): Parameters<ListIssuesParams>,
    ) -> Result<CallToolResult, McpError> {
        let filter = IssueFilter {
            team: params.team,
            project: params.project,
            assignee: params.assignee,
            state: params.state,
            label: params.label,
            query: params.query,
            order_by: IssueOrder::from_param(params.order_by.as_deref()),
            limit: params.limit,
            include_archived: params.include_archived.unwrap_or(false),
        };
        respond(self.db.issues().list(&filter).await)
    }

    #[tool(description = "Get an issue by id or identifier (e.g. ENG-12) with labels and comments.")]
    pub async fn get_issue(
        &self,
        Parameters(params): Parameters<GetIssueParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            self.db
                .issues()
                .get(&params.id, params.include_relations.unwrap_or(false))
                .await,
        )
    }

    #[tool(
        description = "Create an issue in a team. The identifier is numbered per team (ENG-1, ENG-2, ...)."
    )]
    pub async fn create_issue(
        &self,
        Parameters(params): Parameters<CreateIssueParams>,
    ) -> Result<CallToolResult, McpError> {
        let issue = NewIssue {
            title: params.title,
            team: params.team,
            description: params.description,
            project: params.project,
            assignee: params.assignee,
            priority: params.priority,
            state: params.state,
            labels: params.labels.unwrap_or_default(),
            estimate: params.estimate,
            due_date: params.due_date,
            blocks: params.blocks.unwrap_or_default(),
            blocked_by: params.blocked_by.unwrap_or_default(),
            related_to: params.related_to.unwrap_or_default(),
        };
        respond(self.db.issues().create(&issue).await)
    }

    #[tool(description = "Update an issue. Only the given fields change; labels replace the existing set.")]
    pub async fn update_issue(
        &self,
        Parameters(params): Parameters<UpdateIssueParams>,
    ) -> Result<CallToolResult, McpError> {
        let update = IssueUpdate {
            title: params.title,
            description: params.description,
            assignee: params.assignee,
            priority: params.priority,
            state: params.state,
            labels: params.labels,
            estimate: params.estimate,
            due_date: params.due_date,
        };
        let result = self
            .db
            .issues()
            .update(&params.id, &update)
            .await
            .and_then(|updated| updated.ok_or_else(|| DbError::validation("No updates provided")));
        respond(result)
    }

    #[tool(description = "Delete an issue with its labels, relations and comments.")]
    pub async fn delete_issue(
        &self,
        Parameters(params): Parameters<DeleteIssueParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self.db.issues().delete(&params.id).await;
        respond(result.map(|id| json!({ "id": id, "deleted": true })))
    }
}
