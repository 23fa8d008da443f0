//! MCP tools for issue labels.

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

use crate::db::{LabelFilter, LabelUpdate, NewLabel, SqliteDatabase};
use crate::mcp::tools::respond;

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListLabelsParams {
    #[schemars(description = "Team id, key or name. Workspace labels are always included.")]
    pub team: Option<String>,
    #[schemars(description = "Text matched against the label name")]
    pub name: Option<String>,
    #[schemars(description = "Maximum number of labels to return (default: 50)")]
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateLabelParams {
    pub name: String,
    #[schemars(description = "Team id, key or name. Omit for a workspace label.")]
    pub team: Option<String>,
    #[schemars(description = "Hex color (default: #bec2c8)")]
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateLabelParams {
    #[schemars(description = "Label id or name")]
    pub id: String,
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct DeleteLabelParams {
    #[schemars(description = "Label id or name")]
    pub id: String,
}

#[derive(Clone)]
pub struct LabelTools {
    db: Arc<SqliteDatabase>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl LabelTools {
    pub fn new(db: Arc<SqliteDatabase>) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    pub fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    #[tool(description = "List issue labels.")]
    pub async fn list_issue_labels(
        &self,
        Parameters(params): Parameters<ListLabelsParams>,
    ) -> Result<CallToolResult, McpError> {
        let filter = LabelFilter {
            team: params.team,
            name: params.name,
            limit: params.limit,
        };
        respond(self.db.labels().list(&filter).await)
    }

    #[tool(description = "Create an issue label.")]
    pub async fn create_issue_label(
        &self,
        Parameters(params): Parameters<CreateLabelParams>,
    ) -> Result<CallToolResult, McpError> {
        let label = NewLabel {
            name: params.name,
            team: params.team,
            color: params.color,
            description: params.description,
        };
        respond(self.db.labels().create(&label).await)
    }

    #[tool(description = "Rename or recolor a label.")]
    pub async fn update_issue_label(
        &self,
        Parameters(params): Parameters<UpdateLabelParams>,
    ) -> Result<CallToolResult, McpError> {
        let update = LabelUpdate {
            name: params.name,
            color: params.color,
        };
        respond(self.db.labels().update(&params.id, &update).await)
    }

    #[tool(description = "Delete a label and remove it from issues.")]
    pub async fn delete_issue_label(
        &self,
        Parameters(params): Parameters<DeleteLabelParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self.db.labels().delete(&params.id).await;
        respond(result.map(|id| json!({ "id": id, "deleted": true })))
    }
}
