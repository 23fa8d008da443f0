//! MCP tools for issue comments.

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

use crate::db::{SqliteDatabase};
use crate::mcp::tools::respond;

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsParams {
    #[schemars(description = "Issue id or identifier")]
    pub issue_id: String,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentParams {
    #[schemars(description = "Issue id or identifier")]
    pub issue_id: String,
    #[schemars(description = "Markdown comment body")]
    pub body: String,
    #[schemars(description = "Comment id to reply to")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateCommentParams {
    pub id: String,
    pub body: String,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct DeleteCommentParams {
    pub id: String,
}

#[derive(Clone)]
pub struct CommentTools {
    db: Arc<SqliteDatabase>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CommentTools {
    pub fn new(db: Arc<SqliteDatabase>) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    pub fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    #[tool(description = "List comments on an issue, oldest first.")]
    pub async fn list_comments(
        &self,
        Parameters(params): Parameters<ListCommentsParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.db.comments().list(&params.issue_id).await)
    }

    #[tool(description = "Comment on an issue as yourself. Provide parentId to reply.")]
    pub async fn create_comment(
        &self,
        Parameters(params): Parameters<CreateCommentParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            self.db
                .comments()
                .create(&params.issue_id, &params.body, params.parent_id.as_deref())
                .await,
        )
    }

    #[tool(description = "Replace a comment's body.")]
    pub async fn update_comment(
        &self,
        Parameters(params): Parameters<UpdateCommentParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.db.comments().update(&params.id, &params.body).await)
    }

    #[tool(description = "Delete a comment.")]
    pub async fn delete_comment(
        &self,
        Parameters(params): Parameters<DeleteCommentParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self.db.comments().delete(&params.id).await;
        respond(result.map(|id| json!({ "id": id, "deleted": true })))
    }
}
