//! MCP tools for users.

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

use crate::db::{SqliteDatabase, UserFilter};
use crate::mcp::tools::respond;

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListUsersParams {
    #[schemars(description = "Text matched against name and email")]
    pub query: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetUserParams {
    #[schemars(description = "User id, email, name, or 'me'")]
    pub query: String,
}

#[derive(Clone)]
pub struct UserTools {
    db: Arc<SqliteDatabase>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl UserTools {
    pub fn new(db: Arc<SqliteDatabase>) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    pub fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    #[tool(description = "List users.")]
    pub async fn list_users(
        &self,
        Parameters(params): Parameters<ListUsersParams>,
    ) -> Result<CallToolResult, McpError> {
        let filter = UserFilter {
            query: params.query,
            limit: params.limit,
        };
        respond(self.db.users().list(&filter).await)
    }

    #[tool(description = "Get a user. Use 'me' for yourself.")]
    pub async fn get_user(
        &self,
        Parameters(params): Parameters<GetUserParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.db.users().get(&params.query).await)
    }
}
