//! MCP tools for teams and their workflow statuses.

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

use crate::db::{NewTeam, SqliteDatabase, TeamFilter};
use crate::mcp::tools::respond;

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListTeamsParams {
    #[schemars(description = "Text matched against team name and key")]
    pub query: Option<String>,
    pub limit: Option<i64>,
    #[schemars(description = "Include archived teams (default: false)")]
    pub include_archived: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetTeamParams {
    #[schemars(description = "Team id, key or name")]
    pub query: String,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateTeamParams {
    pub name: String,
    #[schemars(description = "2-5 uppercase letters used in issue identifiers (e.g. ENG)")]
    pub key: String,
    #[schemars(description = "Hex color (default: #5e6ad2)")]
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListStatusesParams {
    #[schemars(description = "Team id, key or name")]
    pub team: String,
}

#[derive(Clone)]
pub struct TeamTools {
    db: Arc<SqliteDatabase>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl TeamTools {
    pub fn new(db: Arc<SqliteDatabase>) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    pub fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    #[tool(description = "List teams.")]
    pub async fn list_teams(
        &self,
        Parameters(params): Parameters<ListTeamsParams>,
    ) -> Result<CallToolResult, McpError> {
        let filter = TeamFilter {
            query: params.query,
            limit: params.limit,
            include_archived: params.include_archived.unwrap_or(false),
        };
        respond(self.db.teams().list(&filter).await)
    }

    #[tool(description = "Get a team by id, key or name.")]
    pub async fn get_team(
        &self,
        Parameters(params): Parameters<GetTeamParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.db.teams().get(&params.query).await)
    }

    #[tool(description = "Create a team. Its workflow statuses are created with it.")]
    pub async fn create_team(
        &self,
        Parameters(params): Parameters<CreateTeamParams>,
    ) -> Result<CallToolResult, McpError> {
        let team = NewTeam {
            name: params.name,
            key: params.key,
            color: params.color,
            icon: params.icon,
        };
        respond(self.db.teams().create(&team).await)
    }

    #[tool(description = "List the workflow statuses available to a team's issues.")]
    pub async fn list_issue_statuses(
        &self,
        Parameters(params): Parameters<ListStatusesParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.db.teams().statuses(&params.team).await)
    }
}
