//! MCP tools for cycles (time-boxed iterations of a team).

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

use crate::db::{CycleType, CycleUpdate, NewCycle, SqliteDatabase};
use crate::mcp::tools::respond;

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListCyclesParams {
    #[schemars(description = "Team id, key or name")]
    pub team: String,
    #[serde(rename = "type")]
    #[schemars(description = "Which cycles: 'current', 'previous' or 'next'. Omit for all.")]
    pub cycle_type: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetCycleParams {
    #[schemars(description = "Cycle id or name")]
    pub id: String,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCycleParams {
    #[schemars(description = "Team id, key or name")]
    pub team: String,
    pub name: String,
    pub description: Option<String>,
    #[schemars(description = "Start date (YYYY-MM-DD)")]
    pub start_date: String,
    #[schemars(description = "End date (YYYY-MM-DD)")]
    pub end_date: String,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCycleParams {
    #[schemars(description = "Cycle id or name")]
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[schemars(description = "Cycle status: 'upcoming', 'current', 'previous' ...")]
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct DeleteCycleParams {
    #[schemars(description = "Cycle id or name")]
    pub id: String,
}

#[derive(Clone)]
pub struct CycleTools {
    db: Arc<SqliteDatabase>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CycleTools {
    pub fn new(db: Arc<SqliteDatabase>) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    pub fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    #[tool(description = "List a team's cycles, newest first.")]
    pub async fn list_cycles(
        &self,
        Parameters(params): Parameters<ListCyclesParams>,
    ) -> Result<CallToolResult, McpError> {
        let cycle_type = CycleType::from_param(params.cycle_type.as_deref());
        respond(self.db.cycles().list(&params.team, cycle_type).await)
    }

    #[tool(description = "Get a cycle by id or name.")]
    pub async fn get_cycle(
        &self,
        Parameters(params): Parameters<GetCycleParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.db.cycles().get(&params.id).await)
    }

    #[tool(description = "Create an upcoming cycle for a team.")]
    pub async fn create_cycle(
        &self,
        Parameters(params): Parameters<CreateCycleParams>,
    ) -> Result<CallToolResult, McpError> {
        let cycle = NewCycle {
            team: params.team,
            name: params.name,
            description: params.description,
            start_date: params.start_date,
            end_date: params.end_date,
        };
        respond(self.db.cycles().create(&cycle).await)
    }

    #[tool(description = "Update a cycle.")]
    pub async fn update_cycle(
        &self,
        Parameters(params): Parameters<UpdateCycleParams>,
    ) -> Result<CallToolResult, McpError> {
        let update = CycleUpdate {
            name: params.name,
            description: params.description,
            status: params.status,
            start_date: params.start_date,
            end_date: params.end_date,
        };
        respond(self.db.cycles().update(&params.id, &update).await)
    }

    #[tool(description = "Delete a cycle.")]
    pub async fn delete_cycle(
        &self,
        Parameters(params): Parameters<DeleteCycleParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self.db.cycles().delete(&params.id).await;
        respond(result.map(|id| json!({ "id": id, "deleted": true })))
    }
}
