//! MCP tools for projects and milestones.

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

use crate::db::{DbError, NewMilestone, NewProject, ProjectFilter, ProjectUpdate, SqliteDatabase};
use crate::mcp::tools::respond;

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectsParams {
    #[schemars(description = "Team id, key or name")]
    pub team: Option<String>,
    #[schemars(description = "Project state (e.g. 'started', 'completed')")]
    pub state: Option<String>,
    #[schemars(description = "Text matched against the project name")]
    pub query: Option<String>,
    #[schemars(description = "Project lead id, email, name, or 'me'")]
    pub member: Option<String>,
    pub limit: Option<i64>,
    #[schemars(description = "Include archived projects (default: false)")]
    pub include_archived: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetProjectParams {
    #[schemars(description = "Project id or name")]
    pub query: String,
    #[schemars(description = "Include the project's milestones")]
    pub include_milestones: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateProjectParams {
    pub name: String,
    #[schemars(description = "Team id, key or name")]
    pub team: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    #[schemars(description = "Project state (default: 'started')")]
    pub state: Option<String>,
    pub priority: Option<i64>,
    #[schemars(description = "Project lead id, email, name, or 'me'")]
    pub lead: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateProjectParams {
    #[schemars(description = "Project id or name")]
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub state: Option<String>,
    #[schemars(description = "Project lead id, email, name, or 'me'. Null clears the lead.")]
    #[schemars(with = "Option<String>")]
    #[serde(
        default,
        deserialize_with = "crate::serde_utils::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub lead: Option<Option<String>>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListMilestonesParams {
    #[schemars(description = "Project id or name")]
    pub project: String,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateMilestoneParams {
    #[schemars(description = "Project id or name")]
    pub project: String,
    pub name: String,
    pub description: Option<String>,
    #[schemars(description = "Target date (YYYY-MM-DD)")]
    pub target_date: Option<String>,
}

#[derive(Clone)]
pub struct ProjectTools {
    db: Arc<SqliteDatabase>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ProjectTools {
    pub fn new(db: Arc<SqliteDatabase>) -> Self {
        Self {
            db,
            tool_router: Self::tool_router(),
        }
    }

    pub fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    #[tool(description = "List projects. Filter by team, state, lead or name.")]
    pub async fn list_projects(
        &self,
        Parameters(params): Parameters<ListProjectsParams>,
    ) -> Result<CallToolResult, McpError> {
        let filter = ProjectFilter {
            team: params.team,
            state: params.state,
            query: params.query,
            member: params.member,
            limit: params.limit,
            include_archived: params.include_archived.unwrap_or(false),
        };
        respond(self.db.projects().list(&filter).await)
    }

    #[tool(description = "Get a project by id or name.")]
    pub async fn get_project(
        &self,
        Parameters(params): Parameters<GetProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            self.db
                .projects()
                .get(&params.query, params.include_milestones.unwrap_or(false))
                .await,
        )
    }

    #[tool(description = "Create a project in a team.")]
    pub async fn create_project(
        &self,
        Parameters(params): Parameters<CreateProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        let project = NewProject {
            name: params.name,
            team: params.team,
            description: params.description,
            icon: params.icon,
            color: params.color,
            state: params.state,
            priority: params.priority,
            lead: params.lead,
        };
        respond(self.db.projects().create(&project).await)
    }

    #[tool(description = "Update a project. Only the given fields change.")]
    pub async fn update_project(
        &self,
        Parameters(params): Parameters<UpdateProjectParams>,
    ) -> Result<CallToolResult, McpError> {
        let update = ProjectUpdate {
            name: params.name,
            description: params.description,
            state: params.state,
            lead: params.lead,
        };
        let result = self
            .db
            .projects()
            .update(&params.id, &update)
            .await
            .and_then(|updated| updated.ok_or_else(|| DbError::validation("No updates provided")));
        respond(result)
    }

    #[tool(description = "List a project's milestones by target date.")]
    pub async fn list_milestones(
        &self,
        Parameters(params): Parameters<ListMilestonesParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.db.projects().milestones(&params.project).await)
    }

    #[tool(description = "Add a milestone to a project.")]
    pub async fn create_milestone(
        &self,
        Parameters(params): Parameters<CreateMilestoneParams>,
    ) -> Result<CallToolResult, McpError> {
        let milestone = NewMilestone {
            name: params.name,
            description: params.description,
            target_date: params.target_date,
        };
        respond(
            self.db
                .projects()
                .create_milestone(&params.project, &milestone)
                .await,
        )
    }
}
