//! MCP request dispatcher
//!
//! Maps JSON-RPC methods onto the tool groups. Sessions and HTTP live in
//! `session` and `service`; this type is shared by every session and by
//! stateless calls.

use std::sync::Arc;

use rmcp::{
    handler::server::wrapper::Parameters,
    model::{CallToolResult, JsonObject, ServerCapabilities, ServerInfo, Tool},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::db::SqliteDatabase;

use super::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, JsonRpcRequest, JsonRpcResponse, METHOD_INITIALIZE,
    METHOD_NOT_FOUND, METHOD_PING, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, PROTOCOL_VERSION,
};
use super::tools::{
    CommentTools, CycleTools, IssueTools, LabelTools, ProjectTools, TeamTools, UserTools, failure,
};

pub const SERVER_NAME: &str = "tracker";

/// Protocol-level failures of a tool call.
#[derive(Error, Debug, PartialEq)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool {tool} failed: {message}")]
    Internal { tool: String, message: String },
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<JsonObject>,
}

fn parse<P: DeserializeOwned>(arguments: Option<JsonObject>) -> serde_json::Result<Parameters<P>> {
    serde_json::from_value(Value::Object(arguments.unwrap_or_default())).map(Parameters)
}

/// Main MCP server coordinator
///
/// Cheap to clone; every tool group shares one database handle.
#[derive(Clone)]
pub struct McpServer {
    issues: IssueTools,
    projects: ProjectTools,
    teams: TeamTools,
    labels: LabelTools,
    cycles: CycleTools,
    comments: CommentTools,
    users: UserTools,
    tools: Arc<Vec<Tool>>,
}

impl McpServer {
    pub fn new(db: impl Into<Arc<SqliteDatabase>>) -> Self {
        let db = db.into();
        let issues = IssueTools::new(Arc::clone(&db));
        let projects = ProjectTools::new(Arc::clone(&db));
        let teams = TeamTools::new(Arc::clone(&db));
        let labels = LabelTools::new(Arc::clone(&db));
        let cycles = CycleTools::new(Arc::clone(&db));
        let comments = CommentTools::new(Arc::clone(&db));
        let users = UserTools::new(db);

        let mut tools: Vec<Tool> = [
            issues.router().list_all(),
            projects.router().list_all(),
            teams.router().list_all(),
            labels.router().list_all(),
            cycles.router().list_all(),
            comments.router().list_all(),
            users.router().list_all(),
        ]
        .into_iter()
        .flatten()
        .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            issues,
            projects,
            teams,
            labels,
            cycles,
            comments,
            users,
            tools: Arc::new(tools),
        }
    }

    pub fn info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info.name = SERVER_NAME.to_string();
        info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
        info.instructions = Some(
            "Tracker MCP Server - Manage teams, projects, issues, labels, cycles and comments. \
             Use 'me' to refer to yourself."
                .to_string(),
        );
        info
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Handle one JSON-RPC message. Notifications yield no response.
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!("Notification accepted");
            return None;
        }
        let id = request.id.clone();
        let response = match request.method.as_str() {
            METHOD_INITIALIZE => {
                JsonRpcResponse::success(id, self.initialize_result(request.params.as_ref()))
            }
            METHOD_PING => JsonRpcResponse::success(id, json!({})),
            METHOD_TOOLS_LIST => JsonRpcResponse::success(id, json!({ "tools": self.tools() })),
            METHOD_TOOLS_CALL => {
                let params = request
                    .params
                    .map(serde_json::from_value::<CallToolParams>)
                    .transpose();
                match params {
                    Ok(Some(params)) => match self.call_tool(&params.name, params.arguments).await {
                        Ok(result) => match serde_json::to_value(&result) {
                            Ok(value) => JsonRpcResponse::success(id, value),
                            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
                        },
                        Err(e @ DispatchError::UnknownTool(_)) => {
                            JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string())
                        }
                        Err(e @ DispatchError::Internal { .. }) => {
                            JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string())
                        }
                    },
                    Ok(None) => JsonRpcResponse::error(id, INVALID_PARAMS, "Missing tool name"),
                    Err(e) => JsonRpcResponse::error(
                        id,
                        INVALID_PARAMS,
                        format!("Invalid tools/call params: {}", e),
                    ),
                }
            }
            other => {
                debug!(method = %other, "Unknown method");
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, "Method not found")
            }
        };
        Some(response)
    }

    fn initialize_result(&self, params: Option<&Value>) -> Value {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        let mut result = serde_json::to_value(self.info()).unwrap_or_else(|_| json!({}));
        if let Some(object) = result.as_object_mut() {
            object.insert("protocolVersion".to_string(), json!(requested));
        }
        result
    }

    /// Run a tool by name.
    ///
    /// Malformed arguments and expected store outcomes come back as a failed
    /// envelope; other store errors as an envelope flagged `isError`. Names
    /// must match the `#[tool]` methods that fill `tools/list`.
    #[instrument(skip(self, arguments))]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, DispatchError> {
        macro_rules! dispatch {
            ($tools:expr, $method:ident) => {
                match parse(arguments) {
                    Ok(params) => $tools.$method(params).await,
                    Err(e) => {
                        return Ok(failure(format!("Invalid arguments for {}: {}", name, e)));
                    }
                }
            };
        }

        let result = match name {
            "list_issues" => dispatch!(self.issues, list_issues),
            "get_issue" => dispatch!(self.issues, get_issue),
            "create_issue" => dispatch!(self.issues, create_issue),
            "update_issue" => dispatch!(self.issues, update_issue),
            "delete_issue" => dispatch!(self.issues, delete_issue),
            "list_projects" => dispatch!(self.projects, list_projects),
            "get_project" => dispatch!(self.projects, get_project),
            "create_project" => dispatch!(self.projects, create_project),
            "update_project" => dispatch!(self.projects, update_project),
            "list_milestones" => dispatch!(self.projects, list_milestones),
            "create_milestone" => dispatch!(self.projects, create_milestone),
            "list_teams" => dispatch!(self.teams, list_teams),
            "get_team" => dispatch!(self.teams, get_team),
            "create_team" => dispatch!(self.teams, create_team),
            "list_issue_statuses" => dispatch!(self.teams, list_issue_statuses),
            "list_issue_labels" => dispatch!(self.labels, list_issue_labels),
            "create_issue_label" => dispatch!(self.labels, create_issue_label),
            "update_issue_label" => dispatch!(self.labels, update_issue_label),
            "delete_issue_label" => dispatch!(self.labels, delete_issue_label),
            "list_cycles" => dispatch!(self.cycles, list_cycles),
            "get_cycle" => dispatch!(self.cycles, get_cycle),
            "create_cycle" => dispatch!(self.cycles, create_cycle),
            "update_cycle" => dispatch!(self.cycles, update_cycle),
            "delete_cycle" => dispatch!(self.cycles, delete_cycle),
            "list_comments" => dispatch!(self.comments, list_comments),
            "create_comment" => dispatch!(self.comments, create_comment),
            "update_comment" => dispatch!(self.comments, update_comment),
            "delete_comment" => dispatch!(self.comments, delete_comment),
            "list_users" => dispatch!(self.users, list_users),
            "get_user" => dispatch!(self.users, get_user),
            _ => return Err(DispatchError::UnknownTool(name.to_string())),
        };

        result.map_err(|e| {
            error!(tool = %name, error = %e.message, "Tool call failed");
            DispatchError::Internal {
                tool: name.to_string(),
                message: e.message.to_string(),
            }
        })
    }
}
