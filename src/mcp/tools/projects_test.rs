//! Tests for project MCP tools

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, RawContent};
use serde_json::{Value, json};

use crate::db::{BUNDLED_SCHEMA, NewTeam, SqliteDatabase, StatementFailurePolicy};
use crate::mcp::tools::{
    CreateMilestoneParams, CreateProjectParams, GetProjectParams, ListMilestonesParams,
    ListProjectsParams, ProjectTools, UpdateProjectParams,
};

async fn setup() -> ProjectTools {
    let db = SqliteDatabase::in_memory().await.unwrap();
    db.bootstrap(BUNDLED_SCHEMA, StatementFailurePolicy::Ignore)
        .await
        .unwrap();
    db.teams()
        .create(&NewTeam {
            name: "Engineering".to_string(),
            key: "ENG".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    ProjectTools::new(Arc::new(db))
}

fn envelope(result: &CallToolResult) -> Value {
    let content_text = match &result.content[0].raw {
        RawContent::Text(text) => text.text.as_str(),
        _ => panic!("Expected text content"),
    };
    serde_json::from_str(content_text).unwrap()
}

fn create(name: &str) -> CreateProjectParams {
    CreateProjectParams {
        name: name.to_string(),
        team: "ENG".to_string(),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_project_defaults_state() {
    let tools = setup().await;
    let result = tools
        .create_project(Parameters(CreateProjectParams {
            lead: Some("me".to_string()),
            ..create("Launch")
        }))
        .await
        .expect("create_project should succeed");

    let data = &envelope(&result)["data"];
    assert_eq!(data["status"], json!("started"));
    assert_eq!(data["lead_id"], json!("user_local"));
    assert_eq!(data["team_name"], json!("Engineering"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_projects_by_member() {
    let tools = setup().await;
    tools
        .create_project(Parameters(CreateProjectParams {
            lead: Some("me".to_string()),
            ..create("Led")
        }))
        .await
        .unwrap();
    tools.create_project(Parameters(create("Unled"))).await.unwrap();

    let result = tools
        .list_projects(Parameters(ListProjectsParams {
            member: Some("me".to_string()),
            ..Default::default()
        }))
        .await
        .unwrap();
    let items = envelope(&result)["data"].as_array().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], json!("Led"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_project_clears_lead() {
    let tools = setup().await;
    tools
        .create_project(Parameters(CreateProjectParams {
            lead: Some("me".to_string()),
            ..create("Launch")
        }))
        .await
        .unwrap();

    let params: UpdateProjectParams =
        serde_json::from_value(json!({"id": "Launch", "lead": null})).unwrap();
    let result = tools.update_project(Parameters(params)).await.unwrap();
    assert_eq!(envelope(&result)["data"]["lead_id"], Value::Null);

    let empty = tools
        .update_project(Parameters(UpdateProjectParams {
            id: "Launch".to_string(),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert_eq!(
        envelope(&empty),
        json!({"success": false, "error": "No updates provided"})
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_milestones_roundtrip_through_get_project() {
    let tools = setup().await;
    tools.create_project(Parameters(create("Launch"))).await.unwrap();

    let milestone = tools
        .create_milestone(Parameters(CreateMilestoneParams {
            project: "Launch".to_string(),
            name: "Beta".to_string(),
            target_date: Some("2025-09-01".to_string()),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert_eq!(envelope(&milestone)["data"]["name"], json!("Beta"));

    let listed = tools
        .list_milestones(Parameters(ListMilestonesParams {
            project: "Launch".to_string(),
        }))
        .await
        .unwrap();
    assert_eq!(envelope(&listed)["data"].as_array().unwrap().len(), 1);

    let project = tools
        .get_project(Parameters(GetProjectParams {
            query: "Launch".to_string(),
            include_milestones: Some(true),
        }))
        .await
        .unwrap();
    assert_eq!(
        envelope(&project)["data"]["milestones"][0]["name"],
        json!("Beta")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_unknown_project() {
    let tools = setup().await;
    let result = tools
        .get_project(Parameters(GetProjectParams {
            query: "Nope".to_string(),
            include_milestones: None,
        }))
        .await
        .unwrap();
    assert_eq!(
        envelope(&result),
        json!({"success": false, "error": "Project 'Nope' not found"})
    );
}
