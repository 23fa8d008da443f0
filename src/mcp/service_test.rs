//! Tests for the MCP Streamable HTTP service.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::db::{BUNDLED_SCHEMA, SqliteDatabase, StatementFailurePolicy};
use crate::mcp::protocol::SESSION_HEADER;
use crate::mcp::{McpServer, SessionManager, create_mcp_router};

async fn setup(stateless: bool) -> (Router, Arc<SessionManager>) {
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create in-memory database");
    db.bootstrap(BUNDLED_SCHEMA, StatementFailurePolicy::Ignore)
        .await
        .expect("Bootstrap should succeed");
    let sessions = Arc::new(SessionManager::new(stateless));
    let app = create_mcp_router(McpServer::new(db), Arc::clone(&sessions));
    (app, sessions)
}

fn post(body: Value, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(CONTENT_TYPE, "application/json")
        .header("accept", "application/json, text/event-stream");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn initialize() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {"protocolVersion": "2025-03-26", "capabilities": {}, "clientInfo": {"name": "test", "version": "0"}}
    })
}

fn tools_list(id: i64) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": "tools/list"})
}

async fn open_session(app: &Router) -> String {
    let response = app.clone().oneshot(post(initialize(), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response
        .headers()
        .get(SESSION_HEADER)
        .expect("initialize returns a session id")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test(flavor = "multi_thread")]
async fn health_reports_server_name() {
    let (app, _) = setup(true).await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"status": "ok", "server": "tracker"})
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn initialize_creates_session_and_calls_route_through_it() {
    let (app, sessions) = setup(false).await;
    let id = open_session(&app).await;
    assert!(sessions.contains(&id));

    let response = app.clone().oneshot(post(tools_list(2), Some(&id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(SESSION_HEADER).unwrap().to_str().unwrap(),
        id
    );
    let body = json_body(response).await;
    assert_eq!(body["id"], json!(2));
    assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 30);
}

#[tokio::test(flavor = "multi_thread")]
async fn initialize_with_existing_session_opens_another() {
    let (app, sessions) = setup(true).await;
    let first = open_session(&app).await;

    let response = app
        .clone()
        .oneshot(post(initialize(), Some(&first)))
        .await
        .unwrap();
    let second = response.headers().get(SESSION_HEADER).unwrap().to_str().unwrap();
    assert_ne!(second, first);
    assert_eq!(sessions.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn stateless_fallback_serves_calls_without_session() {
    let (app, sessions) = setup(true).await;

    let response = app
        .clone()
        .oneshot(post(tools_list(3), Some("unknown-session")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(SESSION_HEADER).is_none());
    assert!(json_body(response).await["result"]["tools"].is_array());

    let response = app.oneshot(post(tools_list(4), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(sessions.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_session_is_rejected_without_fallback() {
    let (app, sessions) = setup(false).await;
    let response = app
        .oneshot(post(tools_list(5), Some("unknown-session")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], json!(-32600));
    assert!(sessions.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn notification_is_accepted() {
    let (app, _) = setup(true).await;
    let id = open_session(&app).await;
    let response = app
        .oneshot(post(
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            Some(&id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_body_is_a_parse_error() {
    let (app, _) = setup(true).await;
    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], json!(-32700));
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_terminates_known_session_only() {
    let (app, sessions) = setup(false).await;
    let id = open_session(&app).await;

    let delete = |id: &str| {
        Request::builder()
            .method("DELETE")
            .uri("/mcp")
            .header(SESSION_HEADER, id)
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(delete(&id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!sessions.contains(&id));

    let response = app.clone().oneshot(delete(&id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A terminated session no longer routes.
    let response = app.oneshot(post(tools_list(6), Some(&id))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn event_stream_requires_known_session() {
    let (app, sessions) = setup(true).await;

    let unknown = Request::builder()
        .method("GET")
        .uri("/mcp")
        .header(SESSION_HEADER, "unknown-session")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(unknown).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let id = open_session(&app).await;
    let known = Request::builder()
        .method("GET")
        .uri("/mcp")
        .header(SESSION_HEADER, &id)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(known).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );

    // Closing the session ends the stream.
    assert!(sessions.close(&id));
    let collected = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        response.into_body().collect(),
    )
    .await
    .expect("stream should end when the session closes");
    assert!(collected.is_ok());
}
