//! MCP Streamable HTTP service
//!
//! `POST /mcp` carries JSON-RPC messages, `GET /mcp` opens a session's event
//! stream and `DELETE /mcp` ends a session. Sessions are identified by the
//! `Mcp-Session-Id` header.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures_util::{StreamExt, stream};
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::protocol::{
    INTERNAL_ERROR, INVALID_REQUEST, JsonRpcRequest, JsonRpcResponse, PARSE_ERROR, SESSION_HEADER,
};
use super::server::{McpServer, SERVER_NAME};
use super::session::{Route, SessionManager};

#[derive(Clone)]
pub struct McpState {
    pub server: McpServer,
    pub sessions: Arc<SessionManager>,
}

/// Create the MCP router with `/mcp` and `/health`.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// # use tracker::db::SqliteDatabase;
/// # use tracker::mcp::{McpServer, SessionManager, create_mcp_router};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let db = SqliteDatabase::in_memory().await?;
/// let sessions = Arc::new(SessionManager::new(true));
/// let app: axum::Router = create_mcp_router(McpServer::new(db), sessions);
/// # Ok(())
/// # }
/// ```
pub fn create_mcp_router(server: McpServer, sessions: Arc<SessionManager>) -> Router {
    Router::new()
        .route(
            "/mcp",
            post(handle_post).get(handle_get).delete(handle_delete),
        )
        .route("/health", get(health))
        .with_state(McpState { server, sessions })
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

fn rpc_error(status: StatusCode, code: i64, message: &str) -> Response {
    (status, Json(JsonRpcResponse::error(None, code, message))).into_response()
}

fn rpc_response(response: Option<JsonRpcResponse>, session: Option<&str>) -> Response {
    let mut http = match response {
        Some(body) => (StatusCode::OK, Json(body)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };
    if let Some(value) = session.and_then(|id| HeaderValue::from_str(id).ok()) {
        http.headers_mut().insert(SESSION_HEADER, value);
    }
    http
}

#[instrument(skip_all)]
async fn handle_post(State(state): State<McpState>, headers: HeaderMap, body: Bytes) -> Response {
    let request: JsonRpcRequest = match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(value) => match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Invalid JSON-RPC request");
                return rpc_error(StatusCode::BAD_REQUEST, INVALID_REQUEST, "Invalid Request");
            }
        },
        Err(e) => {
            debug!(error = %e, "Unparseable request body");
            return rpc_error(StatusCode::BAD_REQUEST, PARSE_ERROR, "Parse error");
        }
    };

    match state.sessions.route(&request.method, session_id(&headers)) {
        Route::Initialize => {
            let transport = state.sessions.create();
            let response = transport.run(state.server.handle(request)).await;
            rpc_response(response.flatten(), Some(transport.id()))
        }
        Route::Session(transport) => {
            let is_notification = request.is_notification();
            match transport.run(state.server.handle(request)).await {
                Some(response) => rpc_response(response, Some(transport.id())),
                None if is_notification => StatusCode::ACCEPTED.into_response(),
                None => rpc_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR,
                    "Session closed",
                ),
            }
        }
        Route::Stateless => rpc_response(state.server.handle(request).await, None),
        Route::Reject => {
            warn!(method = %request.method, "Rejected call without a valid session");
            rpc_error(
                StatusCode::BAD_REQUEST,
                INVALID_REQUEST,
                "Bad Request: No valid session ID provided",
            )
        }
    }
}

/// Server-to-client event stream of a session. Carries only keep-alives and
/// ends when the session's transport closes.
#[instrument(skip_all)]
async fn handle_get(State(state): State<McpState>, headers: HeaderMap) -> Response {
    let Some(transport) = session_id(&headers).and_then(|id| state.sessions.touch(id)) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    debug!(session = %transport.id(), "Opening event stream");
    let events = stream::pending::<Result<Event, Infallible>>().take_until(transport.closed());
    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

#[instrument(skip_all)]
async fn handle_delete(State(state): State<McpState>, headers: HeaderMap) -> StatusCode {
    let Some(id) = session_id(&headers) else {
        return StatusCode::BAD_REQUEST;
    };
    if state.sessions.close(id) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "server": SERVER_NAME }))
}
