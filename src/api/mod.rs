mod paths;


use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use miette::Diagnostic;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::db::SqliteDatabase;
use crate::mcp::{McpServer, SessionManager, create_mcp_router};

pub use paths::{get_data_dir, get_db_path};

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address to bind to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Serve requests with an unknown or missing session id instead of
    /// rejecting them
    pub stateless: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 3000,
            stateless: true,
        }
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum ApiError {
    #[error("Failed to bind {addr}: {source}")]
    #[diagnostic(
        code(tracker::api::bind),
        help("Is another process already listening on this port?")
    )]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    #[diagnostic(code(tracker::api::serve))]
    Serve(#[source] std::io::Error),
}

/// Install the tracing subscriber with an env filter.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// The MCP router with request tracing.
pub fn create_app(server: McpServer, sessions: Arc<SessionManager>) -> Router {
    create_mcp_router(server, sessions).layer(TraceLayer::new_for_http())
}

/// Run the server until Ctrl-C.
///
/// On shutdown the sweeper stops and every open session is closed, which
/// also ends any open event streams so in-flight connections can drain.
pub async fn run(config: Config, db: SqliteDatabase) -> Result<(), ApiError> {
    init_tracing();

    let shutdown = CancellationToken::new();
    let sessions = Arc::new(SessionManager::new(config.stateless));
    let sweeper = Arc::clone(&sessions).spawn_sweeper(shutdown.child_token());
    let app = create_app(McpServer::new(db), Arc::clone(&sessions));

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ApiError::Bind { addr, source })?;
    info!(
        stateless = config.stateless,
        "MCP server listening on http://{}/mcp", addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone(), Arc::clone(&sessions)))
        .await
        .map_err(ApiError::Serve)?;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "Session sweeper did not stop cleanly");
    }
    let closed = sessions.close_all();
    info!(closed, "Server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken, sessions: Arc<SessionManager>) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                return shutdown.cancelled().await;
            }
        }
        _ = shutdown.cancelled() => {}
    }
    info!("Shutting down");
    shutdown.cancel();
    sessions.close_all();
}
