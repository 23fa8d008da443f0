//! Model Context Protocol (MCP) server implementation
//!
//! This module serves MCP over the Streamable HTTP transport.
//!
//! - **protocol**: JSON-RPC envelope types and constants
//! - **server**: Dispatcher from JSON-RPC methods to tools
//! - **session**: Session registry, routing and idle sweep
//! - **service**: Axum router for `/mcp` and `/health`
//! - **tools**: One tool group per entity (issues, projects, teams, labels,
//!   cycles, comments, users)

pub mod protocol;
pub mod server;
mod service;
pub mod session;
pub mod tools;

#[cfg(test)]
mod service_test;

pub use server::{DispatchError, McpServer};
pub use service::{McpState, create_mcp_router};
pub use session::{
    Route, SESSION_TIMEOUT, SWEEP_INTERVAL, SessionManager, SessionTransport, SweepReport,
};
