//! Storage layer for the tracker.
//!
//! # Architecture
//!
//! - `error`: storage error types
//! - `models`: domain entities (Team, User, Project, Issue, ...)
//! - `query`: parameterized statement assembly
//! - `resolver`: token to canonical id resolution
//! - `filter`: typed list filters composed into a single query
//! - `schema`: schema script splitting
//! - `sqlite`: the SQLite store and its repositories

mod error;
pub mod filter;
mod models;
mod query;
pub mod resolver;
pub mod schema;
pub mod sqlite;
pub mod utils;

#[cfg(test)]
mod error_test;
#[cfg(test)]
mod filter_test;

pub use error::{DbError, DbResult};
pub use filter::{
    CycleFilter, CycleType, IssueFilter, IssueOrder, LabelFilter, ProjectFilter, TeamFilter,
    UnresolvedFilterPolicy, UserFilter,
};
pub use models::*;
pub use query::{ComposedQuery, SqlValue, count_placeholders};
pub use resolver::{IdResolver, ME_TOKEN};
pub use schema::{BUNDLED_SCHEMA, StatementFailurePolicy, split_statements};
pub use sqlite::{BootstrapReport, SqliteDatabase, SqliteResolver};
