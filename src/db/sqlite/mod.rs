//! SQLite implementation of the tracker store.
//!
//! Repositories borrow the pool of a [`SqliteDatabase`] and are obtained
//! through its accessors (`db.issues()`, `db.teams()`, ...).

mod comment;
mod connection;
mod cycle;
mod helpers;
mod issue;
mod label;
mod project;
mod resolver;
mod team;
mod user;

#[cfg(test)]
mod comment_test;
#[cfg(test)]
mod cycle_test;
#[cfg(test)]
mod team_test;

pub use comment::SqliteCommentRepository;
pub use connection::{BootstrapReport, SqliteDatabase};
pub use cycle::{INITIAL_CYCLE_STATUS, SqliteCycleRepository};
pub use issue::{FALLBACK_ISSUE_KEY, SqliteIssueRepository};
pub use label::{DEFAULT_LABEL_COLOR, SqliteLabelRepository};
pub use project::{DEFAULT_PROJECT_STATE, SqliteProjectRepository};
pub use resolver::SqliteResolver;
pub use team::{DEFAULT_TEAM_COLOR, SqliteTeamRepository, validate_team_key};
pub use user::SqliteUserRepository;
