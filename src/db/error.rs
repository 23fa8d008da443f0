//! Database error types.
//!
//! Storage errors carry miette diagnostic codes so the binary can render them
//! with context. Not-found and validation failures are expected outcomes of a
//! tool call; constraint and database errors are genuine failures that travel
//! up with `?` until the dispatcher turns them into an error envelope.

use miette::Diagnostic;
use thiserror::Error;

/// Database operation errors.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("{entity_type} '{id}' not found")]
    #[diagnostic(code(tracker::db::not_found))]
    NotFound { entity_type: String, id: String },

    #[error("{entity_type} '{id}' already exists")]
    #[diagnostic(code(tracker::db::already_exists))]
    AlreadyExists { entity_type: String, id: String },

    #[error("{message}")]
    #[diagnostic(code(tracker::db::validation_error))]
    Validation { message: String },

    #[error("Database error: {message}")]
    #[diagnostic(code(tracker::db::database_error))]
    Database { message: String },

    #[error("Schema bootstrap failed: {message}")]
    #[diagnostic(
        code(tracker::db::bootstrap_error),
        help("Check that the schema script exists and is readable")
    )]
    Bootstrap { message: String },

    #[error("Connection error: {message}")]
    #[diagnostic(code(tracker::db::connection_error))]
    Connection { message: String },

    #[error("Constraint violation: {message}")]
    #[diagnostic(code(tracker::db::constraint))]
    Constraint { message: String },
}

impl DbError {
    pub fn not_found(entity_type: &str, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DbError::Validation {
            message: message.into(),
        }
    }

    /// Expected outcomes that are reported as a failed result rather than an error.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            DbError::NotFound { .. } | DbError::AlreadyExists { .. } | DbError::Validation { .. }
        )
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db)
                if db.is_unique_violation()
                    || db.is_foreign_key_violation()
                    || db.is_check_violation() =>
            {
                DbError::Constraint {
                    message: db.message().to_string(),
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DbError::Connection {
                    message: e.to_string(),
                }
            }
            _ => DbError::Database {
                message: e.to_string(),
            },
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
