//! Tests for database error types.

use crate::db::{DbError, DbResult};

#[test]
fn not_found_error_displays_correctly() {
    let err = DbError::not_found("Issue", "ENG-7");
    assert_eq!(err.to_string(), "Issue 'ENG-7' not found");
}

#[test]
fn already_exists_error_displays_correctly() {
    let err = DbError::AlreadyExists {
        entity_type: "Team".to_string(),
        id: "ENG".to_string(),
    };
    assert_eq!(err.to_string(), "Team 'ENG' already exists");
}

#[test]
fn validation_error_shows_bare_message() {
    let err = DbError::validation("Team key must be 2-5 uppercase letters");
    assert_eq!(err.to_string(), "Team key must be 2-5 uppercase letters");
}

#[test]
fn bootstrap_error_displays_correctly() {
    let err = DbError::Bootstrap {
        message: "schema.sql: No such file or directory".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Schema bootstrap failed: schema.sql: No such file or directory"
    );
}

#[test]
fn expected_errors_are_classified() {
    assert!(DbError::not_found("Team", "x").is_expected());
    assert!(DbError::validation("bad").is_expected());
    assert!(
        !DbError::Constraint {
            message: "UNIQUE constraint failed: teams.id".to_string()
        }
        .is_expected()
    );
    assert!(
        !DbError::Database {
            message: "disk I/O error".to_string()
        }
        .is_expected()
    );
}

#[test]
fn row_not_found_maps_to_database_error() {
    let err: DbError = sqlx::Error::RowNotFound.into();
    assert!(matches!(err, DbError::Database { .. }));
}

#[test]
fn db_result_propagates_with_question_mark() {
    fn inner() -> DbResult<()> {
        Err(DbError::validation("nope"))
    }
    fn outer() -> DbResult<u8> {
        inner()?;
        Ok(1)
    }
    assert!(outer().is_err());
}
