//! Tests for SqliteTeamRepository and SqliteUserRepository.

use crate::db::{
    BUNDLED_SCHEMA, DbError, NewTeam, SqliteDatabase, StatementFailurePolicy, TeamFilter,
    UserFilter,
};

async fn setup_db() -> SqliteDatabase {
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create in-memory database");
    db.bootstrap(BUNDLED_SCHEMA, StatementFailurePolicy::Ignore)
        .await
        .expect("Bootstrap should succeed");
    db
}

fn new_team(name: &str, key: &str) -> NewTeam {
    NewTeam {
        name: name.to_string(),
        key: key.to_string(),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn create_team_derives_id_and_default_color() {
    let db = setup_db().await;
    let team = db
        .teams()
        .create(&new_team("Engineering", "ENG"))
        .await
        .expect("Create should succeed");

    assert_eq!(team.id, "team_eng");
    assert_eq!(team.key, "ENG");
    assert_eq!(team.color.as_deref(), Some("#5e6ad2"));
    assert!(team.archived_at.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_key_is_rejected_before_store_access() {
    let db = setup_db().await;
    db.close().await;

    // The pool is closed, so only a validation error can come back.
    let err = db
        .teams()
        .create(&new_team("Engineering", "eng"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_key_is_reported_as_existing() {
    let db = setup_db().await;
    db.teams().create(&new_team("Engineering", "ENG")).await.unwrap();

    let err = db
        .teams()
        .create(&new_team("Other", "ENG"))
        .await
        .unwrap_err();
    assert!(err.is_expected());
    assert_eq!(err.to_string(), "Team 'ENG' already exists");
}

#[tokio::test(flavor = "multi_thread")]
async fn get_team_by_key_name_or_id() {
    let db = setup_db().await;
    db.teams().create(&new_team("Engineering", "ENG")).await.unwrap();

    for token in ["ENG", "Engineering", "team_eng"] {
        let team = db.teams().get(token).await.expect("team should resolve");
        assert_eq!(team.id, "team_eng");
    }
    assert!(matches!(
        db.teams().get("Design").await,
        Err(DbError::NotFound { .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn list_teams_hides_archived_and_filters_by_text() {
    let db = setup_db().await;
    db.teams().create(&new_team("Engineering", "ENG")).await.unwrap();
    db.teams().create(&new_team("Operations", "OPS")).await.unwrap();
    sqlx::query("UPDATE teams SET archived_at = 'now' WHERE key = 'OPS'")
        .execute(db.pool())
        .await
        .unwrap();

    let visible = db.teams().list(&TeamFilter::default()).await.unwrap();
    assert_eq!(visible.len(), 1);

    let all = db
        .teams()
        .list(&TeamFilter {
            include_archived: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let by_key = db
        .teams()
        .list(&TeamFilter {
            query: Some("op".to_string()),
            include_archived: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_key.len(), 1);
    assert_eq!(by_key[0].key, "OPS");
}

#[tokio::test(flavor = "multi_thread")]
async fn statuses_include_seeded_workflow_in_order() {
    let db = setup_db().await;
    db.teams().create(&new_team("Engineering", "ENG")).await.unwrap();

    let statuses = db.teams().statuses("ENG").await.unwrap();
    let names: Vec<_> = statuses.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Backlog", "Todo", "In Progress", "Done", "Canceled"]
    );
    assert!(statuses.iter().all(|s| s.team_id.as_deref() == Some("team_eng")));
}

#[tokio::test(flavor = "multi_thread")]
async fn users_resolve_me_and_filter_by_text() {
    let db = setup_db().await;
    let me = db.users().get("me").await.unwrap();
    assert_eq!(me.id, "user_local");

    sqlx::query(
        "INSERT INTO users (id, name, email, created_at, updated_at) \
         VALUES ('user_ada', 'Ada', 'ada@example.com', 'x', 'x')",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let found = db
        .users()
        .list(&UserFilter {
            query: Some("example.com".to_string()),
            limit: None,
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name.as_deref(), Some("Ada"));

    let everyone = db.users().list(&UserFilter::default()).await.unwrap();
    let names: Vec<_> = everyone.iter().filter_map(|u| u.name.as_deref()).collect();
    assert_eq!(names, vec!["Ada", "Local User"]);
}
