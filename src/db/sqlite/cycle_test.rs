//! Tests for SqliteCycleRepository.

use crate::db::{
    BUNDLED_SCHEMA, CycleType, CycleUpdate, DbError, NewCycle, NewTeam, SqliteDatabase,
    StatementFailurePolicy,
};

async fn setup_db() -> SqliteDatabase {
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create in-memory database");
    db.bootstrap(BUNDLED_SCHEMA, StatementFailurePolicy::Ignore)
        .await
        .expect("Bootstrap should succeed");
    db.teams()
        .create(&NewTeam {
            name: "Engineering".to_string(),
            key: "ENG".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    db
}

fn new_cycle(name: &str, start: &str, end: &str) -> NewCycle {
    NewCycle {
        team: "ENG".to_string(),
        name: name.to_string(),
        description: None,
        start_date: start.to_string(),
        end_date: end.to_string(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn new_cycles_are_upcoming() {
    let db = setup_db().await;
    let cycle = db
        .cycles()
        .create(&new_cycle("Sprint 1", "2025-01-01", "2025-01-14"))
        .await
        .unwrap();
    assert_eq!(cycle.status.as_deref(), Some("upcoming"));
    assert_eq!(cycle.team_id.as_deref(), Some("team_eng"));

    let fetched = db.cycles().get("Sprint 1").await.unwrap();
    assert_eq!(fetched, cycle);
}

#[tokio::test(flavor = "multi_thread")]
async fn list_by_type_maps_to_status() {
    let db = setup_db().await;
    let repo = db.cycles();
    let first = repo
        .create(&new_cycle("Sprint 1", "2025-01-01", "2025-01-14"))
        .await
        .unwrap();
    repo.create(&new_cycle("Sprint 2", "2025-01-15", "2025-01-28"))
        .await
        .unwrap();
    repo.update(
        &first.id,
        &CycleUpdate {
            status: Some("current".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let all = repo.list("ENG", None).await.unwrap();
    let names: Vec<_> = all.iter().filter_map(|c| c.name.as_deref()).collect();
    assert_eq!(names, vec!["Sprint 2", "Sprint 1"], "newest start first");

    let current = repo.list("ENG", Some(CycleType::Current)).await.unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, first.id);

    assert!(repo.list("ENG", Some(CycleType::Previous)).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn list_requires_known_team() {
    let db = setup_db().await;
    assert!(matches!(
        db.cycles().list("NOPE", None).await,
        Err(DbError::NotFound { .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn update_keeps_unspecified_fields_and_delete_removes() {
    let db = setup_db().await;
    let repo = db.cycles();
    let cycle = repo
        .create(&NewCycle {
            description: Some("first".to_string()),
            ..new_cycle("Sprint 1", "2025-01-01", "2025-01-14")
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            &cycle.id,
            &CycleUpdate {
                end_date: Some("2025-01-21".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.end_date.as_deref(), Some("2025-01-21"));
    assert_eq!(updated.description.as_deref(), Some("first"));

    assert_eq!(repo.delete(&cycle.id).await.unwrap(), cycle.id);
    assert!(matches!(
        repo.get(&cycle.id).await,
        Err(DbError::NotFound { .. })
    ));
}
