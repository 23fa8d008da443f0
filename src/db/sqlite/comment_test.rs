//! Tests for SqliteCommentRepository.

use crate::db::{
    BUNDLED_SCHEMA, DbError, Issue, NewIssue, NewTeam, SqliteDatabase, StatementFailurePolicy,
};

async fn setup() -> (SqliteDatabase, Issue) {
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
    let issue = db
        .issues()
        .create(&NewIssue {
            title: "Discuss".to_string(),
            team: "ENG".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    (db, issue)
}

#[tokio::test(flavor = "multi_thread")]
async fn comments_are_authored_by_acting_user_oldest_first() {
    let (db, issue) = setup().await;
    let repo = db.comments();

    let first = repo.create("ENG-1", "first", None).await.unwrap();
    let reply = repo
        .create(&issue.id, "second", Some(&first.id))
        .await
        .unwrap();
    assert_eq!(first.user_id.as_deref(), Some("user_local"));
    assert_eq!(first.user_email.as_deref(), Some("me@localhost"));
    assert_eq!(reply.parent_id.as_deref(), Some(first.id.as_str()));

    let bodies: Vec<_> = repo
        .list("ENG-1")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.body)
        .collect();
    assert_eq!(bodies, vec!["first", "second"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn commenting_touches_the_issue() {
    let (db, issue) = setup().await;
    let comment = db.comments().create(&issue.id, "ping", None).await.unwrap();

    let touched = db.issues().get_by_id(&issue.id).await.unwrap();
    assert_eq!(touched.updated_at, comment.created_at);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_issue_or_parent_is_not_found() {
    let (db, issue) = setup().await;
    let repo = db.comments();

    assert!(matches!(
        repo.create("ENG-99", "x", None).await,
        Err(DbError::NotFound { .. })
    ));
    assert!(matches!(
        repo.create(&issue.id, "x", Some("comment_missing")).await,
        Err(DbError::NotFound { .. })
    ));
    assert!(matches!(
        repo.create(&issue.id, "   ", None).await,
        Err(DbError::Validation { .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn update_and_delete_comment() {
    let (db, issue) = setup().await;
    let repo = db.comments();
    let comment = repo.create(&issue.id, "draft", None).await.unwrap();

    let updated = repo.update(&comment.id, "final").await.unwrap();
    assert_eq!(updated.body, "final");
    assert_eq!(updated.created_at, comment.created_at);

    assert_eq!(repo.delete(&comment.id).await.unwrap(), comment.id);
    assert!(matches!(
        repo.delete(&comment.id).await,
        Err(DbError::NotFound { .. })
    ));
    assert!(matches!(
        repo.update(&comment.id, "again").await,
        Err(DbError::NotFound { .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn reply_must_share_the_parent_issue() {
    let (db, issue) = setup().await;
    let other = db
        .issues()
        .create(&NewIssue {
            title: "Elsewhere".to_string(),
            team: "ENG".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let repo = db.comments();
    let parent = repo.create(&other.id, "on ENG-2", None).await.unwrap();

    let err = repo
        .create(&issue.id, "cross-issue reply", Some(&parent.id))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation { .. }));
    assert!(repo.list(&issue.id).await.unwrap().is_empty());

    let reply = repo
        .create(&other.id, "same-issue reply", Some(&parent.id))
        .await
        .unwrap();
    assert_eq!(reply.parent_id.as_deref(), Some(parent.id.as_str()));
}

#[tokio::test(flavor = "multi_thread")]
async fn update_rejects_blank_body() {
    let (db, issue) = setup().await;
    let repo = db.comments();
    let comment = repo.create(&issue.id, "keep me", None).await.unwrap();

    assert!(matches!(
        repo.update(&comment.id, "  \n").await,
        Err(DbError::Validation { .. })
    ));
    assert_eq!(repo.get_by_id(&comment.id).await.unwrap().body, "keep me");
}
