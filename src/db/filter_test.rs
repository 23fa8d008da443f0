//! Tests for filter resolution and query composition.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::db::filter::{ResolvedIssueFilter, ResolvedLabelFilter, ResolvedProjectFilter};
use crate::db::{
    CycleFilter, CycleType, DbError, DbResult, EntityKind, Id, IdResolver, IssueFilter, IssueOrder,
    LabelFilter, ProjectFilter, SqlValue, TeamFilter, UnresolvedFilterPolicy, UserFilter,
};

/// In-memory resolver that records every lookup it receives.
#[derive(Default)]
struct StubResolver {
    known: HashMap<(EntityKind, &'static str), &'static str>,
    calls: Mutex<Vec<(EntityKind, String, Option<String>)>>,
}

impl StubResolver {
    fn with(mut self, kind: EntityKind, token: &'static str, id: &'static str) -> Self {
        self.known.insert((kind, token), id);
        self
    }

    fn calls(&self) -> Vec<(EntityKind, String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl IdResolver for StubResolver {
    async fn resolve(
        &self,
        kind: EntityKind,
        token: Option<&str>,
        scope: Option<&str>,
    ) -> DbResult<Option<Id>> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        self.calls.lock().unwrap().push((
            kind,
            token.to_string(),
            scope.map(str::to_string),
        ));
        Ok(self
            .known
            .iter()
            .find(|((k, t), _)| *k == kind && *t == token)
            .map(|(_, id)| id.to_string()))
    }
}

fn text(s: &str) -> SqlValue {
    SqlValue::from(s)
}

#[test]
fn issue_placeholders_match_params_for_every_combination() {
    for mask in 0u32..(1 << 8) {
        let on = |bit: u32| mask & (1 << bit) != 0;
        let filter = ResolvedIssueFilter {
            team_id: on(0).then(|| "team_eng".to_string()),
            project_id: on(1).then(|| "proj_1".to_string()),
            assignee_id: on(2).then(|| "user_1".to_string()),
            state: on(3).then(|| "started".to_string()),
            label_id: on(4).then(|| "label_1".to_string()),
            query: on(5).then(|| "crash?".to_string()),
            order_by: if on(6) {
                IssueOrder::CreatedAt
            } else {
                IssueOrder::UpdatedAt
            },
            limit: on(7).then_some(10),
            include_archived: on(6),
        };
        let query = filter.compose();
        assert_eq!(
            query.placeholder_count(),
            query.params().len(),
            "mask {mask:#010b}: {}",
            query.sql()
        );
    }
}

#[test]
fn project_placeholders_match_params_for_every_combination() {
    for mask in 0u32..(1 << 6) {
        let on = |bit: u32| mask & (1 << bit) != 0;
        let filter = ResolvedProjectFilter {
            team_id: on(0).then(|| "team_eng".to_string()),
            state: on(1).then(|| "started".to_string()),
            query: on(2).then(|| "roadmap".to_string()),
            lead_id: on(3).then(|| "user_1".to_string()),
            limit: on(4).then_some(5),
            include_archived: on(5),
        };
        let query = filter.compose();
        assert_eq!(query.placeholder_count(), query.params().len(), "{}", query.sql());
    }
}

#[test]
fn small_filters_keep_placeholders_and_params_in_step() {
    for mask in 0u32..(1 << 3) {
        let on = |bit: u32| mask & (1 << bit) != 0;

        let teams = TeamFilter {
            query: on(0).then(|| "eng".to_string()),
            limit: on(1).then_some(3),
            include_archived: on(2),
        }
        .compose();
        assert_eq!(teams.placeholder_count(), teams.params().len());

        let users = UserFilter {
            query: on(0).then(|| "ada".to_string()),
            limit: on(1).then_some(3),
        }
        .compose();
        assert_eq!(users.placeholder_count(), users.params().len());

        let labels = ResolvedLabelFilter {
            team_id: on(0).then(|| "team_eng".to_string()),
            name: on(1).then(|| "bug".to_string()),
            limit: on(2).then_some(3),
        }
        .compose();
        assert_eq!(labels.placeholder_count(), labels.params().len());

        let cycles = CycleFilter {
            team_id: "team_eng".to_string(),
            cycle_type: on(0).then_some(CycleType::Current),
        }
        .compose();
        assert_eq!(cycles.placeholder_count(), cycles.params().len());
    }
}

#[test]
fn issue_predicates_follow_fixed_order() {
    let filter = ResolvedIssueFilter {
        team_id: Some("team_eng".to_string()),
        project_id: Some("proj_1".to_string()),
        assignee_id: Some("user_1".to_string()),
        state: Some("Done".to_string()),
        label_id: Some("label_1".to_string()),
        query: Some("login".to_string()),
        order_by: IssueOrder::CreatedAt,
        limit: Some(20),
        include_archived: false,
    };
    let query = filter.compose();
    let sql = query.sql();

    let positions: Vec<usize> = [
        "i.team_id = ?",
        "i.project_id = ?",
        "i.assignee_id = ?",
        "(s.id = ? OR s.name = ? OR s.type = ?)",
        "issue_labels WHERE label_id = ?",
        "(i.title LIKE ? OR i.description LIKE ?)",
        "i.archived_at IS NULL",
        "ORDER BY i.created_at DESC",
        "LIMIT ?",
    ]
    .iter()
    .map(|needle| sql.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{sql}");

    assert_eq!(
        query.params(),
        &[
            text("team_eng"),
            text("proj_1"),
            text("user_1"),
            text("Done"),
            text("Done"),
            text("Done"),
            text("label_1"),
            text("%login%"),
            text("%login%"),
            SqlValue::Integer(20),
        ]
    );
}

#[test]
fn client_text_never_reaches_sql() {
    let hostile = "x'; DROP TABLE issues; --";
    let filter = ResolvedIssueFilter {
        state: Some(hostile.to_string()),
        query: Some(hostile.to_string()),
        ..Default::default()
    };
    let query = filter.compose();
    assert!(!query.sql().contains("DROP"));
    assert!(query.params().contains(&text(hostile)));
}

#[test]
fn empty_issue_filter_only_hides_archived() {
    let query = ResolvedIssueFilter::default().compose();
    assert!(query.sql().ends_with(
        "WHERE 1=1 AND i.archived_at IS NULL ORDER BY i.updated_at DESC, i.id ASC"
    ));
    assert!(query.params().is_empty());
}

#[test]
fn label_list_defaults_to_fifty_and_keeps_global_labels() {
    let query = ResolvedLabelFilter {
        team_id: Some("team_eng".to_string()),
        ..Default::default()
    }
    .compose();
    assert!(query.sql().contains("(team_id = ? OR team_id IS NULL)"));
    assert_eq!(query.params().last(), Some(&SqlValue::Integer(50)));
}

#[test]
fn issue_order_parses_only_created_at() {
    assert_eq!(IssueOrder::from_param(Some("createdAt")), IssueOrder::CreatedAt);
    assert_eq!(IssueOrder::from_param(Some("updatedAt")), IssueOrder::UpdatedAt);
    assert_eq!(IssueOrder::from_param(Some("bogus")), IssueOrder::UpdatedAt);
    assert_eq!(IssueOrder::from_param(None), IssueOrder::UpdatedAt);
}

#[tokio::test(flavor = "multi_thread")]
async fn unresolved_tokens_are_dropped_under_ignore() {
    let resolver = StubResolver::default().with(EntityKind::User, "ada", "user_ada");
    let filter = IssueFilter {
        team: Some("NOPE".to_string()),
        assignee: Some("ada".to_string()),
        ..Default::default()
    };

    let resolved = filter
        .resolve(&resolver, UnresolvedFilterPolicy::Ignore)
        .await
        .expect("resolve should succeed");

    assert_eq!(resolved.team_id, None);
    assert_eq!(resolved.assignee_id.as_deref(), Some("user_ada"));
    assert!(!resolved.compose().sql().contains("i.team_id"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unresolved_tokens_fail_under_reject() {
    let resolver = StubResolver::default();
    let filter = ProjectFilter {
        team: Some("NOPE".to_string()),
        ..Default::default()
    };

    let err = filter
        .resolve(&resolver, UnresolvedFilterPolicy::Reject)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { ref id, .. } if id == "NOPE"));
}

#[tokio::test(flavor = "multi_thread")]
async fn project_and_label_are_scoped_to_resolved_team() {
    let resolver = StubResolver::default()
        .with(EntityKind::Team, "ENG", "team_eng")
        .with(EntityKind::Project, "Launch", "proj_launch")
        .with(EntityKind::Label, "bug", "label_bug");
    let filter = IssueFilter {
        team: Some("ENG".to_string()),
        project: Some("Launch".to_string()),
        label: Some("bug".to_string()),
        ..Default::default()
    };

    let resolved = filter
        .resolve(&resolver, UnresolvedFilterPolicy::Ignore)
        .await
        .unwrap();
    assert_eq!(resolved.project_id.as_deref(), Some("proj_launch"));
    assert_eq!(resolved.label_id.as_deref(), Some("label_bug"));

    let calls = resolver.calls();
    let scope_of = |kind| {
        calls
            .iter()
            .find(|(k, _, _)| *k == kind)
            .and_then(|(_, _, scope)| scope.clone())
    };
    assert_eq!(scope_of(EntityKind::Team), None);
    assert_eq!(scope_of(EntityKind::Project).as_deref(), Some("team_eng"));
    assert_eq!(scope_of(EntityKind::Label).as_deref(), Some("team_eng"));
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_tokens_skip_the_resolver() {
    let resolver = StubResolver::default();
    let filter = LabelFilter {
        team: Some(String::new()),
        name: Some(String::new()),
        limit: Some(0),
    };

    let resolved = filter
        .resolve(&resolver, UnresolvedFilterPolicy::Reject)
        .await
        .unwrap();
    assert!(resolver.calls().is_empty());
    assert_eq!(resolved, ResolvedLabelFilter::default());
}
