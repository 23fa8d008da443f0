//! Identifier resolution.
//!
//! Turns a loosely typed token (canonical id, name, key, email, issue
//! identifier, or `"me"`) into the canonical id of an entity with a single
//! store round trip.
//!
//! Match precedence is explicit rather than left to row order:
//!
//! 1. a row whose canonical id equals the token,
//! 2. when a scope is given, rows inside the scope before global rows,
//! 3. the most recently updated row,
//! 4. the lowest id.

use std::future::Future;

use crate::db::{ComposedQuery, DbError, DbResult, EntityKind, Id};

/// Token that resolves to the acting user.
pub const ME_TOKEN: &str = "me";

/// Resolves tokens to canonical ids.
pub trait IdResolver: Send + Sync {
    /// Resolve `token` for `kind`, optionally within the `scope` parent id.
    ///
    /// Empty or absent tokens resolve to `None` without a store call.
    fn resolve(
        &self,
        kind: EntityKind,
        token: Option<&str>,
        scope: Option<&str>,
    ) -> impl Future<Output = DbResult<Option<Id>>> + Send;

    /// Like [`IdResolver::resolve`], but a miss is a not-found error.
    fn resolve_required(
        &self,
        kind: EntityKind,
        token: &str,
        scope: Option<&str>,
    ) -> impl Future<Output = DbResult<Id>> + Send {
        async move {
            self.resolve(kind, Some(token), scope)
                .await?
                .ok_or_else(|| DbError::not_found(kind.display_name(), token))
        }
    }
}

/// Build the lookup query for a token, or `None` when the token is empty.
pub fn resolution_query(
    kind: EntityKind,
    token: Option<&str>,
    scope: Option<&str>,
) -> Option<ComposedQuery> {
    let token = token.filter(|t| !t.is_empty())?;

    if kind == EntityKind::User && token == ME_TOKEN {
        let mut query = ComposedQuery::new("SELECT id FROM users");
        query.push_static("ORDER BY created_at ASC, id ASC LIMIT 1");
        return Some(query);
    }

    let alt_count = kind.alternate_keys().len();
    let mut query = ComposedQuery::new(select_clause(kind));
    query.push("WHERE id = ?", [token]);

    match (scope.filter(|s| !s.is_empty()), scoped_alternate_predicate(kind)) {
        (Some(scope), Some(predicate)) => {
            let values = std::iter::repeat_n(token.to_string(), alt_count)
                .chain(std::iter::once(scope.to_string()));
            query.push(predicate, values);
            query.push("ORDER BY (id = ?) DESC, (team_id IS NULL) ASC,", [token]);
        }
        _ => {
            query.push(alternate_predicate(kind), std::iter::repeat_n(token, alt_count));
            query.push("ORDER BY (id = ?) DESC,", [token]);
        }
    }
    query.push_static("updated_at DESC, id ASC LIMIT 1");
    Some(query)
}

fn select_clause(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Team => "SELECT id FROM teams",
        EntityKind::User => "SELECT id FROM users",
        EntityKind::Project => "SELECT id FROM projects",
        EntityKind::Issue => "SELECT id FROM issues",
        EntityKind::Label => "SELECT id FROM labels",
        EntityKind::Cycle => "SELECT id FROM cycles",
    }
}

/// Disjunction over the alternate keys of `kind`.
fn alternate_predicate(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Team => "OR (name = ? OR key = ?)",
        EntityKind::User => "OR (email = ? OR name = ?)",
        EntityKind::Issue => "OR (identifier = ?)",
        EntityKind::Project | EntityKind::Label | EntityKind::Cycle => "OR (name = ?)",
    }
}

/// Alternate-key disjunction restricted to a scope, with global rows kept.
fn scoped_alternate_predicate(kind: EntityKind) -> Option<&'static str> {
    match kind.scope_column()? {
        "team_id" => Some("OR (name = ? AND (team_id = ? OR team_id IS NULL))"),
        _ => None,
    }
}
