//! Database utility functions.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{SecondsFormat, Utc};

use crate::db::EntityKind;

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Generate an id of the form `<prefix>_<time hex><sequence hex>`.
///
/// Uniqueness is advisory: a collision is rejected by the primary key and
/// surfaces as a constraint error on insert.
pub fn generate_entity_id(kind: EntityKind) -> String {
    generate_id(kind.id_prefix())
}

/// Generate an id for rows that are never resolved by token (milestones,
/// comments).
pub fn generate_id(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) & 0xffff;
    format!("{}_{:x}{:04x}", prefix, nanos, seq)
}

/// Current UTC time as an RFC 3339 string with microsecond precision.
///
/// Fixed width, so timestamps sort lexicographically in SQL.
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
