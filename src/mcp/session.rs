//! Session lifecycle for the streamable HTTP transport.
//!
//! A session is created by `initialize`, refreshed by every call routed
//! through it, and ends when the client deletes it, when it sits idle past
//! [`SESSION_TIMEOUT`], when its transport is closed elsewhere, or at
//! shutdown. The registry and each session's last-activity timestamp live in
//! one `DashMap`, so a touch and a sweep of the same session never interleave.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::{debug, info};

use super::protocol::METHOD_INITIALIZE;

/// How often idle sessions are swept.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
/// Idle time after which a session expires.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(300);

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Fresh opaque session id shaped like a UUID.
pub fn new_session_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let seq = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);

    let mut hasher = Sha256::new();
    hasher.update(nanos.to_le_bytes());
    hasher.update(seq.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    let digest = hasher.finalize();

    let hex: String = digest.iter().take(16).map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Per-session channel that calls run through.
///
/// Closing it cancels any call still in flight on it.
#[derive(Debug, Clone)]
pub struct SessionTransport {
    id: String,
    token: CancellationToken,
}

impl SessionTransport {
    fn new(id: String) -> Self {
        Self {
            id,
            token: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the transport is closed.
    pub fn closed(&self) -> WaitForCancellationFutureOwned {
        self.token.clone().cancelled_owned()
    }

    /// Drive `call` to completion unless the transport closes first.
    pub async fn run<F: Future>(&self, call: F) -> Option<F::Output> {
        tokio::select! {
            output = call => Some(output),
            _ = self.token.cancelled() => {
                debug!(session = %self.id, "Call cancelled by transport close");
                None
            }
        }
    }
}

#[derive(Debug)]
struct SessionEntry {
    transport: SessionTransport,
    last_activity: Instant,
}

/// Where an inbound call goes.
#[derive(Debug)]
pub enum Route {
    /// `initialize`: open a new session and run the call through it.
    Initialize,
    /// Known live session.
    Session(SessionTransport),
    /// No usable session; run against the dispatcher directly.
    Stateless,
    /// No usable session and stateless calls are disabled.
    Reject,
}

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Idle past the timeout; closed and removed.
    pub expired: usize,
    /// Transport already closed; removed.
    pub closed: usize,
}

#[derive(Debug)]
pub struct SessionManager {
    sessions: DashMap<String, SessionEntry>,
    stateless_fallback: bool,
}

impl SessionManager {
    pub fn new(stateless_fallback: bool) -> Self {
        Self {
            sessions: DashMap::new(),
            stateless_fallback,
        }
    }

    pub fn stateless_fallback(&self) -> bool {
        self.stateless_fallback
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Decide how to run a call for `method` carrying `session_id`.
    pub fn route(&self, method: &str, session_id: Option<&str>) -> Route {
        if method == METHOD_INITIALIZE {
            return Route::Initialize;
        }
        if let Some(transport) = session_id.and_then(|id| self.touch(id)) {
            return Route::Session(transport);
        }
        if self.stateless_fallback {
            debug!(method, session = ?session_id, "No live session; running stateless");
            Route::Stateless
        } else {
            debug!(method, session = ?session_id, "No live session; rejecting");
            Route::Reject
        }
    }

    /// Open and register a new session.
    pub fn create(&self) -> SessionTransport {
        let transport = SessionTransport::new(new_session_id());
        self.sessions.insert(
            transport.id.clone(),
            SessionEntry {
                transport: transport.clone(),
                last_activity: Instant::now(),
            },
        );
        info!(session = %transport.id, active = self.sessions.len(), "Session created");
        transport
    }

    /// Refresh a session's last activity and hand out its transport.
    ///
    /// Returns `None` for unknown sessions. A session whose transport was
    /// closed elsewhere is removed instead of refreshed.
    pub fn touch(&self, id: &str) -> Option<SessionTransport> {
        self.touch_at(id, Instant::now())
    }

    pub(crate) fn touch_at(&self, id: &str, now: Instant) -> Option<SessionTransport> {
        let mut entry = self.sessions.get_mut(id)?;
        if entry.transport.is_closed() {
            drop(entry);
            self.sessions
                .remove_if(id, |_, session| session.transport.is_closed());
            debug!(session = %id, "Removed session with closed transport");
            return None;
        }
        entry.last_activity = now;
        Some(entry.transport.clone())
    }

    /// Close and deregister a session. Returns false for unknown ids.
    pub fn close(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                session.transport.close();
                info!(session = %id, "Session terminated");
                true
            }
            None => false,
        }
    }

    /// Close and remove idle sessions, and drop sessions whose transport
    /// is already closed.
    pub fn sweep(&self) -> SweepReport {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> SweepReport {
        let mut report = SweepReport::default();
        self.sessions.retain(|id, session| {
            if session.transport.is_closed() {
                debug!(session = %id, "Session transport closed");
                report.closed += 1;
                return false;
            }
            let idle = now.saturating_duration_since(session.last_activity);
            if idle > SESSION_TIMEOUT {
                session.transport.close();
                info!(session = %id, idle_secs = idle.as_secs(), "Session expired");
                report.expired += 1;
                return false;
            }
            true
        });
        report
    }

    /// Close every remaining session.
    pub fn close_all(&self) -> usize {
        let ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        let mut closed = 0;
        for id in ids {
            if let Some((_, session)) = self.sessions.remove(&id) {
                session.transport.close();
                closed += 1;
            }
        }
        if closed > 0 {
            info!(closed, "Closed remaining sessions");
        }
        closed
    }

    /// Sweep every [`SWEEP_INTERVAL`] until `shutdown` is cancelled.
    pub fn spawn_sweeper(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let report = self.sweep();
                        if report != SweepReport::default() {
                            debug!(?report, active = self.len(), "Session sweep");
                        }
                    }
                    _ = shutdown.cancelled() => break,
                }
            }
        })
    }
}
