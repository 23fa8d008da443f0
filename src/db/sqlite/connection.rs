//! SQLite connection pool and schema bootstrap.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tracing::{info, instrument, warn};

use super::{
    SqliteCommentRepository, SqliteCycleRepository, SqliteIssueRepository, SqliteLabelRepository,
    SqliteProjectRepository, SqliteResolver, SqliteTeamRepository, SqliteUserRepository,
};
use crate::db::{DbError, DbResult, StatementFailurePolicy, UnresolvedFilterPolicy, split_statements};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CONNECTIONS: u32 = 8;

/// Outcome of running a schema script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub executed: usize,
    pub failed: usize,
}

/// SQLite database handle.
///
/// Repositories borrow the pool; the handle itself is cheap to share behind
/// an `Arc`.
pub struct SqliteDatabase {
    pool: SqlitePool,
    filter_policy: UnresolvedFilterPolicy,
}

impl SqliteDatabase {
    /// Open (creating if needed) a database file in WAL mode.
    pub async fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DbError::Connection {
                message: format!("Failed to create {}: {}", parent.display(), e),
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection {
                message: format!("Failed to open {}: {}", path.display(), e),
            })?;

        info!(path = %path.display(), "Opened database");
        Ok(Self::from_pool(pool))
    }

    /// Create an in-memory database (useful for testing).
    ///
    /// Every pooled connection to `:memory:` would see its own database, so
    /// the pool holds exactly one connection that is never recycled.
    pub async fn in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self::from_pool(pool))
    }

    fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            filter_policy: UnresolvedFilterPolicy::default(),
        }
    }

    /// Set how list filters and optional associations treat tokens that do
    /// not resolve.
    pub fn with_filter_policy(mut self, policy: UnresolvedFilterPolicy) -> Self {
        self.filter_policy = policy;
        self
    }

    pub fn filter_policy(&self) -> UnresolvedFilterPolicy {
        self.filter_policy
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Execute a schema script statement by statement, in source order.
    #[instrument(skip(self, script), fields(bytes = script.len()))]
    pub async fn bootstrap(
        &self,
        script: &str,
        policy: StatementFailurePolicy,
    ) -> DbResult<BootstrapReport> {
        let mut report = BootstrapReport::default();

        for (index, statement) in split_statements(script).iter().enumerate() {
            match sqlx::raw_sql(statement).execute(&self.pool).await {
                Ok(_) => report.executed += 1,
                Err(e) => match policy {
                    StatementFailurePolicy::Ignore => {
                        report.failed += 1;
                        warn!(statement = index + 1, error = %e, "Ignoring failed schema statement");
                    }
                    StatementFailurePolicy::Abort => {
                        return Err(DbError::Bootstrap {
                            message: format!("statement {} failed: {}", index + 1, e),
                        });
                    }
                },
            }
        }

        info!(
            executed = report.executed,
            failed = report.failed,
            "Schema bootstrap finished"
        );
        Ok(report)
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn resolver(&self) -> SqliteResolver<'_> {
        SqliteResolver { pool: &self.pool }
    }

    pub fn teams(&self) -> SqliteTeamRepository<'_> {
        SqliteTeamRepository { pool: &self.pool }
    }

    pub fn users(&self) -> SqliteUserRepository<'_> {
        SqliteUserRepository { pool: &self.pool }
    }

    pub fn projects(&self) -> SqliteProjectRepository<'_> {
        SqliteProjectRepository {
            pool: &self.pool,
            policy: self.filter_policy,
        }
    }

    pub fn issues(&self) -> SqliteIssueRepository<'_> {
        SqliteIssueRepository {
            pool: &self.pool,
            policy: self.filter_policy,
        }
    }

    pub fn labels(&self) -> SqliteLabelRepository<'_> {
        SqliteLabelRepository {
            pool: &self.pool,
            policy: self.filter_policy,
        }
    }

    pub fn cycles(&self) -> SqliteCycleRepository<'_> {
        SqliteCycleRepository { pool: &self.pool }
    }

    pub fn comments(&self) -> SqliteCommentRepository<'_> {
        SqliteCommentRepository { pool: &self.pool }
    }
}
