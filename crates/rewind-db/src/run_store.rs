//! Metadata about completed replays (`replay_runs` table).

use chrono::{DateTime, Utc};
use rewind_types::Clock;
use sqlx::SqlitePool;

use crate::error::DbError;

/// One completed replay of an event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRun {
    /// The log file the history was built from.
    pub log_path: String,
    /// When ingestion started.
    pub started_at: DateTime<Utc>,
    /// When the final batch was committed.
    pub finished_at: DateTime<Utc>,
    /// Number of log lines read.
    pub lines: u64,
    /// The last clock value consumed.
    pub final_clock: Clock,
}

/// Operations on the `replay_runs` table.
pub struct RunStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RunStore<'a> {
    /// Create a new run store bound to a connection pool.
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a completed replay.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the insert fails.
    pub async fn insert(&self, run: &ReplayRun) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO replay_runs (log_path, started_at, finished_at, lines, final_clock)
              VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&run.log_path)
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(i64::try_from(run.lines).unwrap_or(i64::MAX))
        .bind(run.final_clock.to_db())
        .execute(self.pool)
        .await?;

        tracing::debug!(log_path = run.log_path.as_str(), "Recorded replay run");
        Ok(())
    }

    /// The most recently recorded replay, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn latest(&self) -> Result<Option<ReplayRun>, DbError> {
        let record = sqlx::query_as::<_, RunRecord>(
            r"SELECT log_path, started_at, finished_at, lines, final_clock
              FROM replay_runs
              ORDER BY id DESC
              LIMIT 1",
        )
        .fetch_optional(self.pool)
        .await?;

        Ok(record.map(|r| ReplayRun {
            log_path: r.log_path,
            started_at: r.started_at,
            finished_at: r.finished_at,
            lines: u64::try_from(r.lines).unwrap_or(0),
            final_clock: Clock::from_db(r.final_clock),
        }))
    }
}

/// A raw row from the `replay_runs` table.
#[derive(Debug, sqlx::FromRow)]
struct RunRecord {
    log_path: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    lines: i64,
    final_clock: i64,
}
