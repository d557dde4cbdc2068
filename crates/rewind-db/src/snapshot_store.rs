//! Persistence for snapshots and the errors they may carry.
//!
//! A snapshot is one addressable instant of the replay: the executing
//! frame, the last committed clock, and the source line. Snapshots taken
//! when an exception was raised point at an `errors` row.

use rewind_types::{Clock, ErrorId, ErrorRow, FrameId, SnapshotId, SnapshotRow};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbError;

/// Operations on the `snapshots` and `errors` tables.
pub struct SnapshotStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SnapshotStore<'a> {
    /// Create a new snapshot store bound to a connection pool.
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert error rows on an open connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if any insert fails.
    pub async fn insert_errors(conn: &mut SqliteConnection, rows: &[ErrorRow]) -> Result<(), DbError> {
        for row in rows {
            sqlx::query("INSERT INTO errors (id, message) VALUES (?1, ?2)")
                .bind(row.id.to_db())
                .bind(&row.message)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Insert snapshot rows on an open connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if any insert fails.
    pub async fn insert_snapshots(
        conn: &mut SqliteConnection,
        rows: &[SnapshotRow],
    ) -> Result<(), DbError> {
        for row in rows {
            sqlx::query(
                r"INSERT INTO snapshots (id, frame_id, clock, line_no, error_id)
                  VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(row.id.to_db())
            .bind(row.frame.to_db())
            .bind(row.clock.to_db())
            .bind(i64::from(row.line_no))
            .bind(row.error.map(ErrorId::to_db))
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Fetch one snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or the row is corrupt.
    pub async fn snapshot(&self, id: SnapshotId) -> Result<Option<SnapshotRow>, DbError> {
        let record = sqlx::query_as::<_, SnapshotRecord>(
            "SELECT id, frame_id, clock, line_no, error_id FROM snapshots WHERE id = ?1",
        )
        .bind(id.to_db())
        .fetch_optional(self.pool)
        .await?;
        record.map(SnapshotRecord::into_row).transpose()
    }

    /// Every snapshot in timeline order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a row is corrupt.
    pub async fn all(&self) -> Result<Vec<SnapshotRow>, DbError> {
        let records = sqlx::query_as::<_, SnapshotRecord>(
            "SELECT id, frame_id, clock, line_no, error_id FROM snapshots ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;
        records.into_iter().map(SnapshotRecord::into_row).collect()
    }

    /// Fetch one error message.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn error(&self, id: ErrorId) -> Result<Option<ErrorRow>, DbError> {
        let message = sqlx::query_scalar::<_, String>("SELECT message FROM errors WHERE id = ?1")
            .bind(id.to_db())
            .fetch_optional(self.pool)
            .await?;
        Ok(message.map(|message| ErrorRow { id, message }))
    }
}

/// A raw row from the `snapshots` table.
#[derive(Debug, sqlx::FromRow)]
struct SnapshotRecord {
    id: i64,
    frame_id: i64,
    clock: i64,
    line_no: i64,
    error_id: Option<i64>,
}

impl SnapshotRecord {
    fn into_row(self) -> Result<SnapshotRow, DbError> {
        let line_no = u32::try_from(self.line_no).map_err(|e| DbError::CorruptRow {
            table: "snapshots",
            reason: format!("line number {} out of range: {e}", self.line_no),
        })?;
        Ok(SnapshotRow {
            id: SnapshotId::from_db(self.id),
            frame: FrameId::from_db(self.frame_id),
            clock: Clock::from_db(self.clock),
            line_no,
            error: self.error_id.map(ErrorId::from_db),
        })
    }
}
