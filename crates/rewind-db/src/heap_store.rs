//! Persistence and point-in-time reads for the heap version table.
//!
//! Each row says "from clock `clock` on, slot `slot_id` holds object
//! `object_id`". Reading a slot as of clock V selects the row with the
//! greatest clock not exceeding V; the `(slot_id, clock)` primary key makes
//! that a single index seek.

use rewind_types::{Clock, HeapVersionRow, ObjectId, SlotId};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbError;

/// Operations on the `heap_versions` table.
pub struct HeapStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> HeapStore<'a> {
    /// Create a new heap store bound to a connection pool.
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert version rows on an open connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if any insert fails. A repeated
    /// `(slot, clock)` pair violates the primary key.
    pub async fn insert_all(
        conn: &mut SqliteConnection,
        rows: &[HeapVersionRow],
    ) -> Result<(), DbError> {
        for row in rows {
            sqlx::query("INSERT INTO heap_versions (slot_id, clock, object_id) VALUES (?1, ?2, ?3)")
                .bind(row.slot.to_db())
                .bind(row.clock.to_db())
                .bind(row.object.to_db())
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// The object `slot` held as of `clock`, or `None` if the slot had not
    /// been written by then.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn read_as_of(&self, slot: SlotId, clock: Clock) -> Result<Option<ObjectId>, DbError> {
        let id = sqlx::query_scalar::<_, i64>(
            r"SELECT object_id FROM heap_versions
              WHERE slot_id = ?1 AND clock <= ?2
              ORDER BY clock DESC
              LIMIT 1",
        )
        .bind(slot.to_db())
        .bind(clock.to_db())
        .fetch_optional(self.pool)
        .await?;
        Ok(id.map(ObjectId::from_db))
    }

    /// The full version history of one slot, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn history(&self, slot: SlotId) -> Result<Vec<HeapVersionRow>, DbError> {
        let rows = sqlx::query_as::<_, (i64, i64, i64)>(
            r"SELECT slot_id, clock, object_id FROM heap_versions
              WHERE slot_id = ?1
              ORDER BY clock",
        )
        .bind(slot.to_db())
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(version_row).collect())
    }

    /// Every version row in clock order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn all(&self) -> Result<Vec<HeapVersionRow>, DbError> {
        let rows = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT slot_id, clock, object_id FROM heap_versions ORDER BY clock",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(version_row).collect())
    }
}

fn version_row((slot, clock, object): (i64, i64, i64)) -> HeapVersionRow {
    HeapVersionRow {
        slot: SlotId::from_db(slot),
        clock: Clock::from_db(clock),
        object: ObjectId::from_db(object),
    }
}
