//! Persistence for immutable object snapshots (`objects` table).

use rewind_types::{ObjectId, ObjectRow};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbError;

/// Operations on the `objects` table.
pub struct ObjectStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ObjectStore<'a> {
    /// Create a new object store bound to a connection pool.
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert object rows on an open connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if any insert fails (e.g. a duplicate id).
    pub async fn insert_all(conn: &mut SqliteConnection, rows: &[ObjectRow]) -> Result<(), DbError> {
        for row in rows {
            sqlx::query("INSERT INTO objects (id, data) VALUES (?1, ?2)")
                .bind(row.id.to_db())
                .bind(&row.data)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Fetch the codec text of one object.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn data(&self, id: ObjectId) -> Result<Option<String>, DbError> {
        let data = sqlx::query_scalar::<_, String>("SELECT data FROM objects WHERE id = ?1")
            .bind(id.to_db())
            .fetch_optional(self.pool)
            .await?;
        Ok(data)
    }

    /// Number of stored objects.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn count(&self) -> Result<u64, DbError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM objects")
            .fetch_one(self.pool)
            .await?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}
