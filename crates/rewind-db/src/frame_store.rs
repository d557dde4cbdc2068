//! Persistence for frame activations (`fun_calls`) and the source files
//! they run (`code_files`).
//!
//! Cell and free variable maps are stored as JSON objects of name to slot.
//! Frames form a forest through `parent_id`; [`FrameStore::call_stack`]
//! walks it from a frame to the outermost activation.

use std::collections::BTreeMap;

use rewind_types::{CodeFileId, CodeFileRow, FrameId, FunCallRow, SlotId};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbError;

/// Operations on the `fun_calls` and `code_files` tables.
pub struct FrameStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FrameStore<'a> {
    /// Create a new frame store bound to a connection pool.
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert code file rows on an open connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if any insert fails.
    pub async fn insert_code_files(
        conn: &mut SqliteConnection,
        rows: &[CodeFileRow],
    ) -> Result<(), DbError> {
        for row in rows {
            sqlx::query("INSERT INTO code_files (id, path, source) VALUES (?1, ?2, ?3)")
                .bind(row.id.to_db())
                .bind(&row.path)
                .bind(&row.source)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Insert frame rows on an open connection or transaction.
    ///
    /// Rows must be in id order so every parent precedes its children.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if a variable map cannot be
    /// encoded, or [`DbError::Sqlite`] if an insert fails.
    pub async fn insert_fun_calls(
        conn: &mut SqliteConnection,
        rows: &[FunCallRow],
    ) -> Result<(), DbError> {
        for row in rows {
            let cell_vars = serde_json::to_string(&row.cell_vars)?;
            let free_vars = serde_json::to_string(&row.free_vars)?;
            sqlx::query(
                r"INSERT INTO fun_calls
                  (id, name, locals_slot, globals_slot, cell_vars, free_vars, parent_id, code_file_id)
                  VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(row.id.to_db())
            .bind(&row.name)
            .bind(row.locals_slot.to_db())
            .bind(row.globals_slot.to_db())
            .bind(cell_vars)
            .bind(free_vars)
            .bind(row.parent.map(FrameId::to_db))
            .bind(row.code_file.to_db())
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Fetch one frame activation.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a variable map is corrupt.
    pub async fn fun_call(&self, id: FrameId) -> Result<Option<FunCallRow>, DbError> {
        let record = sqlx::query_as::<_, FunCallRecord>(
            r"SELECT id, name, locals_slot, globals_slot, cell_vars, free_vars, parent_id, code_file_id
              FROM fun_calls
              WHERE id = ?1",
        )
        .bind(id.to_db())
        .fetch_optional(self.pool)
        .await?;
        record.map(FunCallRecord::into_row).transpose()
    }

    /// The chain of activations from `frame` up to the outermost one,
    /// innermost first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::CorruptRow`] if a frame in the chain is missing or
    /// the parent links loop.
    pub async fn call_stack(&self, frame: FrameId) -> Result<Vec<FunCallRow>, DbError> {
        let mut stack: Vec<FunCallRow> = Vec::new();
        let mut next = Some(frame);
        while let Some(id) = next {
            if stack.iter().any(|f| f.id == id) {
                return Err(DbError::CorruptRow {
                    table: "fun_calls",
                    reason: format!("parent chain of frame {frame} loops at {id}"),
                });
            }
            let row = self.fun_call(id).await?.ok_or_else(|| DbError::CorruptRow {
                table: "fun_calls",
                reason: format!("frame {id} is referenced but missing"),
            })?;
            next = row.parent;
            stack.push(row);
        }
        Ok(stack)
    }

    /// Fetch one recorded source file.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the query fails.
    pub async fn code_file(&self, id: CodeFileId) -> Result<Option<CodeFileRow>, DbError> {
        let row = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, path, source FROM code_files WHERE id = ?1",
        )
        .bind(id.to_db())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|(id, path, source)| CodeFileRow {
            id: CodeFileId::from_db(id),
            path,
            source,
        }))
    }
}

/// A raw row from the `fun_calls` table.
#[derive(Debug, sqlx::FromRow)]
struct FunCallRecord {
    id: i64,
    name: String,
    locals_slot: i64,
    globals_slot: i64,
    cell_vars: String,
    free_vars: String,
    parent_id: Option<i64>,
    code_file_id: i64,
}

impl FunCallRecord {
    fn into_row(self) -> Result<FunCallRow, DbError> {
        let cell_vars: BTreeMap<String, SlotId> = serde_json::from_str(&self.cell_vars)?;
        let free_vars: BTreeMap<String, SlotId> = serde_json::from_str(&self.free_vars)?;
        Ok(FunCallRow {
            id: FrameId::from_db(self.id),
            name: self.name,
            locals_slot: SlotId::from_db(self.locals_slot),
            globals_slot: SlotId::from_db(self.globals_slot),
            cell_vars,
            free_vars,
            parent: self.parent_id.map(FrameId::from_db),
            code_file: CodeFileId::from_db(self.code_file_id),
        })
    }
}
