//! Write side of the searchable table.
//!
//! The persistence layer of the indexed records calls into [`SearchTable`]
//! whenever a record's indexable content changes. Search itself only reads.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::db::schema::{apply_schema, initialize_database};
use crate::error::{FulltextError, Result};
use crate::search::dialect::fts_table;
use crate::types::{is_word, SearchableRow};

/// Typed CRUD wrapper around the searchable table.
///
/// Statements go through [`Connection::prepare_cached`], keyed by the SQL
/// text generated for this table.
pub struct SearchTable {
    pub conn: Connection,
    table: String,
}

impl std::fmt::Debug for SearchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchTable")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl SearchTable {
    /// Open (or create) the database at `db_path` with the schema applied.
    pub fn new(db_path: &str, table: &str) -> Result<Self> {
        let conn = initialize_database(db_path, table)?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    /// Wrap an already-open connection, applying the schema if missing.
    pub fn from_connection(conn: Connection, table: &str) -> Result<Self> {
        if !is_word(table) {
            return Err(FulltextError::InvalidTableName(table.to_string()));
        }
        apply_schema(&conn, table)?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn upsert_sql(&self) -> String {
        format!(
            "\
INSERT INTO {} (owner_type, owner_id, parent_id, value)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(owner_type, owner_id) DO UPDATE SET
  parent_id = excluded.parent_id,
  value = excluded.value",
            self.table
        )
    }

    // -------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------

    /// Insert a row, or refresh `value` and `parent_id` of the existing row
    /// for the same `(owner_type, owner_id)`.
    pub fn upsert_row(&self, row: &SearchableRow) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(&self.upsert_sql())?;
        stmt.execute(params![row.owner_type, row.owner_id, row.parent_id, row.value])?;
        Ok(())
    }

    /// Batch upsert inside a single transaction.
    pub fn upsert_rows(&self, rows: &[SearchableRow]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(&self.upsert_sql())?;
            for row in rows {
                stmt.execute(params![row.owner_type, row.owner_id, row.parent_id, row.value])?;
            }
        }
        tx.commit()?;
        tracing::debug!(rows = rows.len(), table = %self.table, "indexed rows");
        Ok(())
    }

    /// Remove the row for one record. Returns whether a row existed.
    pub fn remove_row(&self, owner_type: &str, owner_id: i64) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE owner_type = ?1 AND owner_id = ?2",
            self.table
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        Ok(stmt.execute(params![owner_type, owner_id])? > 0)
    }

    /// Remove every row of one owner type. Returns the number removed.
    pub fn remove_owner_type(&self, owner_type: &str) -> Result<usize> {
        let sql = format!("DELETE FROM {} WHERE owner_type = ?1", self.table);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        Ok(stmt.execute(params![owner_type])?)
    }

    /// Rebuild the FTS5 index from the content table, for databases filled
    /// by bulk imports that bypassed the triggers.
    pub fn rebuild_index(&self) -> Result<()> {
        let fts = fts_table(&self.table);
        self.conn
            .execute_batch(&format!("INSERT INTO {fts}({fts}) VALUES ('rebuild')"))?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    pub fn get_row(&self, owner_type: &str, owner_id: i64) -> Result<Option<SearchableRow>> {
        let sql = format!(
            "SELECT owner_type, owner_id, parent_id, value FROM {} \
             WHERE owner_type = ?1 AND owner_id = ?2",
            self.table
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let row = stmt
            .query_row(params![owner_type, owner_id], |row| {
                Ok(SearchableRow {
                    owner_type: row.get(0)?,
                    owner_id: row.get(1)?,
                    parent_id: row.get(2)?,
                    value: row.get(3)?,
                })
            })
            .optional()?;
        Ok(row)
    }

    /// Rows of one owner type whose ids are in `ids`, in no particular order.
    pub fn get_rows(&self, owner_type: &str, ids: &[i64]) -> Result<Vec<SearchableRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT owner_type, owner_id, parent_id, value FROM {} \
             WHERE owner_type = ? AND owner_id IN ({})",
            self.table,
            vec!["?"; ids.len()].join(", ")
        );
        let params = std::iter::once(Value::Text(owner_type.to_string()))
            .chain(ids.iter().copied().map(Value::Integer));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| {
            Ok(SearchableRow {
                owner_type: row.get(0)?,
                owner_id: row.get(1)?,
                parent_id: row.get(2)?,
                value: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Distinct owner types present in the table, sorted.
    pub fn owner_types(&self) -> Result<Vec<String>> {
        let sql = format!("SELECT DISTINCT owner_type FROM {} ORDER BY owner_type", self.table);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let types = stmt.query_map([], |row| row.get(0))?;
        Ok(types.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    pub fn row_count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
