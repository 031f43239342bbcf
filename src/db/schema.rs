//! SQLite schema for the shared searchable table.
//!
//! One plain table holds a row per indexed record; an FTS5 external-content
//! table `<table>_fts` indexes its `value` column and is kept in sync by
//! triggers, so writers only ever touch the plain table.

use rusqlite::Connection;

use crate::error::{FulltextError, Result};
use crate::search::dialect::fts_table;
use crate::types::is_word;

/// Table name used when configuration does not override it.
pub const DEFAULT_TABLE: &str = "fulltext_rows";

// ---------------------------------------------------------------------------
// DDL builders. The table name is validated before it reaches any of these.
// ---------------------------------------------------------------------------

fn create_rows(t: &str) -> String {
    format!(
        "\
CREATE TABLE IF NOT EXISTS {t} (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  owner_type TEXT NOT NULL,
  owner_id INTEGER NOT NULL,
  parent_id INTEGER,
  value TEXT NOT NULL DEFAULT '',
  UNIQUE (owner_type, owner_id)
)"
    )
}

fn create_indexes(t: &str) -> Vec<String> {
    vec![
        format!("CREATE INDEX IF NOT EXISTS idx_{t}_parent ON {t}(parent_id)"),
        format!("CREATE INDEX IF NOT EXISTS idx_{t}_type ON {t}(owner_type)"),
    ]
}

// FTS5 -------------------------------------------------------------------

fn create_fts(t: &str) -> String {
    let fts = fts_table(t);
    format!(
        "\
CREATE VIRTUAL TABLE IF NOT EXISTS {fts} USING fts5(
  value,
  content='{t}', content_rowid='id'
)"
    )
}

fn create_fts_triggers(t: &str) -> Vec<String> {
    let fts = fts_table(t);
    vec![
        format!(
            "\
CREATE TRIGGER IF NOT EXISTS {t}_ai AFTER INSERT ON {t} BEGIN
  INSERT INTO {fts}(rowid, value) VALUES (new.id, new.value);
END"
        ),
        format!(
            "\
CREATE TRIGGER IF NOT EXISTS {t}_ad AFTER DELETE ON {t} BEGIN
  INSERT INTO {fts}({fts}, rowid, value) VALUES ('delete', old.id, old.value);
END"
        ),
        format!(
            "\
CREATE TRIGGER IF NOT EXISTS {t}_au AFTER UPDATE ON {t} BEGIN
  INSERT INTO {fts}({fts}, rowid, value) VALUES ('delete', old.id, old.value);
  INSERT INTO {fts}(rowid, value) VALUES (new.id, new.value);
END"
        ),
    ]
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Open (or create) the SQLite database at `db_path` and apply the schema
/// for `table`.
///
/// The returned connection has WAL mode and synchronous NORMAL configured.
///
/// # Errors
///
/// [`FulltextError::InvalidTableName`] if `table` is not a plain identifier,
/// otherwise any `rusqlite` error from opening or DDL.
pub fn initialize_database(db_path: &str, table: &str) -> Result<Connection> {
    if !is_word(table) {
        return Err(FulltextError::InvalidTableName(table.to_string()));
    }

    let conn = Connection::open(db_path)?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    apply_schema(&conn, table)?;
    Ok(conn)
}

/// Apply the schema for `table` to an already-open connection.
pub fn apply_schema(conn: &Connection, table: &str) -> Result<()> {
    if !is_word(table) {
        return Err(FulltextError::InvalidTableName(table.to_string()));
    }

    conn.execute_batch(&create_rows(table))?;
    for ddl in create_indexes(table) {
        conn.execute_batch(&ddl)?;
    }

    conn.execute_batch(&create_fts(table))?;
    for trigger in create_fts_triggers(table) {
        conn.execute_batch(&trigger)?;
    }

    tracing::debug!(table, "full-text schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'trigger') ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn creates_rows_fts_and_triggers() {
        let conn = initialize_database(":memory:", DEFAULT_TABLE).unwrap();
        let names = table_names(&conn);
        for expected in [
            "fulltext_rows",
            "fulltext_rows_fts",
            "fulltext_rows_ai",
            "fulltext_rows_ad",
            "fulltext_rows_au",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}: {names:?}");
        }
    }

    #[test]
    fn custom_table_name() {
        let conn = initialize_database(":memory:", "search_index").unwrap();
        let names = table_names(&conn);
        assert!(names.iter().any(|n| n == "search_index_fts"));
    }

    #[test]
    fn applying_twice_is_harmless() {
        let conn = initialize_database(":memory:", DEFAULT_TABLE).unwrap();
        apply_schema(&conn, DEFAULT_TABLE).unwrap();
    }

    #[test]
    fn rejects_unsafe_table_names() {
        let err = initialize_database(":memory:", "rows; DROP TABLE x").unwrap_err();
        assert!(matches!(err, FulltextError::InvalidTableName(_)));
    }

    #[test]
    fn unique_owner_pair_is_enforced() {
        let conn = initialize_database(":memory:", DEFAULT_TABLE).unwrap();
        conn.execute(
            "INSERT INTO fulltext_rows (owner_type, owner_id, value) VALUES ('A', 1, 'x')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO fulltext_rows (owner_type, owner_id, value) VALUES ('A', 1, 'y')",
            [],
        );
        assert!(dup.is_err());
    }
}
