//! Schema for the `SQLite` ledger.
//!
//! `prompt_versions` and `label_moves` are append-only; triggers reject any
//! `UPDATE` or `DELETE` on them. `labels` is the materialized current-pointer
//! view of `label_moves` and is the only mutable table.

use super::connection::sqlite_error;
use crate::{Error, Result};
use rusqlite::Connection;

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS prompt_versions (
    prompt_id TEXT NOT NULL,
    version INTEGER NOT NULL CHECK (version > 0),
    content TEXT NOT NULL,
    reason TEXT NOT NULL DEFAULT '',
    author TEXT NOT NULL DEFAULT '',
    tags TEXT NOT NULL DEFAULT '[]',
    metrics TEXT NOT NULL DEFAULT '{}',
    env TEXT,
    created_at TEXT NOT NULL,
    PRIMARY KEY (prompt_id, version)
);

CREATE TABLE IF NOT EXISTS label_moves (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    prompt_id TEXT NOT NULL,
    label TEXT NOT NULL,
    from_version INTEGER,
    to_version INTEGER NOT NULL,
    moved_at TEXT NOT NULL,
    actor TEXT,
    FOREIGN KEY (prompt_id, to_version) REFERENCES prompt_versions (prompt_id, version)
);

CREATE INDEX IF NOT EXISTS idx_label_moves_prompt ON label_moves (prompt_id, moved_at, id);

CREATE TABLE IF NOT EXISTS labels (
    prompt_id TEXT NOT NULL,
    name TEXT NOT NULL,
    version INTEGER NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (prompt_id, name),
    FOREIGN KEY (prompt_id, version) REFERENCES prompt_versions (prompt_id, version)
);

CREATE TRIGGER IF NOT EXISTS prompt_versions_immutable_update
BEFORE UPDATE ON prompt_versions
BEGIN
    SELECT RAISE(ABORT, 'prompt versions are immutable');
END;

CREATE TRIGGER IF NOT EXISTS prompt_versions_immutable_delete
BEFORE DELETE ON prompt_versions
BEGIN
    SELECT RAISE(ABORT, 'prompt versions are immutable');
END;

CREATE TRIGGER IF NOT EXISTS label_moves_immutable_update
BEFORE UPDATE ON label_moves
BEGIN
    SELECT RAISE(ABORT, 'label moves are immutable');
END;

CREATE TRIGGER IF NOT EXISTS label_moves_immutable_delete
BEFORE DELETE ON label_moves
BEGIN
    SELECT RAISE(ABORT, 'label moves are immutable');
END;
";

/// Creates the schema if missing and checks the stored schema version.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the schema cannot be created or the
/// file was written by a newer schema version.
pub fn initialize(conn: &Connection) -> Result<()> {
    let found: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| sqlite_error("read_schema_version", e))?;

    if found > SCHEMA_VERSION {
        return Err(Error::operation(
            "initialize_schema",
            format!("store has schema version {found}, this build supports up to {SCHEMA_VERSION}"),
        ));
    }

    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| sqlite_error("create_schema", e))?;

    if found < SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(|e| sqlite_error("write_schema_version", e))?;
        tracing::debug!(from = found, to = SCHEMA_VERSION, "initialized ledger schema");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
        assert!(matches!(
            initialize(&conn),
            Err(Error::OperationFailed { .. })
        ));
    }

    #[test]
    fn test_versions_cannot_be_updated_or_deleted() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn.execute(
            "INSERT INTO prompt_versions (prompt_id, version, content, created_at)
             VALUES ('p', 1, 'body', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        assert!(
            conn.execute("UPDATE prompt_versions SET content = 'x'", [])
                .is_err()
        );
        assert!(conn.execute("DELETE FROM prompt_versions", []).is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM prompt_versions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
