//! `SQLite`-based ledger store.
//!
//! One database file holds the version ledger, the label move log, and the
//! label pointer table. Every mutation runs in a `BEGIN IMMEDIATE`
//! transaction, so several handles (or processes) on one file serialize their
//! writes and never hand out the same version number twice.

use super::connection::{acquire_lock, configure_connection, sqlite_error};
use super::rows::{
    LABEL_COLUMNS, LabelRow, MOVE_COLUMNS, MoveRow, VERSION_COLUMNS, VersionRow, format_timestamp,
    to_version,
};
use super::schema;
use crate::models::{
    LabelMove, LabelView, NewVersion, PromptStatus, PromptVersion, validate_label_name,
    validate_prompt_id,
};
use crate::storage::LedgerStore;
use crate::{Error, Result, current_timestamp};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// `SQLite`-based ledger store.
pub struct SqliteLedgerStore {
    /// Connection to the `SQLite` database.
    conn: Mutex<Connection>,
    /// Path to the `SQLite` database.
    db_path: PathBuf,
}

impl SqliteLedgerStore {
    /// Opens (creating if needed) the store at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// database cannot be opened or initialized.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::operation("create_ledger_dir", e))?;
        }

        let conn = Connection::open(&db_path).map_err(|e| sqlite_error("open_ledger_db", e))?;
        Self::from_connection(conn, db_path)
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| sqlite_error("open_ledger_db_memory", e))?;
        Self::from_connection(conn, PathBuf::from(":memory:"))
    }

    fn from_connection(conn: Connection, db_path: PathBuf) -> Result<Self> {
        configure_connection(&conn)?;
        schema::initialize(&conn)?;
        tracing::debug!(path = %db_path.display(), "opened ledger store");
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Returns the database path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Closes the connection, reporting any error `SQLite` raises on close.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the connection cannot be closed cleanly.
    pub fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        conn.close()
            .map_err(|(_, e)| sqlite_error("close_ledger_db", e))
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        acquire_lock(&self.conn)
    }

    fn begin_write(conn: &mut Connection) -> Result<Transaction<'_>> {
        conn.transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| sqlite_error("begin_write", e))
    }
}

/// Inserts the next version of a prompt inside an open transaction.
fn insert_version_tx(
    tx: &Transaction<'_>,
    prompt_id: &str,
    input: &NewVersion,
) -> Result<PromptVersion> {
    let next: i64 = tx
        .query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM prompt_versions WHERE prompt_id = ?1",
            params![prompt_id],
            |row| row.get(0),
        )
        .map_err(|e| sqlite_error("next_version", e))?;
    let version = to_version(next)?;

    let tags_json =
        serde_json::to_string(&input.tags).map_err(|e| Error::operation("serialize_tags", e))?;
    let metrics_json = serde_json::to_string(&input.metrics)
        .map_err(|e| Error::operation("serialize_metrics", e))?;
    let created_at = current_timestamp();

    tx.execute(
        "INSERT INTO prompt_versions
         (prompt_id, version, content, reason, author, tags, metrics, env, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            prompt_id,
            next,
            input.content,
            input.reason,
            input.author,
            tags_json,
            metrics_json,
            input.env,
            format_timestamp(&created_at),
        ],
    )
    .map_err(|e| sqlite_error("append_version", e))?;

    Ok(input.clone().into_version(prompt_id, version, created_at))
}

/// Moves a label inside an open transaction and logs the move.
fn move_label_tx(
    tx: &Transaction<'_>,
    prompt_id: &str,
    version: u32,
    label: &str,
    actor: Option<&str>,
) -> Result<LabelMove> {
    let exists: bool = tx
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM prompt_versions WHERE prompt_id = ?1 AND version = ?2)",
            params![prompt_id, version],
            |row| row.get(0),
        )
        .map_err(|e| sqlite_error("check_version", e))?;
    if !exists {
        return Err(Error::NotFound(format!(
            "prompt '{prompt_id}' version {version}"
        )));
    }

    let from_version = tx
        .query_row(
            "SELECT version FROM labels WHERE prompt_id = ?1 AND name = ?2",
            params![prompt_id, label],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map_err(|e| sqlite_error("read_label", e))?
        .map(to_version)
        .transpose()?;

    let moved_at = current_timestamp();
    let moved_at_text = format_timestamp(&moved_at);

    tx.execute(
        "INSERT INTO label_moves (prompt_id, label, from_version, to_version, moved_at, actor)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![prompt_id, label, from_version, version, moved_at_text, actor],
    )
    .map_err(|e| sqlite_error("append_label_move", e))?;
    let id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO labels (prompt_id, name, version, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (prompt_id, name) DO UPDATE
         SET version = excluded.version, updated_at = excluded.updated_at",
        params![prompt_id, label, version, moved_at_text],
    )
    .map_err(|e| sqlite_error("update_label", e))?;

    Ok(LabelMove {
        id,
        prompt_id: prompt_id.to_string(),
        label: label.to_string(),
        from_version,
        to_version: version,
        moved_at,
        actor: actor.map(str::to_string),
    })
}

/// Reads the whole move log (optionally for one prompt) in time order.
fn read_moves(conn: &Connection, prompt_id: Option<&str>) -> Result<Vec<LabelMove>> {
    let sql = format!(
        "SELECT {MOVE_COLUMNS} FROM label_moves
         WHERE ?1 IS NULL OR prompt_id = ?1
         ORDER BY moved_at ASC, id ASC"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| sqlite_error("prepare_label_history", e))?;
    let rows = stmt
        .query_map(params![prompt_id], MoveRow::from_row)
        .map_err(|e| sqlite_error("label_history", e))?;

    let mut moves = Vec::new();
    for row in rows {
        let row = row.map_err(|e| sqlite_error("read_label_move_row", e))?;
        moves.push(row.into_move()?);
    }
    Ok(moves)
}

impl LedgerStore for SqliteLedgerStore {
    fn append(&self, prompt_id: &str, input: &NewVersion) -> Result<PromptVersion> {
        validate_prompt_id(prompt_id)?;
        input.validate()?;

        let mut conn = self.lock_conn();
        let tx = Self::begin_write(&mut conn)?;
        let version = insert_version_tx(&tx, prompt_id, &input.applied_env(None))?;
        tx.commit().map_err(|e| sqlite_error("commit_append", e))?;

        metrics::counter!("promptledger_versions_appended_total").increment(1);
        tracing::info!(prompt_id, version = version.version, "appended prompt version");
        Ok(version)
    }

    fn append_labeled(
        &self,
        prompt_id: &str,
        input: &NewVersion,
        label: &str,
        actor: Option<&str>,
    ) -> Result<(PromptVersion, LabelMove)> {
        validate_prompt_id(prompt_id)?;
        input.validate()?;
        validate_label_name(label)?;

        let mut conn = self.lock_conn();
        let tx = Self::begin_write(&mut conn)?;
        let version = insert_version_tx(&tx, prompt_id, &input.applied_env(Some(label)))?;
        let mv = move_label_tx(&tx, prompt_id, version.version, label, actor)?;
        tx.commit().map_err(|e| sqlite_error("commit_append", e))?;

        metrics::counter!("promptledger_versions_appended_total").increment(1);
        metrics::counter!("promptledger_label_moves_total").increment(1);
        tracing::info!(
            prompt_id,
            version = version.version,
            label,
            "appended prompt version with initial label"
        );
        Ok((version, mv))
    }

    fn get(&self, prompt_id: &str, version: u32) -> Result<PromptVersion> {
        validate_prompt_id(prompt_id)?;
        let conn = self.lock_conn();

        let sql = format!(
            "SELECT {VERSION_COLUMNS} FROM prompt_versions WHERE prompt_id = ?1 AND version = ?2"
        );
        let row = conn
            .query_row(&sql, params![prompt_id, version], VersionRow::from_row)
            .optional()
            .map_err(|e| sqlite_error("get_version", e))?;

        row.map_or_else(
            || {
                Err(Error::NotFound(format!(
                    "prompt '{prompt_id}' version {version}"
                )))
            },
            VersionRow::into_version,
        )
    }

    fn version_exists(&self, prompt_id: &str, version: u32) -> Result<bool> {
        let conn = self.lock_conn();
        conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM prompt_versions WHERE prompt_id = ?1 AND version = ?2)",
            params![prompt_id, version],
            |row| row.get(0),
        )
        .map_err(|e| sqlite_error("check_version", e))
    }

    fn latest_version(&self, prompt_id: &str) -> Result<Option<u32>> {
        let conn = self.lock_conn();
        let latest: Option<i64> = conn
            .query_row(
                "SELECT MAX(version) FROM prompt_versions WHERE prompt_id = ?1",
                params![prompt_id],
                |row| row.get(0),
            )
            .map_err(|e| sqlite_error("latest_version", e))?;
        latest.map(to_version).transpose()
    }

    fn list_versions(&self, prompt_id: &str) -> Result<Vec<PromptVersion>> {
        validate_prompt_id(prompt_id)?;
        let conn = self.lock_conn();

        let sql = format!(
            "SELECT {VERSION_COLUMNS} FROM prompt_versions WHERE prompt_id = ?1 ORDER BY version ASC"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| sqlite_error("prepare_list_versions", e))?;
        let rows = stmt
            .query_map(params![prompt_id], VersionRow::from_row)
            .map_err(|e| sqlite_error("list_versions", e))?;

        let mut versions = Vec::new();
        for row in rows {
            let row = row.map_err(|e| sqlite_error("read_version_row", e))?;
            versions.push(row.into_version()?);
        }
        Ok(versions)
    }

    fn list_ids(&self) -> Result<BTreeSet<String>> {
        let conn = self.lock_conn();
        let mut stmt = conn
            .prepare("SELECT DISTINCT prompt_id FROM prompt_versions")
            .map_err(|e| sqlite_error("prepare_list_ids", e))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| sqlite_error("list_ids", e))?;

        rows.collect::<rusqlite::Result<BTreeSet<_>>>()
            .map_err(|e| sqlite_error("read_prompt_id_row", e))
    }

    fn set_label(
        &self,
        prompt_id: &str,
        version: u32,
        label: &str,
        actor: Option<&str>,
    ) -> Result<LabelMove> {
        validate_prompt_id(prompt_id)?;
        validate_label_name(label)?;

        let mut conn = self.lock_conn();
        let tx = Self::begin_write(&mut conn)?;
        let mv = move_label_tx(&tx, prompt_id, version, label, actor)?;
        tx.commit().map_err(|e| sqlite_error("commit_label_move", e))?;

        metrics::counter!("promptledger_label_moves_total").increment(1);
        tracing::info!(
            prompt_id,
            label,
            from = ?mv.from_version,
            to = mv.to_version,
            "moved label"
        );
        Ok(mv)
    }

    fn get_label(&self, prompt_id: &str, label: &str) -> Result<u32> {
        let conn = self.lock_conn();
        let version: Option<i64> = conn
            .query_row(
                "SELECT version FROM labels WHERE prompt_id = ?1 AND name = ?2",
                params![prompt_id, label],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| sqlite_error("get_label", e))?;

        version.map_or_else(
            || {
                Err(Error::NotFound(format!(
                    "label '{label}' for prompt '{prompt_id}'"
                )))
            },
            to_version,
        )
    }

    fn labels_for(&self, prompt_id: &str) -> Result<BTreeMap<String, u32>> {
        let conn = self.lock_conn();
        let mut stmt = conn
            .prepare("SELECT name, version FROM labels WHERE prompt_id = ?1")
            .map_err(|e| sqlite_error("prepare_labels_for", e))?;
        let rows = stmt
            .query_map(params![prompt_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|e| sqlite_error("labels_for", e))?;

        let mut labels = BTreeMap::new();
        for row in rows {
            let (name, version) = row.map_err(|e| sqlite_error("read_label_row", e))?;
            labels.insert(name, to_version(version)?);
        }
        Ok(labels)
    }

    fn label_history(&self, prompt_id: Option<&str>) -> Result<Vec<LabelMove>> {
        let conn = self.lock_conn();
        read_moves(&conn, prompt_id)
    }

    fn label_view(&self) -> Result<LabelView> {
        let conn = self.lock_conn();
        let sql = format!("SELECT {LABEL_COLUMNS} FROM labels");
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| sqlite_error("prepare_label_view", e))?;
        let rows = stmt
            .query_map([], LabelRow::from_row)
            .map_err(|e| sqlite_error("label_view", e))?;

        let mut labels = Vec::new();
        for row in rows {
            let row = row.map_err(|e| sqlite_error("read_label_row", e))?;
            labels.push(row.into_label()?);
        }
        Ok(labels.into_iter().collect())
    }

    fn status_snapshot(&self) -> Result<Vec<PromptStatus>> {
        let mut conn = self.lock_conn();
        // Deferred read transaction: both queries see the same WAL snapshot.
        let tx = conn
            .transaction()
            .map_err(|e| sqlite_error("begin_status_snapshot", e))?;

        let mut prompts = Vec::new();
        {
            let mut stmt = tx
                .prepare(
                    "SELECT prompt_id, MAX(version), COUNT(*) FROM prompt_versions
                     GROUP BY prompt_id ORDER BY prompt_id",
                )
                .map_err(|e| sqlite_error("prepare_status_versions", e))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                })
                .map_err(|e| sqlite_error("status_versions", e))?;
            for row in rows {
                let (prompt_id, latest, count) =
                    row.map_err(|e| sqlite_error("read_status_row", e))?;
                prompts.push(PromptStatus {
                    prompt_id,
                    latest_version: to_version(latest)?,
                    version_count: usize::try_from(count)
                        .map_err(|e| Error::operation("read_version_count", e))?,
                    labels: BTreeMap::new(),
                });
            }
        }

        let mut labels: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();
        {
            let mut stmt = tx
                .prepare("SELECT prompt_id, name, version FROM labels")
                .map_err(|e| sqlite_error("prepare_status_labels", e))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                })
                .map_err(|e| sqlite_error("status_labels", e))?;
            for row in rows {
                let (prompt_id, name, version) =
                    row.map_err(|e| sqlite_error("read_label_row", e))?;
                labels
                    .entry(prompt_id)
                    .or_default()
                    .insert(name, to_version(version)?);
            }
        }
        tx.commit()
            .map_err(|e| sqlite_error("commit_status_snapshot", e))?;

        for prompt in &mut prompts {
            prompt.labels = labels.remove(&prompt.prompt_id).unwrap_or_default();
        }
        Ok(prompts)
    }

    fn rebuild_labels(&self) -> Result<usize> {
        let mut conn = self.lock_conn();
        let tx = Self::begin_write(&mut conn)?;

        let view = LabelView::replay(&read_moves(&tx, None)?);
        tx.execute("DELETE FROM labels", [])
            .map_err(|e| sqlite_error("clear_labels", e))?;
        for label in view.iter() {
            tx.execute(
                "INSERT INTO labels (prompt_id, name, version, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    label.prompt_id,
                    label.name,
                    label.current_version,
                    format_timestamp(&label.updated_at)
                ],
            )
            .map_err(|e| sqlite_error("insert_label", e))?;
        }
        tx.commit()
            .map_err(|e| sqlite_error("commit_rebuild_labels", e))?;

        tracing::info!(labels = view.len(), "rebuilt label table from move log");
        Ok(view.len())
    }

    fn checkpoint(&self) -> Result<()> {
        let conn = self.lock_conn();
        // Reports (busy, log frames, checkpointed frames); in-memory stores report -1s.
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
            .map_err(|e| sqlite_error("wal_checkpoint", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn draft(content: &str) -> NewVersion {
        NewVersion::new(content)
            .with_reason("test")
            .with_author("tester")
    }

    #[test]
    fn test_sqlite_ledger_creation() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        assert_eq!(store.db_path().to_str(), Some(":memory:"));
        assert!(store.list_ids().unwrap().is_empty());
    }

    #[test]
    fn test_append_assigns_sequential_versions() {
        let store = SqliteLedgerStore::in_memory().unwrap();

        for expected in 1..=5 {
            let v = store.append("p", &draft(&format!("body {expected}"))).unwrap();
            assert_eq!(v.version, expected);
        }
        let other = store.append("q", &draft("other")).unwrap();
        assert_eq!(other.version, 1);

        assert_eq!(store.latest_version("p").unwrap(), Some(5));
        assert_eq!(store.latest_version("missing").unwrap(), None);
    }

    #[test]
    fn test_get_round_trips_every_field() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        let input = draft("Line one\nLine two\n")
            .with_tags(["draft", "marketing"])
            .with_metric("score", 0.7)
            .with_metric("latency_ms", 412.5);

        let written = store.append("p", &input).unwrap();
        let read = store.get("p", 1).unwrap();

        assert_eq!(read, written);
        assert_eq!(read.content, "Line one\nLine two\n");
        assert_eq!(read.tags.len(), 2);
        assert_eq!(read.metric("latency_ms"), Some(412.5));
    }

    #[test]
    fn test_get_missing_version() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        store.append("p", &draft("a")).unwrap();

        assert!(matches!(store.get("p", 2), Err(Error::NotFound(_))));
        assert!(matches!(store.get("q", 1), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_append_rejects_invalid_input() {
        let store = SqliteLedgerStore::in_memory().unwrap();

        assert!(matches!(
            store.append("", &draft("a")),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.append("p", &draft("   ")),
            Err(Error::InvalidInput(_))
        ));
        assert!(store.list_ids().unwrap().is_empty());
    }

    #[test]
    fn test_list_versions_and_ids() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        store.append("beta", &draft("b1")).unwrap();
        store.append("alpha", &draft("a1")).unwrap();
        store.append("beta", &draft("b2")).unwrap();

        let ids: Vec<_> = store.list_ids().unwrap().into_iter().collect();
        assert_eq!(ids, vec!["alpha".to_string(), "beta".to_string()]);

        let versions = store.list_versions("beta").unwrap();
        let numbers: Vec<u32> = versions.iter().map(|v| v.version).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(versions[1].content, "b2");

        assert!(store.list_versions("gamma").unwrap().is_empty());
    }

    #[test]
    fn test_set_label_records_moves() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        store.append("p", &draft("one")).unwrap();
        store.append("p", &draft("two")).unwrap();

        let first = store.set_label("p", 1, "prod", Some("alice")).unwrap();
        assert_eq!(first.from_version, None);
        assert_eq!(first.to_version, 1);
        assert_eq!(first.actor.as_deref(), Some("alice"));

        let second = store.set_label("p", 2, "prod", None).unwrap();
        assert_eq!(second.from_version, Some(1));
        assert!(second.id > first.id);

        assert_eq!(store.get_label("p", "prod").unwrap(), 2);
        let history = store.label_history(Some("p")).unwrap();
        assert_eq!(history, vec![first, second]);
    }

    #[test]
    fn test_set_label_requires_existing_version() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        store.append("p", &draft("one")).unwrap();

        assert!(matches!(
            store.set_label("p", 9, "prod", None),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.set_label("q", 1, "prod", None),
            Err(Error::NotFound(_))
        ));
        assert!(store.label_history(None).unwrap().is_empty());
        assert!(matches!(
            store.get_label("p", "prod"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_append_labeled_is_one_move() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        let (version, mv) = store
            .append_labeled("p", &draft("one"), "dev", Some("ci"))
            .unwrap();

        assert_eq!(version.version, 1);
        assert_eq!(version.env.as_deref(), Some("dev"));
        assert_eq!(mv.to_version, 1);
        assert_eq!(mv.from_version, None);
        assert_eq!(store.get_label("p", "dev").unwrap(), 1);
        assert_eq!(store.get("p", 1).unwrap(), version);
        assert_eq!(store.label_history(Some("p")).unwrap().len(), 1);
    }

    #[test]
    fn test_append_labeled_rolls_back_on_bad_label() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        assert!(
            store
                .append_labeled("p", &draft("one"), "bad label", None)
                .is_err()
        );
        assert_eq!(store.latest_version("p").unwrap(), None);
    }

    #[test]
    fn test_label_history_filter_and_order() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        store.append("p", &draft("p1")).unwrap();
        store.append("q", &draft("q1")).unwrap();
        store.set_label("p", 1, "prod", None).unwrap();
        store.set_label("q", 1, "prod", None).unwrap();
        store.set_label("p", 1, "staging", None).unwrap();

        let all = store.label_history(None).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].moved_at <= w[1].moved_at));

        let only_p = store.label_history(Some("p")).unwrap();
        assert_eq!(only_p.len(), 2);
        assert!(only_p.iter().all(|m| m.prompt_id == "p"));

        let labels = store.labels_for("p").unwrap();
        assert_eq!(labels.get("prod"), Some(&1));
        assert_eq!(labels.get("staging"), Some(&1));
    }

    #[test]
    fn test_status_snapshot_reads_versions_and_labels_together() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        store.append("zeta", &draft("z")).unwrap();
        store.append("alpha", &draft("a1")).unwrap();
        store
            .append_labeled("alpha", &draft("a2"), "dev", None)
            .unwrap();
        store.set_label("alpha", 1, "prod", None).unwrap();

        let snapshot = store.status_snapshot().unwrap();
        let ids: Vec<_> = snapshot.iter().map(|p| p.prompt_id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
        assert_eq!(snapshot[0].latest_version, 2);
        assert_eq!(snapshot[0].version_count, 2);
        assert_eq!(snapshot[0].labels.get("dev"), Some(&2));
        assert_eq!(snapshot[0].labels.get("prod"), Some(&1));
        assert!(snapshot[1].labels.is_empty());
    }

    #[test]
    fn test_status_snapshot_is_consistent_under_concurrent_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.db");
        let writer = std::sync::Arc::new(SqliteLedgerStore::open(&path).unwrap());
        let reader = SqliteLedgerStore::open(&path).unwrap();

        let handle = {
            let writer = std::sync::Arc::clone(&writer);
            std::thread::spawn(move || {
                for i in 0..40 {
                    writer
                        .append_labeled("p", &draft(&format!("body {i}")), "dev", None)
                        .unwrap();
                }
            })
        };
        for _ in 0..40 {
            for prompt in reader.status_snapshot().unwrap() {
                for version in prompt.labels.values() {
                    assert!(*version <= prompt.latest_version);
                }
            }
        }
        handle.join().unwrap();

        let last = reader.status_snapshot().unwrap();
        assert_eq!(last[0].latest_version, 40);
        assert_eq!(last[0].labels.get("dev"), Some(&40));
    }

    #[test]
    fn test_rebuild_labels_matches_replay() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        store.append("p", &draft("one")).unwrap();
        store.append("p", &draft("two")).unwrap();
        store.set_label("p", 1, "prod", None).unwrap();
        store.set_label("p", 2, "staging", None).unwrap();
        store.set_label("p", 2, "prod", None).unwrap();

        // Corrupt the materialized view directly.
        store
            .lock_conn()
            .execute("UPDATE labels SET version = 1 WHERE name = 'prod'", [])
            .unwrap();
        assert_eq!(
            store.verify_labels().unwrap(),
            vec![("p".to_string(), "prod".to_string())]
        );

        assert_eq!(store.rebuild_labels().unwrap(), 2);
        assert!(store.verify_labels().unwrap().is_empty());
        assert_eq!(store.get_label("p", "prod").unwrap(), 2);
    }

    #[test]
    fn test_reopen_preserves_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("ledger.db");

        {
            let store = SqliteLedgerStore::open(&path).unwrap();
            store.append("p", &draft("one")).unwrap();
            store.set_label("p", 1, "prod", None).unwrap();
            store.close().unwrap();
        }

        let store = SqliteLedgerStore::open(&path).unwrap();
        assert_eq!(store.get("p", 1).unwrap().content, "one");
        assert_eq!(store.get_label("p", "prod").unwrap(), 1);
        assert_eq!(store.append("p", &draft("two")).unwrap().version, 2);
    }
}
