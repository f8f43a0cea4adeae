//! Connection handling for the `SQLite` store.
//!
//! Lock acquisition with poison recovery, pragma configuration, and the
//! mapping from rusqlite errors to ledger errors.

use crate::Error;
use rusqlite::{Connection, ErrorCode};
use std::sync::{Mutex, MutexGuard};

/// Busy timeout applied to every connection, in milliseconds.
pub const BUSY_TIMEOUT_MS: u32 = 5000;

/// Helper to acquire mutex lock with poison recovery.
///
/// If the mutex is poisoned (due to a panic in a previous critical section),
/// we recover the inner value and log a warning. An interrupted transaction
/// was rolled back when its guard dropped, so the connection is still usable.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("ledger mutex was poisoned, recovering");
            metrics::counter!("promptledger_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a `SQLite` connection for the ledger.
///
/// # Configuration Applied
///
/// - **WAL mode**: readers never see a half-written transaction and are not
///   blocked by the single writer
/// - **NORMAL synchronous**: balances durability with performance
/// - **`busy_timeout`**: writers from other handles wait up to 5 seconds for
///   the write lock instead of failing with `SQLITE_BUSY`
/// - **`foreign_keys`**: label moves must reference an existing version
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if foreign keys cannot be enabled.
pub fn configure_connection(conn: &Connection) -> crate::Result<()> {
    // journal_mode returns the resulting mode as a row; in-memory databases
    // report "memory" and that is fine.
    let _ = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
        row.get::<_, String>(0)
    });
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS);
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| Error::operation("enable_foreign_keys", e))?;
    Ok(())
}

/// Maps a rusqlite error to a ledger error.
///
/// Primary-key and unique violations become [`Error::Conflict`]: the only
/// unique keys in the schema are the version slot and the label key, and a
/// violation there means another writer got in first.
pub fn sqlite_error(operation: &str, err: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
        if failure.code == ErrorCode::ConstraintViolation
            && matches!(
                failure.extended_code,
                rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            )
        {
            metrics::counter!("promptledger_append_conflicts_total").increment(1);
            return Error::Conflict(format!("{operation}: {err}"));
        }
    }
    Error::operation(operation, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_acquire_lock_concurrent() {
        let mutex = Arc::new(Mutex::new(0));
        let mut handles = vec![];

        for _ in 0..10 {
            let mutex_clone = Arc::clone(&mutex);
            handles.push(thread::spawn(move || {
                let mut guard = acquire_lock(&mutex_clone);
                *guard += 1;
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*acquire_lock(&mutex), 10);
    }

    #[test]
    fn test_acquire_lock_recovers_from_poison() {
        let mutex = Arc::new(Mutex::new(1));
        let poisoner = Arc::clone(&mutex);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the mutex");
        })
        .join();

        assert!(mutex.is_poisoned());
        assert_eq!(*acquire_lock(&mutex), 1);
    }

    #[test]
    fn test_configure_connection() {
        let conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();

        let journal_mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert!(
            journal_mode.eq_ignore_ascii_case("wal") || journal_mode.eq_ignore_ascii_case("memory"),
            "unexpected journal mode '{journal_mode}'"
        );

        let busy_timeout: u32 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(busy_timeout, BUSY_TIMEOUT_MS);

        let foreign_keys: i32 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn test_primary_key_violation_maps_to_conflict() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE t (a TEXT NOT NULL, b INTEGER NOT NULL, PRIMARY KEY (a, b))",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO t (a, b) VALUES ('p', 1)", [])
            .unwrap();
        let err = conn
            .execute("INSERT INTO t (a, b) VALUES ('p', 1)", [])
            .unwrap_err();

        assert!(matches!(
            sqlite_error("insert", err),
            Error::Conflict(_)
        ));
    }

    #[test]
    fn test_other_errors_map_to_operation_failed() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn.execute("SELECT * FROM missing", []).unwrap_err();
        assert!(matches!(
            sqlite_error("select", err),
            Error::OperationFailed { .. }
        ));
    }
}
