//! Transaction wrapper
//!
//! Runs a closure inside a single SQLite transaction: commit on success,
//! rollback on error. A failed rollback is reported as its own error
//! carrying both the original cause and the rollback failure, because it
//! means the store may be left inconsistent and needs operator attention.

use rusqlite::Connection;

use crate::error::{BackupError, BackupResult};

/// Run `body` inside one transaction on `conn`
///
/// BEGIN IMMEDIATE is used so the write lock is taken up front; the design
/// assumes a single writer per connection and provides no locking of its
/// own.
pub fn with_transaction<T, F>(conn: &Connection, body: F) -> BackupResult<T>
where
    F: FnOnce(&Connection) -> BackupResult<T>,
{
    conn.execute_batch("BEGIN IMMEDIATE;")?;

    let outcome = body(conn).and_then(|value| {
        conn.execute_batch("COMMIT;")?;
        Ok(value)
    });

    match outcome {
        Ok(value) => Ok(value),
        Err(cause) => match conn.execute_batch("ROLLBACK;") {
            Ok(()) => Err(cause),
            // SQLite auto-rolls-back on some commit-time failures; if the
            // transaction is already gone the store is clean and only the
            // original cause matters.
            Err(rollback_err) if transaction_already_gone(&rollback_err) => Err(cause),
            Err(rollback_err) => Err(BackupError::RollbackFailed {
                source: Box::new(cause),
                rollback: rollback_err.to_string(),
            }),
        },
    }
}

/// Whether a rollback error only says there was nothing left to roll back
fn transaction_already_gone(err: &rusqlite::Error) -> bool {
    err.to_string().contains("no transaction is active")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT NOT NULL);")
            .unwrap();
        conn
    }

    fn row_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_commit_on_success() {
        let conn = test_conn();
        let inserted = with_transaction(&conn, |tx| {
            tx.execute("INSERT INTO t (v) VALUES ('a')", [])?;
            Ok(1)
        })
        .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(row_count(&conn), 1);
    }

    #[test]
    fn test_rollback_on_error() {
        let conn = test_conn();
        let result: BackupResult<()> = with_transaction(&conn, |tx| {
            tx.execute("INSERT INTO t (v) VALUES ('a')", [])?;
            Err(BackupError::DbError("forced".into()))
        });
        assert_eq!(result.unwrap_err().code(), ErrorCode::DbError);
        assert_eq!(row_count(&conn), 0);
    }

    #[test]
    fn test_error_code_passes_through() {
        let conn = test_conn();
        let result: BackupResult<()> = with_transaction(&conn, |tx| {
            tx.execute("INSERT INTO t (id, v) VALUES (1, 'a')", [])?;
            tx.execute("INSERT INTO t (id, v) VALUES (1, 'b')", [])?;
            Ok(())
        });
        assert_eq!(result.unwrap_err().code(), ErrorCode::DbConstraint);
        assert_eq!(row_count(&conn), 0);
    }

    #[test]
    fn test_already_ended_transaction_returns_original_cause() {
        let conn = test_conn();
        let result: BackupResult<()> = with_transaction(&conn, |tx| {
            // Ending the transaction inside the body makes the outer
            // rollback hit "no transaction is active"; the store is clean,
            // so the original error must come back unchanged.
            tx.execute_batch("COMMIT;")?;
            Err(BackupError::DbError("original failure".into()))
        });
        let err = result.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DbError);
        assert!(err.to_string().contains("original failure"));
    }

    #[test]
    fn test_transaction_already_gone_detection() {
        let gone = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ErrorCode::InternalMalfunction,
                extended_code: rusqlite::ffi::SQLITE_ERROR,
            },
            Some("cannot rollback - no transaction is active".into()),
        );
        assert!(transaction_already_gone(&gone));

        let real_failure = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ErrorCode::DiskFull,
                extended_code: rusqlite::ffi::SQLITE_FULL,
            },
            Some("database or disk is full".into()),
        );
        assert!(!transaction_already_gone(&real_failure));
    }
}
