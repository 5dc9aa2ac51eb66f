// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! Multiple independent OS processes may share one database file; all
//! cross-process correctness derives from SQLite's own locking. Within one
//! process, every access goes through a single `tokio_rusqlite::Connection`,
//! which serializes calls on one background thread. Do NOT create additional
//! Connection instances for writes.

use fakturo_core::FakturoError;
use tracing::debug;

/// Handle to the shared SQLite database file.
///
/// Cloning is cheap and shares the underlying connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, applying PRAGMAs and running
    /// any pending migrations.
    pub async fn open(path: &str) -> Result<Self, FakturoError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(sql_err)?;

        conn.call(|conn| {
            // WAL keeps plain reads from being blocked by the exclusive
            // writer. busy_timeout is effectively unbounded: a writer blocks
            // behind a held lock instead of surfacing SQLITE_BUSY.
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 2147483647;",
            )
            .map_err(sql_err)?;
            crate::migrations::run_migrations(conn).map_err(FakturoError::storage)?;
            Ok(())
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(e) => e,
            other => FakturoError::storage(other),
        })?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Close the connection, flushing pending work.
    pub async fn close(self) -> Result<(), FakturoError> {
        self.conn
            .close()
            .await
            .map_err(|e| FakturoError::storage(e))
    }
}

/// Map a tokio-rusqlite error into the storage variant of [`FakturoError`].
pub(crate) fn map_tr_err(err: tokio_rusqlite::Error) -> FakturoError {
    FakturoError::Storage {
        source: Box::new(err),
    }
}

/// Map a plain rusqlite error into the storage variant of [`FakturoError`].
pub(crate) fn sql_err(err: rusqlite::Error) -> FakturoError {
    FakturoError::Storage {
        source: Box::new(err),
    }
}

/// Whether `err` is a unique-key (or primary-key) constraint violation.
///
/// The unique constraint is the authoritative race guard for natural-key
/// inserts; callers translate this into `AlreadyExists`.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok::<_, rusqlite::Error>(names)
            })
            .await
            .unwrap();

        for table in ["clients", "invoices", "invoice_lines", "invoice_sequence"] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();

        // Second open re-runs the migration runner against an up-to-date schema.
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
    }
}
