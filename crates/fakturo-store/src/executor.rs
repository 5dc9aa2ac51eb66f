// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialized transaction executor.
//!
//! Every mutation of the store runs through [`Database::exclusive`], which
//! wraps the unit of work in a `BEGIN IMMEDIATE` transaction. IMMEDIATE
//! acquires SQLite's write lock at transaction start rather than lazily at
//! first write, so at most one transaction is actively writing at any time
//! across every OS process sharing the database file. Competing writers
//! block behind the busy timeout (set effectively unbounded on open) with no
//! enforced fairness. Plain reads bypass this executor and, under WAL, are
//! never blocked by it.

use rusqlite::TransactionBehavior;
use tracing::warn;

use fakturo_core::FakturoError;

use crate::database::{Database, map_tr_err, sql_err};

impl Database {
    /// Run `work` inside a cross-process write-exclusive transaction.
    ///
    /// On `Ok` the transaction commits durably before this returns; on `Err`
    /// it rolls back completely and the error is re-raised, leaving prior
    /// state unchanged. No timeout is configured: the caller blocks until
    /// the write lock becomes available.
    pub async fn exclusive<T, F>(&self, work: F) -> Result<T, FakturoError>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T, FakturoError> + Send + 'static,
        T: Send + 'static,
    {
        self.connection()
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                match work(&tx) {
                    Ok(value) => match tx.commit() {
                        Ok(()) => Ok(Ok(value)),
                        Err(e) => Ok(Err(sql_err(e))),
                    },
                    Err(err) => {
                        // The unit of work's error is the one the caller
                        // needs; a rollback failure must not displace it.
                        if let Err(e) = tx.rollback() {
                            warn!(error = %e, "transaction rollback failed");
                        }
                        Ok(Err(err))
                    }
                }
            })
            .await
            .map_err(map_tr_err)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;
    use tempfile::tempdir;

    use crate::database::sql_err;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn client_count(db: &Database) -> i64 {
        db.connection()
            .call(|conn| {
                let n = conn.query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))?;
                Ok::<_, rusqlite::Error>(n)
            })
            .await
            .unwrap()
    }

    fn insert_stub(tx: &rusqlite::Transaction<'_>, nickname: &str) -> Result<(), FakturoError> {
        tx.execute(
            "INSERT INTO clients (nickname, name, representative_name, company_identifier,
                                  vat_identifier, address, city, postal_code, country)
             VALUES (?1, 'n', 'r', 'c', NULL, 'a', 'ci', 'p', 'co')",
            params![nickname],
        )
        .map_err(sql_err)?;
        Ok(())
    }

    #[tokio::test]
    async fn commit_on_success() {
        let (db, _dir) = setup_db().await;

        let out = db
            .exclusive(|tx| {
                insert_stub(tx, "kept")?;
                Ok(42)
            })
            .await
            .unwrap();
        assert_eq!(out, 42);
        assert_eq!(client_count(&db).await, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn rollback_on_error_leaves_prior_state() {
        let (db, _dir) = setup_db().await;

        let result: Result<(), _> = db
            .exclusive(|tx| {
                insert_stub(tx, "ghost")?;
                Err(FakturoError::InvalidArgument("boom".into()))
            })
            .await;
        assert!(matches!(result, Err(FakturoError::InvalidArgument(_))));

        // The insert rolled back with the failing unit of work.
        assert_eq!(client_count(&db).await, 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn failing_unit_of_work_reraises_its_own_error() {
        let (db, _dir) = setup_db().await;

        let result: Result<(), _> = db
            .exclusive(|tx| {
                insert_stub(tx, "ghost")?;
                Err(FakturoError::not_found("invoice", "77"))
            })
            .await;

        // The caller gets the domain error back verbatim, never a storage
        // error from the transaction teardown.
        match result {
            Err(FakturoError::NotFound { entity, key }) => {
                assert_eq!(entity, "invoice");
                assert_eq!(key, "77");
            }
            other => panic!("expected the domain error back, got {other:?}"),
        }

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn serializes_concurrent_units_of_work() {
        let (db, _dir) = setup_db().await;

        let mut handles = Vec::new();
        for i in 0..10 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.exclusive(move |tx| insert_stub(tx, &format!("c-{i}")))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(client_count(&db).await, 10);

        db.close().await.unwrap();
    }
}
