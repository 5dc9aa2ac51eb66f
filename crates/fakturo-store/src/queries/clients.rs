// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client directory operations: natural-key CRUD, rename, and listings.
//!
//! The nickname is the storage primary key. Inserts lean on the unique
//! constraint as the race guard; a rename is delete + insert inside one
//! exclusive transaction so the client is never visible under zero or two
//! nicknames.

use rusqlite::{OptionalExtension, params};
use tracing::debug;

use fakturo_core::FakturoError;
use fakturo_core::types::ActivityCursor;

use super::column_date;
use crate::database::{Database, is_unique_violation, map_tr_err, sql_err};
use crate::models::{BillingAddress, Client, ClientActivity, ClientPatch, Page};

const CLIENT_COLUMNS: &str = "nickname, name, representative_name, company_identifier, \
                              vat_identifier, address, city, postal_code, country";

fn client_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        nickname: row.get(0)?,
        address: BillingAddress {
            name: row.get(1)?,
            representative_name: row.get(2)?,
            company_identifier: row.get(3)?,
            vat_identifier: row.get(4)?,
            address: row.get(5)?,
            city: row.get(6)?,
            postal_code: row.get(7)?,
            country: row.get(8)?,
        },
    })
}

fn insert_client(
    conn: &rusqlite::Connection,
    client: &Client,
) -> Result<usize, rusqlite::Error> {
    conn.execute(
        "INSERT INTO clients (nickname, name, representative_name, company_identifier,
                              vat_identifier, address, city, postal_code, country)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            client.nickname,
            client.address.name,
            client.address.representative_name,
            client.address.company_identifier,
            client.address.vat_identifier,
            client.address.address,
            client.address.city,
            client.address.postal_code,
            client.address.country
        ],
    )
}

/// Insert a new client. Of K concurrent adds for one nickname exactly one
/// wins; the unique constraint, not a pre-check, arbitrates.
pub async fn add_client(db: &Database, client: Client) -> Result<(), FakturoError> {
    let nickname = client.nickname.clone();
    db.connection()
        .call(move |conn| match insert_client(conn, &client) {
            Ok(_) => Ok(Ok(())),
            Err(e) if is_unique_violation(&e) => Ok(Err(FakturoError::already_exists(
                "client",
                client.nickname.clone(),
            ))),
            Err(e) => Err(e.into()),
        })
        .await
        .map_err(map_tr_err)??;
    debug!(nickname = %nickname, "client added");
    Ok(())
}

/// Exact lookup by nickname.
pub async fn get_client(db: &Database, nickname: &str) -> Result<Client, FakturoError> {
    let nick = nickname.to_string();
    let found = db
        .connection()
        .call(move |conn| {
            let client = conn
                .query_row(
                    &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE nickname = ?1"),
                    params![nick],
                    client_row,
                )
                .optional()?;
            Ok(client)
        })
        .await
        .map_err(map_tr_err)?;
    found.ok_or_else(|| FakturoError::not_found("client", nickname))
}

/// Update a client in place, optionally renaming it.
///
/// Concurrent updates to one client resolve last-writer-wins with whole
/// payloads: the transaction that commits last leaves its full state, never
/// a field-level merge.
pub async fn update_client(
    db: &Database,
    nickname: &str,
    patch: ClientPatch,
) -> Result<(), FakturoError> {
    let nickname = nickname.to_string();
    let renamed = db
        .exclusive(move |tx| {
            let current: Option<Client> = tx
                .query_row(
                    &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE nickname = ?1"),
                    params![nickname],
                    client_row,
                )
                .optional()
                .map_err(sql_err)?;
            let current = current.ok_or_else(|| FakturoError::not_found("client", nickname.clone()))?;

            let address = patch.new_address.unwrap_or(current.address);
            let new_nickname = patch.new_nickname.unwrap_or_else(|| nickname.clone());

            if new_nickname == nickname {
                tx.execute(
                    "UPDATE clients
                     SET name = ?2, representative_name = ?3, company_identifier = ?4,
                         vat_identifier = ?5, address = ?6, city = ?7, postal_code = ?8,
                         country = ?9
                     WHERE nickname = ?1",
                    params![
                        nickname,
                        address.name,
                        address.representative_name,
                        address.company_identifier,
                        address.vat_identifier,
                        address.address,
                        address.city,
                        address.postal_code,
                        address.country
                    ],
                )
                .map_err(sql_err)?;
                return Ok(None);
            }

            // Rename: re-key the row via delete + insert in this one
            // transaction; the unique constraint arbitrates collisions.
            tx.execute(
                "DELETE FROM clients WHERE nickname = ?1",
                params![nickname],
            )
            .map_err(sql_err)?;
            let replacement = Client {
                nickname: new_nickname.clone(),
                address,
            };
            match insert_client(tx, &replacement) {
                Ok(_) => Ok(Some(new_nickname)),
                Err(e) if is_unique_violation(&e) => {
                    Err(FakturoError::already_exists("client", new_nickname))
                }
                Err(e) => Err(sql_err(e)),
            }
        })
        .await?;
    if let Some(new_nickname) = renamed {
        debug!(nickname = %new_nickname, "client renamed");
    }
    Ok(())
}

/// Remove a client. Fails `NotFound` if absent.
pub async fn delete_client(db: &Database, nickname: &str) -> Result<(), FakturoError> {
    let nick = nickname.to_string();
    let removed = db
        .connection()
        .call(move |conn| {
            let n = conn.execute("DELETE FROM clients WHERE nickname = ?1", params![nick])?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)?;
    if removed == 0 {
        return Err(FakturoError::not_found("client", nickname));
    }
    debug!(nickname, "client deleted");
    Ok(())
}

/// Page through clients nickname-ascending; `cursor` is the last nickname of
/// the previous page.
pub async fn list_clients(
    db: &Database,
    limit: u32,
    cursor: Option<&str>,
) -> Result<Page<Client>, FakturoError> {
    if limit == 0 {
        return Ok(Page::empty());
    }
    let after = cursor.map(str::to_string);
    let fetch = i64::from(limit) + 1;
    let mut items = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CLIENT_COLUMNS} FROM clients
                 WHERE ?1 IS NULL OR nickname > ?1
                 ORDER BY nickname ASC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![after, fetch], client_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)?;
    let next_cursor = if items.len() as i64 == fetch {
        items.truncate(limit as usize);
        items.last().map(|client| client.nickname.clone())
    } else {
        None
    };
    Ok(Page { items, next_cursor })
}

/// Page through clients by most recent invoice activity, descending.
///
/// Activity joins the client display name to invoice buyer names by
/// case-insensitive equality; two clients sharing a display name share their
/// activity (known limitation). Clients with no invoices sort last under the
/// sentinel activity key `00000000`, nickname-ascending among themselves.
pub async fn latest_clients(
    db: &Database,
    limit: u32,
    cursor: Option<&str>,
) -> Result<Page<ClientActivity>, FakturoError> {
    if limit == 0 {
        return Ok(Page::empty());
    }
    let resume = cursor.map(ActivityCursor::parse).transpose()?;
    let (after_key, after_nick) = match resume {
        Some(c) => (Some(c.date_key), Some(c.nickname)),
        None => (None, None),
    };
    let fetch = i64::from(limit) + 1;
    let mut items = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CLIENT_COLUMNS}, last_activity
                 FROM (
                     SELECT c.*, (SELECT MAX(i.date) FROM invoices i
                                  WHERE i.buyer_name = c.name COLLATE NOCASE) AS last_activity
                     FROM clients c
                 )
                 WHERE ?1 IS NULL
                    OR COALESCE(REPLACE(last_activity, '-', ''), '00000000') < ?1
                    OR (COALESCE(REPLACE(last_activity, '-', ''), '00000000') = ?1
                        AND nickname > ?2)
                 ORDER BY COALESCE(REPLACE(last_activity, '-', ''), '00000000') DESC,
                          nickname ASC
                 LIMIT ?3"
            ))?;
            let rows = stmt
                .query_map(params![after_key, after_nick, fetch], |row| {
                    let client = client_row(row)?;
                    let raw: Option<String> = row.get(9)?;
                    let last_activity = raw.map(|r| column_date(9, &r)).transpose()?;
                    Ok(ClientActivity {
                        client,
                        last_activity,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)?;
    let next_cursor = if items.len() as i64 == fetch {
        items.truncate(limit as usize);
        items.last().map(|item| {
            ActivityCursor::new(item.last_activity, item.client.nickname.clone()).encode()
        })
    } else {
        None
    };
    Ok(Page { items, next_cursor })
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    use crate::models::{BankDetails, InvoiceContent, LineItem};
    use crate::queries::invoices::create_invoice;
    use chrono::NaiveDate;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn address(name: &str, city: &str) -> BillingAddress {
        BillingAddress {
            name: name.into(),
            representative_name: "Anna Nowak".into(),
            company_identifier: "REG-77".into(),
            vat_identifier: None,
            address: "ul. Dluga 5".into(),
            city: city.into(),
            postal_code: "00-238".into(),
            country: "Poland".into(),
        }
    }

    fn client(nickname: &str, name: &str) -> Client {
        Client {
            nickname: nickname.into(),
            address: address(name, "Warszawa"),
        }
    }

    fn invoice_for(date: &str, buyer_name: &str) -> InvoiceContent {
        InvoiceContent {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            seller: address("Fakturo Sp. z o.o.", "Warszawa"),
            buyer: address(buyer_name, "Krakow"),
            lines: vec![LineItem {
                description: "Subscription".into(),
                amount_minor: 9_900,
                currency: "PLN".into(),
            }],
            bank: BankDetails {
                bank_name: "mBank".into(),
                account_number: "PL02".into(),
            },
        }
    }

    #[tokio::test]
    async fn add_get_delete_lifecycle() {
        let (db, _dir) = setup_db().await;

        let acme = client("acme", "ACME Corp");
        add_client(&db, acme.clone()).await.unwrap();
        assert_eq!(get_client(&db, "acme").await.unwrap(), acme);

        delete_client(&db, "acme").await.unwrap();
        assert!(matches!(
            get_client(&db, "acme").await,
            Err(FakturoError::NotFound { .. })
        ));
        assert!(matches!(
            delete_client(&db, "acme").await,
            Err(FakturoError::NotFound { .. })
        ));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_add_fails_already_exists() {
        let (db, _dir) = setup_db().await;

        add_client(&db, client("acme", "ACME Corp")).await.unwrap();
        let result = add_client(&db, client("acme", "Other Name")).await;
        assert!(matches!(result, Err(FakturoError::AlreadyExists { .. })));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_adds_yield_exactly_one_winner() {
        let (db, _dir) = setup_db().await;

        let mut handles = Vec::new();
        for i in 0..5 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                let mut c = client("acme", "ACME Corp");
                c.address.city = format!("city-{i}");
                let result = add_client(&db, c.clone()).await;
                (c, result)
            }));
        }
        let mut winner = None;
        let mut losers = 0;
        for handle in handles {
            let (candidate, result) = handle.await.unwrap();
            match result {
                Ok(()) => {
                    assert!(winner.is_none(), "two adds claimed success");
                    winner = Some(candidate);
                }
                Err(FakturoError::AlreadyExists { .. }) => losers += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(losers, 4);

        // The stored record equals the winner's payload exactly.
        let stored = get_client(&db, "acme").await.unwrap();
        assert_eq!(stored, winner.unwrap());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_in_place_overwrites_address() {
        let (db, _dir) = setup_db().await;

        add_client(&db, client("acme", "ACME Corp")).await.unwrap();
        let new_address = address("ACME Corporation", "Gdansk");
        update_client(
            &db,
            "acme",
            ClientPatch {
                new_nickname: None,
                new_address: Some(new_address.clone()),
            },
        )
        .await
        .unwrap();

        let stored = get_client(&db, "acme").await.unwrap();
        assert_eq!(stored.address, new_address);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn rename_rekeys_the_row() {
        let (db, _dir) = setup_db().await;

        let original = client("acme", "ACME Corp");
        add_client(&db, original.clone()).await.unwrap();
        update_client(
            &db,
            "acme",
            ClientPatch {
                new_nickname: Some("acme-plc".into()),
                new_address: None,
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            get_client(&db, "acme").await,
            Err(FakturoError::NotFound { .. })
        ));
        let renamed = get_client(&db, "acme-plc").await.unwrap();
        assert_eq!(renamed.address, original.address);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn rename_onto_taken_nickname_rolls_back() {
        let (db, _dir) = setup_db().await;

        let acme = client("acme", "ACME Corp");
        add_client(&db, acme.clone()).await.unwrap();
        add_client(&db, client("beta", "Beta LLC")).await.unwrap();

        let result = update_client(
            &db,
            "acme",
            ClientPatch {
                new_nickname: Some("beta".into()),
                new_address: None,
            },
        )
        .await;
        assert!(matches!(result, Err(FakturoError::AlreadyExists { .. })));

        // The delete half of the rename rolled back with the transaction.
        assert_eq!(get_client(&db, "acme").await.unwrap(), acme);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn rename_to_own_nickname_updates_in_place() {
        let (db, _dir) = setup_db().await;

        add_client(&db, client("acme", "ACME Corp")).await.unwrap();
        let new_address = address("ACME Corp", "Poznan");
        update_client(
            &db,
            "acme",
            ClientPatch {
                new_nickname: Some("acme".into()),
                new_address: Some(new_address.clone()),
            },
        )
        .await
        .unwrap();
        assert_eq!(get_client(&db, "acme").await.unwrap().address, new_address);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_missing_client_fails_not_found() {
        let (db, _dir) = setup_db().await;
        let result = update_client(&db, "ghost", ClientPatch::default()).await;
        assert!(matches!(result, Err(FakturoError::NotFound { .. })));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_updates_resolve_to_one_whole_payload() {
        let (db, _dir) = setup_db().await;

        add_client(&db, client("acme", "ACME Corp")).await.unwrap();

        let first = address("ACME East", "Lublin");
        let second = address("ACME West", "Wroclaw");
        let mut handles = Vec::new();
        for candidate in [first.clone(), second.clone()] {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                update_client(
                    &db,
                    "acme",
                    ClientPatch {
                        new_nickname: None,
                        new_address: Some(candidate),
                    },
                )
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Whichever writer committed last wins wholesale; never a field mix.
        let stored = get_client(&db, "acme").await.unwrap();
        assert!(
            stored.address == first || stored.address == second,
            "hybrid payload: {stored:?}"
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_chains_pages_nickname_ascending() {
        let (db, _dir) = setup_db().await;

        for nick in ["delta", "alpha", "echo", "bravo", "charlie"] {
            add_client(&db, client(nick, nick)).await.unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = list_clients(&db, 2, cursor.as_deref()).await.unwrap();
            seen.extend(page.items.iter().map(|c| c.nickname.clone()));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        assert_eq!(seen, ["alpha", "bravo", "charlie", "delta", "echo"]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn latest_orders_by_activity_then_inactive_by_nickname() {
        let (db, _dir) = setup_db().await;

        add_client(&db, client("acme", "ACME Corp")).await.unwrap();
        add_client(&db, client("beta", "Beta LLC")).await.unwrap();
        add_client(&db, client("zeta", "Zeta GmbH")).await.unwrap();
        add_client(&db, client("aardvark", "Aardvark Inc")).await.unwrap();

        // The join is case-insensitive on the display name.
        create_invoice(&db, 1, invoice_for("2026-01-10", "acme corp"))
            .await
            .unwrap();
        create_invoice(&db, 1, invoice_for("2026-02-15", "BETA llc"))
            .await
            .unwrap();

        let page = latest_clients(&db, 10, None).await.unwrap();
        let nicknames: Vec<_> = page
            .items
            .iter()
            .map(|item| item.client.nickname.as_str())
            .collect();
        // Active clients newest-first, then inactive nickname-ascending.
        assert_eq!(nicknames, ["beta", "acme", "aardvark", "zeta"]);
        assert_eq!(
            page.items[0].last_activity,
            NaiveDate::from_ymd_opt(2026, 2, 15)
        );
        assert!(page.items[2].last_activity.is_none());
        assert!(page.next_cursor.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn latest_chains_pages_through_the_compound_cursor() {
        let (db, _dir) = setup_db().await;

        add_client(&db, client("acme", "ACME Corp")).await.unwrap();
        add_client(&db, client("beta", "Beta LLC")).await.unwrap();
        add_client(&db, client("dormant", "Dormant Ltd")).await.unwrap();
        add_client(&db, client("idle", "Idle SA")).await.unwrap();

        create_invoice(&db, 1, invoice_for("2026-01-10", "ACME Corp"))
            .await
            .unwrap();
        create_invoice(&db, 1, invoice_for("2026-02-15", "Beta LLC"))
            .await
            .unwrap();

        let page = latest_clients(&db, 1, None).await.unwrap();
        assert_eq!(page.items[0].client.nickname, "beta");
        assert_eq!(page.next_cursor.as_deref(), Some("20260215|beta"));

        let page = latest_clients(&db, 1, page.next_cursor.as_deref())
            .await
            .unwrap();
        assert_eq!(page.items[0].client.nickname, "acme");
        assert_eq!(page.next_cursor.as_deref(), Some("20260110|acme"));

        // Inactive clients resume through the sentinel activity key.
        let page = latest_clients(&db, 1, page.next_cursor.as_deref())
            .await
            .unwrap();
        assert_eq!(page.items[0].client.nickname, "dormant");
        assert_eq!(page.next_cursor.as_deref(), Some("00000000|dormant"));

        let page = latest_clients(&db, 1, page.next_cursor.as_deref())
            .await
            .unwrap();
        assert_eq!(page.items[0].client.nickname, "idle");
        assert!(page.next_cursor.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn latest_ties_on_date_break_by_nickname() {
        let (db, _dir) = setup_db().await;

        add_client(&db, client("november", "North Co")).await.unwrap();
        add_client(&db, client("mike", "Mid Co")).await.unwrap();

        create_invoice(&db, 1, invoice_for("2026-03-01", "North Co"))
            .await
            .unwrap();
        create_invoice(&db, 1, invoice_for("2026-03-01", "Mid Co"))
            .await
            .unwrap();

        let page = latest_clients(&db, 10, None).await.unwrap();
        let nicknames: Vec<_> = page
            .items
            .iter()
            .map(|item| item.client.nickname.as_str())
            .collect();
        assert_eq!(nicknames, ["mike", "november"]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn latest_rejects_malformed_cursor() {
        let (db, _dir) = setup_db().await;
        let result = latest_clients(&db, 5, Some("not-a-cursor")).await;
        assert!(matches!(result, Err(FakturoError::InvalidArgument(_))));
        db.close().await.unwrap();
    }
}
