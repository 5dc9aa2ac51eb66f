// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice ledger operations: allocation, import, update, lookup, listing.
//!
//! Every mutation runs through [`Database::exclusive`], so number allocation
//! and the date-monotonicity checks are atomic with their inserts across all
//! processes sharing the database file.

use chrono::NaiveDate;
use rusqlite::{OptionalExtension, params};
use tracing::{debug, info};

use fakturo_core::FakturoError;

use super::{column_date, column_json, iso_date, parse_number, to_json};
use crate::database::{Database, map_tr_err, sql_err};
use crate::models::{Invoice, InvoiceContent, LineItem, Page};

const INVOICE_COLUMNS: &str = "number, date, seller, buyer, bank, is_corrected, is_legacy";

fn invoice_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, Invoice)> {
    let number: i64 = row.get(0)?;
    let date: String = row.get(1)?;
    let seller: String = row.get(2)?;
    let buyer: String = row.get(3)?;
    let bank: String = row.get(4)?;
    Ok((
        number,
        Invoice {
            number: number.to_string(),
            content: InvoiceContent {
                date: column_date(1, &date)?,
                seller: column_json(2, &seller)?,
                buyer: column_json(3, &buyer)?,
                lines: Vec::new(), // loaded separately
                bank: column_json(4, &bank)?,
            },
            is_corrected: row.get(5)?,
            is_legacy: row.get(6)?,
        },
    ))
}

fn load_lines(conn: &rusqlite::Connection, number: i64) -> rusqlite::Result<Vec<LineItem>> {
    let mut stmt = conn.prepare(
        "SELECT description, amount_minor, currency FROM invoice_lines
         WHERE invoice_number = ?1 ORDER BY position ASC",
    )?;
    stmt.query_map(params![number], |row| {
        Ok(LineItem {
            description: row.get(0)?,
            amount_minor: row.get(1)?,
            currency: row.get(2)?,
        })
    })?
    .collect()
}

fn insert_lines(
    tx: &rusqlite::Transaction<'_>,
    number: i64,
    lines: &[LineItem],
) -> Result<(), FakturoError> {
    let mut stmt = tx
        .prepare(
            "INSERT INTO invoice_lines (invoice_number, position, description, amount_minor, currency)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(sql_err)?;
    for (position, line) in lines.iter().enumerate() {
        stmt.execute(params![
            number,
            position as i64,
            line.description,
            line.amount_minor,
            line.currency
        ])
        .map_err(sql_err)?;
    }
    Ok(())
}

fn insert_invoice(
    tx: &rusqlite::Transaction<'_>,
    number: i64,
    content: &InvoiceContent,
    is_legacy: bool,
) -> Result<(), FakturoError> {
    tx.execute(
        "INSERT INTO invoices (number, date, seller, buyer, buyer_name, bank, is_corrected, is_legacy)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
        params![
            number,
            iso_date(content.date),
            to_json(&content.seller)?,
            to_json(&content.buyer)?,
            content.buyer.name,
            to_json(&content.bank)?,
            is_legacy
        ],
    )
    .map_err(sql_err)?;
    insert_lines(tx, number, &content.lines)
}

/// Insert-if-absent keeps first-time counter initialization safe when two
/// processes race to seed it.
fn ensure_sequence(tx: &rusqlite::Transaction<'_>, start_number: i64) -> Result<(), FakturoError> {
    tx.execute(
        "INSERT OR IGNORE INTO invoice_sequence (id, last_number) VALUES (1, ?1)",
        params![start_number - 1],
    )
    .map_err(sql_err)?;
    Ok(())
}

fn neighbor_date(
    tx: &rusqlite::Transaction<'_>,
    sql: &str,
    number: i64,
) -> Result<Option<NaiveDate>, FakturoError> {
    let raw: Option<String> = tx
        .query_row(sql, params![number], |row| row.get(0))
        .optional()
        .map_err(sql_err)?;
    raw.map(|r| column_date(0, &r)).transpose().map_err(sql_err)
}

/// Issue a new invoice under the next sequence number.
///
/// Numbers are assigned strictly in commit order; a rolled-back allocation
/// is abandoned and never reused.
pub async fn create_invoice(
    db: &Database,
    start_number: i64,
    content: InvoiceContent,
) -> Result<Invoice, FakturoError> {
    let invoice = db
        .exclusive(move |tx| {
            ensure_sequence(tx, start_number)?;
            let newest: Option<String> = tx
                .query_row(
                    "SELECT date FROM invoices ORDER BY number DESC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()
                .map_err(sql_err)?;
            if let Some(raw) = newest {
                let newest = column_date(0, &raw).map_err(sql_err)?;
                if content.date < newest {
                    return Err(FakturoError::ordering(format!(
                        "invoice date {} precedes latest issued date {}",
                        content.date, newest
                    )));
                }
            }
            let next: i64 = tx
                .query_row(
                    "UPDATE invoice_sequence SET last_number = last_number + 1
                     WHERE id = 1 RETURNING last_number",
                    [],
                    |row| row.get(0),
                )
                .map_err(sql_err)?;
            insert_invoice(tx, next, &content, false)?;
            Ok(Invoice {
                number: next.to_string(),
                content,
                is_corrected: false,
                is_legacy: false,
            })
        })
        .await?;
    info!(number = %invoice.number, "invoice issued");
    Ok(invoice)
}

/// Backfill a historical invoice under an explicit number.
pub async fn import_invoice(
    db: &Database,
    start_number: i64,
    number: &str,
    content: InvoiceContent,
) -> Result<Invoice, FakturoError> {
    let n = parse_number(number)?;
    let invoice = db
        .exclusive(move |tx| {
            ensure_sequence(tx, start_number)?;
            let taken: Option<i64> = tx
                .query_row(
                    "SELECT number FROM invoices WHERE number = ?1",
                    params![n],
                    |row| row.get(0),
                )
                .optional()
                .map_err(sql_err)?;
            if taken.is_some() {
                return Err(FakturoError::already_exists("invoice", n.to_string()));
            }
            insert_invoice(tx, n, &content, true)?;
            // Backfill may carry any historical date, but the counter must
            // still move past the imported number so future allocations
            // clear it.
            tx.execute(
                "UPDATE invoice_sequence SET last_number = MAX(last_number, ?1 + 1) WHERE id = 1",
                params![n],
            )
            .map_err(sql_err)?;
            Ok(Invoice {
                number: n.to_string(),
                content,
                is_corrected: false,
                is_legacy: true,
            })
        })
        .await?;
    info!(number = %invoice.number, "legacy invoice imported");
    Ok(invoice)
}

/// Exact lookup by number.
pub async fn get_invoice(db: &Database, number: &str) -> Result<Invoice, FakturoError> {
    let n = parse_number(number)?;
    let found = db
        .connection()
        .call(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE number = ?1"),
                    params![n],
                    invoice_row,
                )
                .optional()?;
            match row {
                Some((num, mut invoice)) => {
                    invoice.content.lines = load_lines(conn, num)?;
                    Ok(Some(invoice))
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)?;
    found.ok_or_else(|| FakturoError::not_found("invoice", number))
}

/// Replace the content of an existing invoice wholesale and mark it corrected.
///
/// The new date must stay within the window spanned by the numeric
/// predecessor and successor; a missing neighbor leaves that side unbounded.
pub async fn update_invoice(
    db: &Database,
    number: &str,
    content: InvoiceContent,
) -> Result<(), FakturoError> {
    let n = parse_number(number)?;
    let number_owned = number.to_string();
    db.exclusive(move |tx| {
        let legacy: Option<bool> = tx
            .query_row(
                "SELECT is_legacy FROM invoices WHERE number = ?1",
                params![n],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)?;
        let legacy = legacy.ok_or_else(|| FakturoError::not_found("invoice", number_owned.clone()))?;
        if legacy {
            return Err(FakturoError::Immutable {
                number: number_owned,
            });
        }
        let predecessor = neighbor_date(
            tx,
            "SELECT date FROM invoices WHERE number < ?1 ORDER BY number DESC LIMIT 1",
            n,
        )?;
        let successor = neighbor_date(
            tx,
            "SELECT date FROM invoices WHERE number > ?1 ORDER BY number ASC LIMIT 1",
            n,
        )?;
        if let Some(predecessor) = predecessor {
            if content.date < predecessor {
                return Err(FakturoError::ordering(format!(
                    "date {} precedes predecessor date {}",
                    content.date, predecessor
                )));
            }
        }
        if let Some(successor) = successor {
            if content.date > successor {
                return Err(FakturoError::ordering(format!(
                    "date {} exceeds successor date {}",
                    content.date, successor
                )));
            }
        }
        tx.execute(
            "UPDATE invoices
             SET date = ?2, seller = ?3, buyer = ?4, buyer_name = ?5, bank = ?6, is_corrected = 1
             WHERE number = ?1",
            params![
                n,
                iso_date(content.date),
                to_json(&content.seller)?,
                to_json(&content.buyer)?,
                content.buyer.name,
                to_json(&content.bank)?
            ],
        )
        .map_err(sql_err)?;
        tx.execute(
            "DELETE FROM invoice_lines WHERE invoice_number = ?1",
            params![n],
        )
        .map_err(sql_err)?;
        insert_lines(tx, n, &content.lines)?;
        Ok(())
    })
    .await?;
    debug!(number, "invoice corrected");
    Ok(())
}

/// Page through invoices newest-first; `cursor` is the number of the last
/// invoice on the previous page.
pub async fn latest_invoices(
    db: &Database,
    limit: u32,
    cursor: Option<&str>,
) -> Result<Page<Invoice>, FakturoError> {
    if limit == 0 {
        return Ok(Page::empty());
    }
    let before = cursor.map(parse_number).transpose()?;
    let fetch = i64::from(limit) + 1;
    let mut items = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {INVOICE_COLUMNS} FROM invoices
                 WHERE ?1 IS NULL OR number < ?1
                 ORDER BY number DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![before, fetch], invoice_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            let mut out = Vec::with_capacity(rows.len());
            for (num, mut invoice) in rows {
                invoice.content.lines = load_lines(conn, num)?;
                out.push(invoice);
            }
            Ok(out)
        })
        .await
        .map_err(map_tr_err)?;
    let next_cursor = if items.len() as i64 == fetch {
        items.truncate(limit as usize);
        items.last().map(|invoice| invoice.number.clone())
    } else {
        None
    };
    Ok(Page { items, next_cursor })
}
