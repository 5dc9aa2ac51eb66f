// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types used across the Fakturo trait boundaries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FakturoError;

/// A billing address as it appears on an invoice or client record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingAddress {
    /// Display name of the party (company or person). Also the join key for
    /// activity ordering, matched case-insensitively against invoice buyers.
    pub name: String,
    pub representative_name: String,
    pub company_identifier: String,
    pub vat_identifier: Option<String>,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// A client record, keyed by its unique nickname.
///
/// The nickname is a natural key: it is the storage primary key and may be
/// changed via a rename update, which re-keys the row atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub nickname: String,
    pub address: BillingAddress,
}

/// A partial update for a client: either half may be omitted.
///
/// Supplying `new_nickname` different from the current one performs a rename
/// (delete + insert under the new key, in one exclusive transaction).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientPatch {
    pub new_nickname: Option<String>,
    pub new_address: Option<BillingAddress>,
}

/// A single invoice line: a description plus an amount in minor currency
/// units (cents, grosze, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub amount_minor: i64,
    pub currency: String,
}

/// Bank transfer details printed on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_number: String,
}

/// The mutable content of an invoice; everything except its number and flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceContent {
    pub date: NaiveDate,
    pub seller: BillingAddress,
    pub buyer: BillingAddress,
    pub lines: Vec<LineItem>,
    pub bank: BankDetails,
}

/// A stored invoice. The number is a decimal-digit string, unique and
/// totally ordered numerically; it never changes once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub number: String,
    pub content: InvoiceContent,
    /// Set once the invoice has been updated at least once.
    pub is_corrected: bool,
    /// Imports under an explicit historical number. Legacy invoices are
    /// permanently update-immutable.
    pub is_legacy: bool,
}

/// A client paired with the date of the most recent invoice addressed to it,
/// as returned by the activity-ordered listing. `last_activity` is `None`
/// for clients with no invoices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientActivity {
    pub client: Client,
    pub last_activity: Option<NaiveDate>,
}

/// One page of a keyset-paginated listing.
///
/// `next_cursor` is `Some` when more pages remain; feeding it back into the
/// same listing resumes strictly past the last returned item. `None` signals
/// the final page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// An empty terminal page.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }
}

/// Where an uploaded artifact landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocator {
    pub bucket: String,
    pub key: String,
    pub path: std::path::PathBuf,
}

/// Compound cursor for the activity-ordered client listing.
///
/// Wire format is `"<yyyyMMdd>|<nickname>"`. Clients with no invoices carry
/// the sentinel date key `"00000000"`, which sorts after every real date
/// under the descending activity order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCursor {
    /// Eight ASCII digits: `yyyyMMdd` of the last activity, or `00000000`.
    pub date_key: String,
    pub nickname: String,
}

/// Sentinel date key for clients with no invoice activity.
pub const NO_ACTIVITY_DATE_KEY: &str = "00000000";

impl ActivityCursor {
    /// Build a cursor from a listing row.
    pub fn new(last_activity: Option<NaiveDate>, nickname: impl Into<String>) -> Self {
        Self {
            date_key: match last_activity {
                Some(date) => date.format("%Y%m%d").to_string(),
                None => NO_ACTIVITY_DATE_KEY.to_string(),
            },
            nickname: nickname.into(),
        }
    }

    /// Serialize to the `"yyyyMMdd|nickname"` wire format.
    pub fn encode(&self) -> String {
        format!("{}|{}", self.date_key, self.nickname)
    }

    /// Parse the wire format, rejecting anything that is not eight digits,
    /// a pipe, and a non-empty nickname.
    pub fn parse(cursor: &str) -> Result<Self, FakturoError> {
        let (date_key, nickname) = cursor
            .split_once('|')
            .ok_or_else(|| FakturoError::InvalidArgument(format!("malformed cursor: {cursor}")))?;
        if date_key.len() != 8
            || !date_key.bytes().all(|b| b.is_ascii_digit())
            || nickname.is_empty()
        {
            return Err(FakturoError::InvalidArgument(format!(
                "malformed cursor: {cursor}"
            )));
        }
        Ok(Self {
            date_key: date_key.to_string(),
            nickname: nickname.to_string(),
        })
    }
}
