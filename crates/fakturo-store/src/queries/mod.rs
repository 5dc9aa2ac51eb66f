// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the invoice ledger and client directory.

pub mod clients;
pub mod invoices;

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;

use fakturo_core::FakturoError;

/// Parse an invoice number argument: decimal digits only, within i64 range.
pub(crate) fn parse_number(number: &str) -> Result<i64, FakturoError> {
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FakturoError::InvalidArgument(format!(
            "invoice number must be decimal digits: {number:?}"
        )));
    }
    number.parse::<i64>().map_err(|_| {
        FakturoError::InvalidArgument(format!("invoice number out of range: {number}"))
    })
}

/// Format a date the way the `invoices.date` column stores it.
pub(crate) fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a stored date column, surfacing corruption as a conversion failure.
pub(crate) fn column_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Decode a JSON column into a domain value.
pub(crate) fn column_json<T: DeserializeOwned>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Encode a domain value for a JSON column.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, FakturoError> {
    serde_json::to_string(value).map_err(FakturoError::storage)
}
