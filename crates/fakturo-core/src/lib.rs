// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Fakturo invoicing system.
//!
//! This crate provides the foundational trait definitions, error taxonomy,
//! and domain types shared across the Fakturo workspace. The persistence
//! implementations live in `fakturo-store` (SQLite) and `fakturo-blob`
//! (filesystem).

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FakturoError;
pub use traits::{BlobReader, BlobStore, ClientDirectory, InvoiceLedger};
pub use types::{
    ActivityCursor, BankDetails, BillingAddress, BlobLocator, Client, ClientActivity, ClientPatch,
    Invoice, InvoiceContent, LineItem, Page,
};
