// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `fakturo-core::types` for use across
//! the trait boundaries. This module re-exports them for convenience within
//! the storage crate.

pub use fakturo_core::types::{
    BankDetails, BillingAddress, Client, ClientActivity, ClientPatch, Invoice, InvoiceContent,
    LineItem, Page,
};
