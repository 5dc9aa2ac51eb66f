// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`InvoiceLedger`] trait.

use async_trait::async_trait;

use fakturo_config::model::InvoiceConfig;
use fakturo_core::{FakturoError, InvoiceLedger};

use crate::database::Database;
use crate::models::{Invoice, InvoiceContent, Page};
use crate::queries;

/// SQLite-backed invoice ledger.
///
/// Wraps a [`Database`] handle and delegates to the typed query module; the
/// configured start number seeds the sequence singleton on first use.
pub struct SqliteLedger {
    db: Database,
    start_number: i64,
}

impl SqliteLedger {
    pub fn new(db: Database, config: &InvoiceConfig) -> Self {
        Self {
            db,
            start_number: config.start_number,
        }
    }
}

#[async_trait]
impl InvoiceLedger for SqliteLedger {
    async fn create(&self, content: InvoiceContent) -> Result<Invoice, FakturoError> {
        queries::invoices::create_invoice(&self.db, self.start_number, content).await
    }

    async fn get(&self, number: &str) -> Result<Invoice, FakturoError> {
        queries::invoices::get_invoice(&self.db, number).await
    }

    async fn update(&self, number: &str, content: InvoiceContent) -> Result<(), FakturoError> {
        queries::invoices::update_invoice(&self.db, number, content).await
    }

    async fn import_legacy(
        &self,
        content: InvoiceContent,
        number: &str,
    ) -> Result<Invoice, FakturoError> {
        queries::invoices::import_invoice(&self.db, self.start_number, number, content).await
    }

    async fn latest(
        &self,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Invoice>, FakturoError> {
        queries::invoices::latest_invoices(&self.db, limit, cursor).await
    }
}
