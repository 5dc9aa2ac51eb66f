// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice ledger trait: numbering, ordering, and invoice CRUD.

use async_trait::async_trait;

use crate::error::FakturoError;
use crate::types::{Invoice, InvoiceContent, Page};

/// Allocates invoice numbers and stores invoices under the numbering and
/// date-ordering invariants.
///
/// Numbers are decimal-digit strings, unique and strictly increasing in
/// commit order for invoices created through [`create`](Self::create).
/// Across the full number-ordered history the invoice date is non-decreasing;
/// legacy imports are exempt from the date check but still advance the
/// sequence so future numbers never collide with them.
#[async_trait]
pub trait InvoiceLedger: Send + Sync + 'static {
    /// Issue a new invoice under the next sequence number.
    ///
    /// Fails with [`FakturoError::OrderingViolation`] if `content.date` is
    /// earlier than the date of the highest-numbered existing invoice. A
    /// rolled-back allocation leaves a permanent gap; numbers are never
    /// reused.
    async fn create(&self, content: InvoiceContent) -> Result<Invoice, FakturoError>;

    /// Exact lookup by number.
    async fn get(&self, number: &str) -> Result<Invoice, FakturoError>;

    /// Replace the content of an existing invoice wholesale and mark it
    /// corrected.
    ///
    /// Fails `NotFound` if absent, `Immutable` if the stored invoice is a
    /// legacy import, and `OrderingViolation` if the new date falls outside
    /// the window spanned by the numeric predecessor and successor.
    async fn update(&self, number: &str, content: InvoiceContent) -> Result<(), FakturoError>;

    /// Backfill a historical invoice under an explicit number.
    ///
    /// Fails `AlreadyExists` if the number is taken. The imported invoice is
    /// flagged legacy, skips the date-ordering check, and advances the
    /// sequence counter past its number.
    async fn import_legacy(
        &self,
        content: InvoiceContent,
        number: &str,
    ) -> Result<Invoice, FakturoError>;

    /// Page through invoices newest-first (numeric number descending).
    ///
    /// `cursor` is the number of the last invoice on the previous page; the
    /// next page resumes with numbers strictly below it.
    async fn latest(&self, limit: u32, cursor: Option<&str>)
    -> Result<Page<Invoice>, FakturoError>;
}
