// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the Fakturo storage seams.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility; the
//! SQLite and filesystem implementations live in `fakturo-store` and
//! `fakturo-blob`.

pub mod blob;
pub mod directory;
pub mod ledger;

pub use blob::{BlobReader, BlobStore};
pub use directory::ClientDirectory;
pub use ledger::InvoiceLedger;
