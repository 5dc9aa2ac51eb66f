// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Fakturo invoicing core.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single
//! in-process writer via `tokio-rusqlite`, and a cross-process serialized
//! transaction executor (`BEGIN IMMEDIATE`) under which the invoice ledger
//! and client directory run all of their mutations.

pub mod database;
pub mod directory;
pub mod executor;
pub mod ledger;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use directory::SqliteDirectory;
pub use ledger::SqliteLedger;
pub use models::*;
