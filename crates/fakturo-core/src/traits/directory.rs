// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client directory trait: natural-key client records with rename support.

use async_trait::async_trait;

use crate::error::FakturoError;
use crate::types::{Client, ClientActivity, ClientPatch, Page};

/// Stores client records keyed by their globally unique nickname.
#[async_trait]
pub trait ClientDirectory: Send + Sync + 'static {
    /// Insert a new client.
    ///
    /// The race guard is the storage engine's unique constraint, not a
    /// pre-check: of K concurrent adds for one nickname exactly one wins and
    /// the rest fail [`FakturoError::AlreadyExists`].
    async fn add(&self, client: Client) -> Result<(), FakturoError>;

    /// Exact lookup by nickname.
    async fn get(&self, nickname: &str) -> Result<Client, FakturoError>;

    /// Update a client in place, optionally renaming it.
    ///
    /// A rename deletes the old row and inserts the new one in a single
    /// exclusive transaction, so the client is never visible under zero or
    /// two nicknames. Renaming onto a different, taken nickname fails
    /// `AlreadyExists`. Concurrent updates to one client resolve
    /// last-writer-wins with whole payloads; no field-level merging.
    async fn update(&self, nickname: &str, patch: ClientPatch) -> Result<(), FakturoError>;

    /// Remove a client. Fails `NotFound` if absent.
    async fn delete(&self, nickname: &str) -> Result<(), FakturoError>;

    /// Page through clients in nickname-ascending order; `cursor` is the
    /// last nickname of the previous page.
    async fn list(&self, limit: u32, cursor: Option<&str>) -> Result<Page<Client>, FakturoError>;

    /// Page through clients by most recent invoice activity, descending.
    ///
    /// Activity is the latest invoice date whose buyer name equals the
    /// client's display name case-insensitively. Clients with no invoices
    /// sort last, nickname-ascending among themselves. The cursor is the
    /// compound `"yyyyMMdd|nickname"` key.
    async fn latest(
        &self,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<ClientActivity>, FakturoError>;
}
