// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`ClientDirectory`] trait.

use async_trait::async_trait;

use fakturo_core::{ClientDirectory, FakturoError};

use crate::database::Database;
use crate::models::{Client, ClientActivity, ClientPatch, Page};
use crate::queries;

/// SQLite-backed client directory.
pub struct SqliteDirectory {
    db: Database,
}

impl SqliteDirectory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClientDirectory for SqliteDirectory {
    async fn add(&self, client: Client) -> Result<(), FakturoError> {
        queries::clients::add_client(&self.db, client).await
    }

    async fn get(&self, nickname: &str) -> Result<Client, FakturoError> {
        queries::clients::get_client(&self.db, nickname).await
    }

    async fn update(&self, nickname: &str, patch: ClientPatch) -> Result<(), FakturoError> {
        queries::clients::update_client(&self.db, nickname, patch).await
    }

    async fn delete(&self, nickname: &str) -> Result<(), FakturoError> {
        queries::clients::delete_client(&self.db, nickname).await
    }

    async fn list(&self, limit: u32, cursor: Option<&str>) -> Result<Page<Client>, FakturoError> {
        queries::clients::list_clients(&self.db, limit, cursor).await
    }

    async fn latest(
        &self,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<ClientActivity>, FakturoError> {
        queries::clients::latest_clients(&self.db, limit, cursor).await
    }
}
