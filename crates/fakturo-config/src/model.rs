// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Fakturo invoicing core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Fakturo configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FakturoConfig {
    /// Database storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Invoice numbering settings.
    #[serde(default)]
    pub invoices: InvoiceConfig,

    /// Blob store settings.
    #[serde(default)]
    pub blob: BlobConfig,
}

/// Database storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the shared SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "fakturo.db".to_string()
}

/// Invoice numbering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InvoiceConfig {
    /// The number assigned to the first invoice created in an empty store.
    #[serde(default = "default_start_number")]
    pub start_number: i64,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            start_number: default_start_number(),
        }
    }
}

fn default_start_number() -> i64 {
    1
}

/// Blob store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlobConfig {
    /// Maps MIME content types to the file extension artifacts are stored
    /// under. Uploads with an unmapped content type are rejected.
    #[serde(default = "default_content_types")]
    pub content_types: BTreeMap<String, String>,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            content_types: default_content_types(),
        }
    }
}

fn default_content_types() -> BTreeMap<String, String> {
    [
        ("application/pdf", "pdf"),
        ("text/html", "html"),
        ("image/png", "png"),
        ("image/jpeg", "jpg"),
        ("text/plain", "txt"),
    ]
    .into_iter()
    .map(|(mime, ext)| (mime.to_string(), ext.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = FakturoConfig::default();
        assert_eq!(config.storage.path, "fakturo.db");
        assert_eq!(config.invoices.start_number, 1);
        assert_eq!(
            config.blob.content_types.get("application/pdf"),
            Some(&"pdf".to_string())
        );
    }
}
