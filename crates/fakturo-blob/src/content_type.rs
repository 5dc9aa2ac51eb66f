// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The configured content-type to file-extension table.

use std::collections::{BTreeMap, BTreeSet};

use fakturo_config::model::BlobConfig;

/// Bidirectional view over the configured content-type table.
///
/// Artifacts are stored under `<key>.<extension>`; the extension both
/// encodes the content type on disk and drives resolution when reading.
#[derive(Debug, Clone)]
pub struct ExtensionMap {
    by_content_type: BTreeMap<String, String>,
    extensions: BTreeSet<String>,
}

impl ExtensionMap {
    pub fn new(config: &BlobConfig) -> Self {
        Self {
            by_content_type: config.content_types.clone(),
            extensions: config.content_types.values().cloned().collect(),
        }
    }

    /// The extension artifacts of `content_type` are stored under, if the
    /// type is configured.
    pub fn extension_for(&self, content_type: &str) -> Option<&str> {
        self.by_content_type.get(content_type).map(String::as_str)
    }

    /// Whether `extension` belongs to the configured table.
    pub fn is_known(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    /// All configured extensions, in deterministic order.
    pub fn known(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}
