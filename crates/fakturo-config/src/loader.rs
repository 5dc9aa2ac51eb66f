// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./fakturo.toml` > `~/.config/fakturo/fakturo.toml`
//! > `/etc/fakturo/fakturo.toml` with environment variable overrides via the
//! `FAKTURO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::FakturoConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/fakturo/fakturo.toml` (system-wide)
/// 3. `~/.config/fakturo/fakturo.toml` (user XDG config)
/// 4. `./fakturo.toml` (local directory)
/// 5. `FAKTURO_*` environment variables
pub fn load_config() -> Result<FakturoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FakturoConfig::default()))
        .merge(Toml::file("/etc/fakturo/fakturo.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("fakturo/fakturo.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("fakturo.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an inline TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<FakturoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FakturoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FakturoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FakturoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `FAKTURO_INVOICES_START_NUMBER` must map
/// to `invoices.start_number`, not `invoices.start.number`.
fn env_provider() -> Env {
    Env::prefixed("FAKTURO_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: FAKTURO_INVOICES_START_NUMBER -> "invoices_start_number"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("storage_", "storage.", 1)
            .replacen("invoices_", "invoices.", 1)
            .replacen("blob_", "blob.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
            [storage]
            path = "/var/lib/fakturo/store.db"

            [invoices]
            start_number = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.path, "/var/lib/fakturo/store.db");
        assert_eq!(config.invoices.start_number, 1000);
        // Untouched sections keep their defaults.
        assert!(config.blob.content_types.contains_key("application/pdf"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_config_from_str(
            r#"
            [storage]
            pathh = "typo.db"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn content_type_table_is_replaceable() {
        let config = load_config_from_str(
            r#"
            [blob.content_types]
            "application/pdf" = "pdf"
            "image/webp" = "webp"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.blob.content_types.get("image/webp"),
            Some(&"webp".to_string())
        );
    }
}
