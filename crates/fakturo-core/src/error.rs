// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Fakturo invoicing core.

use thiserror::Error;

/// The primary error type used across all Fakturo traits and core operations.
///
/// The first six variants are the domain taxonomy surfaced to callers; the
/// remaining variants cover ambient failures (storage engine, configuration).
/// Mapping any of these to user-facing text is the responsibility of layers
/// above this core.
#[derive(Debug, Error)]
pub enum FakturoError {
    /// The addressed entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// An entity with the same key already exists.
    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },

    /// An invoice date would break the non-decreasing-with-number invariant.
    #[error("date ordering violation: {message}")]
    OrderingViolation { message: String },

    /// Edit attempted on a legacy import, which is permanently read-only.
    #[error("invoice {number} is a legacy import and cannot be updated")]
    Immutable { number: String },

    /// No file extension is configured for the given content type.
    #[error("unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// A caller-supplied argument is malformed (bad cursor, bad key, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Storage backend errors (database connection, query failure, file I/O).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),
}

impl FakturoError {
    /// Wrap any error as a [`FakturoError::Storage`].
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Shorthand for [`FakturoError::NotFound`].
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Shorthand for [`FakturoError::AlreadyExists`].
    pub fn already_exists(entity: &'static str, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity,
            key: key.into(),
        }
    }

    /// Shorthand for [`FakturoError::OrderingViolation`].
    pub fn ordering(message: impl Into<String>) -> Self {
        Self::OrderingViolation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_entity_and_key() {
        let err = FakturoError::not_found("client", "acme");
        assert_eq!(err.to_string(), "client not found: acme");

        let err = FakturoError::already_exists("invoice", "42");
        assert_eq!(err.to_string(), "invoice already exists: 42");
    }

    #[test]
    fn immutable_names_the_invoice() {
        let err = FakturoError::Immutable {
            number: "7".into(),
        };
        assert!(err.to_string().contains("legacy import"));
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn storage_wraps_source() {
        let err = FakturoError::storage(std::io::Error::other("disk gone"));
        assert!(err.to_string().contains("disk gone"));
    }
}
