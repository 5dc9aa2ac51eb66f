// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blob store trait: bucket-scoped atomic artifact storage.

use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::FakturoError;
use crate::types::{BlobLocator, Page};

/// A readable byte stream handed back by [`BlobStore::open_read`].
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

/// Bucket-scoped artifact storage on top of a shared directory tree.
///
/// Every publication is atomic: an artifact is written to a uniquely named
/// temporary sibling and renamed into place, so readers never observe a
/// partial write. Concurrent uploads to one key race at the rename step and
/// the last rename wins wholesale.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Register a bucket backed by `directory`, creating it if absent.
    /// Idempotent.
    async fn define_bucket(&self, name: &str, directory: &Path) -> Result<(), FakturoError>;

    /// Atomically publish `content` under `key`, silently replacing any
    /// existing artifact. The file extension comes from the configured
    /// content-type table; an unmapped type fails
    /// [`FakturoError::UnsupportedContentType`].
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<BlobLocator, FakturoError>;

    /// Open the artifact at `key` for reading, trying each known extension
    /// and then an extensionless fallback for artifacts written before
    /// extensions were introduced.
    async fn open_read(&self, bucket: &str, key: &str) -> Result<BlobReader, FakturoError>;

    /// Whether an artifact exists at `key`. An undefined bucket yields
    /// `false`, not an error.
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, FakturoError>;

    /// Remove the artifact at `key`. Fails `NotFound` if absent.
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), FakturoError>;

    /// Atomically move an artifact to a new key, keeping the extension
    /// inferred from the source. `src == dst` is `InvalidArgument`.
    async fn rename(&self, bucket: &str, src_key: &str, dst_key: &str)
    -> Result<(), FakturoError>;

    /// List logical keys under `prefix`, lexicographically sorted, resuming
    /// strictly past `cursor`.
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<String>, FakturoError>;
}
