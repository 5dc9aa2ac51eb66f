// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem-backed blob store.
//!
//! Publication is atomic without any cross-process lock: content is written
//! to a uniquely named `.tmp` sibling, fsynced, and renamed into the final
//! path. Rename-replace is atomic on POSIX filesystems, so a reader can
//! never observe a partial artifact; concurrent writes to one key race at
//! the rename step and the most recent rename wins wholesale.

use std::collections::{BTreeSet, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use fakturo_config::model::BlobConfig;
use fakturo_core::{BlobLocator, BlobReader, BlobStore, FakturoError, Page};

use crate::content_type::ExtensionMap;

/// Blob store rooted in runtime-defined bucket directories.
pub struct FsBlobStore {
    buckets: RwLock<HashMap<String, PathBuf>>,
    types: ExtensionMap,
}

impl FsBlobStore {
    pub fn new(config: &BlobConfig) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            types: ExtensionMap::new(config),
        }
    }

    async fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, FakturoError> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .cloned()
            .ok_or_else(|| FakturoError::not_found("bucket", bucket))
    }

    /// Find the on-disk file for a logical key: each known extension in
    /// turn, then an extensionless fallback for artifacts written before
    /// extensions were introduced.
    async fn resolve(&self, dir: &Path, key: &str) -> Result<Option<PathBuf>, FakturoError> {
        for ext in self.types.known() {
            let candidate = dir.join(format!("{key}.{ext}"));
            if file_exists(&candidate).await.map_err(FakturoError::storage)? {
                return Ok(Some(candidate));
            }
        }
        let bare = dir.join(key);
        if file_exists(&bare).await.map_err(FakturoError::storage)? {
            return Ok(Some(bare));
        }
        Ok(None)
    }

    /// Remove every on-disk variant of `key` except `keep`, returning how
    /// many files went away. Keeps the invariant that a key exists under at
    /// most one extension, so resolution is never ambiguous.
    async fn remove_variants(
        &self,
        dir: &Path,
        key: &str,
        keep: Option<&Path>,
    ) -> Result<usize, FakturoError> {
        let mut candidates: Vec<PathBuf> = self
            .types
            .known()
            .map(|ext| dir.join(format!("{key}.{ext}")))
            .collect();
        candidates.push(dir.join(key));

        let mut removed = 0;
        for candidate in candidates {
            if keep.is_some_and(|k| k == candidate.as_path()) {
                continue;
            }
            match fs::remove_file(&candidate).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(FakturoError::storage(e)),
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn define_bucket(&self, name: &str, directory: &Path) -> Result<(), FakturoError> {
        fs::create_dir_all(directory)
            .await
            .map_err(FakturoError::storage)?;
        self.buckets
            .write()
            .await
            .insert(name.to_string(), directory.to_path_buf());
        debug!(bucket = name, directory = %directory.display(), "bucket defined");
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<BlobLocator, FakturoError> {
        validate_key(key)?;
        let dir = self.bucket_dir(bucket).await?;
        let ext = self.types.extension_for(content_type).ok_or_else(|| {
            FakturoError::UnsupportedContentType {
                content_type: content_type.to_string(),
            }
        })?;

        let final_path = dir.join(format!("{key}.{ext}"));
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(FakturoError::storage)?;
        }
        let tmp_path = temp_sibling(&final_path);

        let publish = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(content).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp_path, &final_path).await
        };
        if let Err(err) = publish.await {
            // Never leave a partial artifact behind.
            let _ = fs::remove_file(&tmp_path).await;
            return Err(FakturoError::storage(err));
        }
        // A re-upload under a different content type lands at a new
        // extension; drop the old variant so the key resolves to exactly
        // the published bytes.
        self.remove_variants(&dir, key, Some(final_path.as_path()))
            .await?;

        debug!(bucket, key, "blob published");
        Ok(BlobLocator {
            bucket: bucket.to_string(),
            key: key.to_string(),
            path: final_path,
        })
    }

    async fn open_read(&self, bucket: &str, key: &str) -> Result<BlobReader, FakturoError> {
        validate_key(key)?;
        let dir = self.bucket_dir(bucket).await?;
        let path = self
            .resolve(&dir, key)
            .await?
            .ok_or_else(|| FakturoError::not_found("blob", key))?;
        let file = fs::File::open(&path).await.map_err(FakturoError::storage)?;
        Ok(Box::pin(file))
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, FakturoError> {
        validate_key(key)?;
        // An undefined bucket holds nothing; that is not an error here.
        let dir = match self.buckets.read().await.get(bucket).cloned() {
            Some(dir) => dir,
            None => return Ok(false),
        };
        Ok(self.resolve(&dir, key).await?.is_some())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), FakturoError> {
        validate_key(key)?;
        let dir = self.bucket_dir(bucket).await?;
        if self.remove_variants(&dir, key, None).await? == 0 {
            return Err(FakturoError::not_found("blob", key));
        }
        debug!(bucket, key, "blob deleted");
        Ok(())
    }

    async fn rename(
        &self,
        bucket: &str,
        src_key: &str,
        dst_key: &str,
    ) -> Result<(), FakturoError> {
        validate_key(src_key)?;
        validate_key(dst_key)?;
        if src_key == dst_key {
            return Err(FakturoError::InvalidArgument(
                "source and destination keys are equal".into(),
            ));
        }
        let dir = self.bucket_dir(bucket).await?;
        let src_path = self
            .resolve(&dir, src_key)
            .await?
            .ok_or_else(|| FakturoError::not_found("blob", src_key))?;

        // The source extension encodes the content type; the destination
        // keeps it. An extensionless legacy source stays extensionless.
        let dst_path = match src_path.extension().and_then(|e| e.to_str()) {
            Some(ext) if self.types.is_known(ext) => dir.join(format!("{dst_key}.{ext}")),
            _ => dir.join(dst_key),
        };
        if let Some(parent) = dst_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(FakturoError::storage)?;
        }
        fs::rename(&src_path, &dst_path)
            .await
            .map_err(FakturoError::storage)?;
        // The move may have displaced an artifact stored under a different
        // extension; clear it so the destination key stays unambiguous.
        self.remove_variants(&dir, dst_key, Some(dst_path.as_path()))
            .await?;
        debug!(bucket, src_key, dst_key, "blob renamed");
        Ok(())
    }

    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<String>, FakturoError> {
        let dir = self.bucket_dir(bucket).await?;
        if limit == 0 {
            return Ok(Page::empty());
        }

        // Recursively enumerate files, strip known extensions to recover
        // logical keys, and dedupe (one key may exist under several
        // extensions).
        let mut keys = BTreeSet::new();
        let mut stack = vec![dir.clone()];
        while let Some(current) = stack.pop() {
            let mut entries = fs::read_dir(&current).await.map_err(FakturoError::storage)?;
            while let Some(entry) = entries.next_entry().await.map_err(FakturoError::storage)? {
                let file_type = entry.file_type().await.map_err(FakturoError::storage)?;
                let path = entry.path();
                if file_type.is_dir() {
                    stack.push(path);
                    continue;
                }
                let Ok(rel) = path.strip_prefix(&dir) else {
                    continue;
                };
                let rel = rel.to_string_lossy().replace('\\', "/");
                if rel.ends_with(".tmp") {
                    // In-flight or abandoned upload.
                    continue;
                }
                let key = logical_key(&rel, &self.types);
                if key.starts_with(prefix) {
                    keys.insert(key);
                }
            }
        }

        let all: Vec<String> = keys.into_iter().collect();
        let start = match cursor {
            Some(c) => all.partition_point(|k| k.as_str() <= c),
            None => 0,
        };
        let items: Vec<String> = all[start..]
            .iter()
            .take(limit as usize)
            .cloned()
            .collect();
        let next_cursor = if start + items.len() < all.len() {
            items.last().cloned()
        } else {
            None
        };
        Ok(Page { items, next_cursor })
    }
}

/// Strip a known extension from the final path segment to recover the
/// logical key; unknown extensions are part of the key.
fn logical_key(rel: &str, types: &ExtensionMap) -> String {
    let (dir_part, file) = match rel.rsplit_once('/') {
        Some((d, f)) => (Some(d), f),
        None => (None, rel),
    };
    let logical_file = match file.rsplit_once('.') {
        Some((stem, ext)) if types.is_known(ext) => stem,
        _ => file,
    };
    match dir_part {
        Some(d) => format!("{d}/{logical_file}"),
        None => logical_file.to_string(),
    }
}

/// Uniquely named temporary sibling of `path`, in the same directory so the
/// final rename never crosses a filesystem boundary.
fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{file_name}.{}.tmp", Uuid::new_v4().simple()))
}

/// Keys are relative, slash-separated paths without traversal segments.
fn validate_key(key: &str) -> Result<(), FakturoError> {
    let well_formed = !key.is_empty()
        && !key.starts_with('/')
        && !key.ends_with('/')
        && !key.contains('\\')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    if well_formed {
        Ok(())
    } else {
        Err(FakturoError::InvalidArgument(format!(
            "malformed blob key: {key:?}"
        )))
    }
}

async fn file_exists(path: &Path) -> std::io::Result<bool> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
