// SPDX-FileCopyrightText: 2026 Fakturo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem blob storage for rendered invoice artifacts.
//!
//! Buckets are defined at runtime and map to directories on disk. Logical
//! keys are relative slash-separated paths; the file extension is derived
//! from the upload content type and hidden from the key space. Writes
//! publish atomically via rename so concurrent processes sharing a bucket
//! directory never observe partial artifacts.

pub mod content_type;
pub mod store;

pub use content_type::ExtensionMap;
pub use store::FsBlobStore;
