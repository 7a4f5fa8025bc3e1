//! Blob storage. Thin wrapper around the AWS S3 SDK.
//!
//! Generated artifacts are uploaded under keys that mirror the local scratch
//! layout, `{eventCode}/{id}/{filename}.{ext}`, into the single configured
//! bucket. The store is addressed by the `STORAGE_CONNECTION` connection
//! string plus `CONTAINER_NAME`, so any S3-compatible endpoint works.

mod client;
mod error;

use std::path::Path;

use async_trait::async_trait;

pub use client::BlobStorage;
pub use error::StorageError;

/// Write access to the blob store, the pipeline's upload seam.
#[async_trait]
pub trait BlobUploader: Send + Sync {
    /// Uploads a local artifact under `key`. A missing local file is treated
    /// as "nothing to upload": the call returns `Ok(false)` without touching
    /// the network.
    async fn upload(&self, key: &str, local_path: &Path) -> Result<bool, StorageError>;
}
