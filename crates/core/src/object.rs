//! Single-object operations
//!
//! Thin wrappers over the store for one object at a time. Failures are
//! returned directly to the caller.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::metadata::MetadataSpec;
use crate::traits::{Metadata, ObjectRecord, ObjectStore};

/// List buckets
pub async fn list_buckets(store: &dyn ObjectStore) -> Result<Vec<ObjectRecord>> {
    tracing::info!("Listing buckets");
    store.list_buckets().await
}

/// Upload one file, with metadata from an optional spec
pub async fn upload_object(
    store: &dyn ObjectStore,
    bucket: &str,
    local_file: &Path,
    key: &str,
    metadata: Option<MetadataSpec>,
) -> Result<()> {
    let metadata = match metadata {
        Some(spec) => {
            spec.resolve()?
                .metadata_for(&local_file.to_string_lossy())
                .await?
        }
        None => Metadata::new(),
    };
    store.upload(bucket, key, local_file, &metadata).await
}

/// Delete one object
pub async fn delete_object(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<()> {
    store.delete(bucket, key).await
}

/// Get the user metadata of one object
pub async fn get_metadata(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<Metadata> {
    store.get_metadata(bucket, key).await
}

/// Download an object into `write_dir`, named after the last key segment.
///
/// Returns the path written.
pub async fn get_object(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    write_dir: &Path,
) -> Result<PathBuf> {
    let name = key.rsplit('/').next().unwrap_or(key);
    if name.is_empty() {
        return Err(Error::General(format!("Key '{key}' has no file name")));
    }

    let local_path = write_dir.join(name);
    store.download(bucket, key, &local_path).await?;
    tracing::debug!(bucket, key, path = %local_path.display(), "downloaded object");
    Ok(local_path)
}
