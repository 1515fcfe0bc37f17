//! ObjectStore trait definition
//!
//! This trait defines the interface for S3-compatible storage operations.
//! It allows the engine to be decoupled from the specific S3 SDK implementation.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// User metadata attached to an object (string to string)
pub type Metadata = BTreeMap<String, String>;

/// One remote object as returned by a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Object key or bucket name
    pub key: String,

    /// Size in bytes (None for buckets and common prefixes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Storage class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// Whether this is a common prefix (one-level "directory")
    pub is_dir: bool,
}

impl ObjectRecord {
    /// Create a new ObjectRecord for an object
    pub fn file(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(size, humansize::DECIMAL)),
            last_modified: None,
            etag: None,
            storage_class: None,
            is_dir: false,
        }
    }

    /// Create a new ObjectRecord for a common prefix
    pub fn dir(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
            etag: None,
            storage_class: None,
            is_dir: true,
        }
    }

    /// Create a new ObjectRecord for a bucket
    pub fn bucket(name: impl Into<String>) -> Self {
        Self::dir(name)
    }

    /// Size in bytes, zero for prefixes and buckets
    pub fn size(&self) -> u64 {
        self.size_bytes.unwrap_or(0)
    }
}

/// One page of a paginated listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingPage {
    /// Objects in store order
    pub items: Vec<ObjectRecord>,

    /// Common prefixes, only populated for delimiter listings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub common_prefixes: Vec<String>,

    /// Whether more pages are available
    pub truncated: bool,

    /// Continuation token for the next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

/// Options for a single list request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Prefix to filter by
    pub prefix: String,

    /// Delimiter for grouping (usually "/")
    pub delimiter: Option<String>,

    /// Continuation token from the previous page
    pub continuation_token: Option<String>,

    /// Maximum number of keys to return per request
    pub max_keys: Option<i32>,
}

/// Trait for S3-compatible storage operations
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
/// Implementations must be safe to share across concurrent transfers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List buckets
    async fn list_buckets(&self) -> Result<Vec<ObjectRecord>>;

    /// Request one page of objects
    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListingPage>;

    /// Upload a local file, attaching `metadata` when it is not empty
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        metadata: &Metadata,
    ) -> Result<()>;

    /// Delete an object
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;

    /// Get the user metadata of an object
    async fn get_metadata(&self, bucket: &str, key: &str) -> Result<Metadata>;

    /// Download an object to a local file
    async fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()>;
}
