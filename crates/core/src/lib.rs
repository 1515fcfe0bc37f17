//! isd-core: batch transfer and enumeration engine for isd
//!
//! This crate provides the core functionality for the isd CLI, including:
//! - Configuration management
//! - ObjectStore trait for S3 operations
//! - Exhaustive, regex-filtered remote listing
//! - Disk usage aggregation
//! - Concurrent batch upload and delete with per-task outcomes
//! - Per-file metadata resolution and metadata search
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! allowing for easy testing and potential future support for other backends.

pub mod config;
pub mod error;
pub mod lister;
pub mod metadata;
pub mod object;
pub mod search;
pub mod traits;
pub mod transfer;
pub mod usage;
pub mod walker;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{Config, ConfigManager, StoreConfig};
pub use error::{Error, Result};
pub use lister::{KeyPattern, ListRequest, Lister};
pub use metadata::{MetadataResolver, MetadataSpec};
pub use search::search_metadata;
pub use traits::{ListOptions, ListingPage, Metadata, ObjectRecord, ObjectStore};
pub use transfer::{
    BatchResult, TaskOutcome, TaskReport, TransferAction, TransferConfig, TransferEngine,
    TransferTask, UploadRequest,
};
pub use usage::{BlockSize, DiskUsage, disk_usage, parse_block_size};
pub use walker::get_filelist;
