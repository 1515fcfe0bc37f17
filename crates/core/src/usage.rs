//! Disk usage aggregation over a remote listing

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::lister::{ListRequest, Lister};
use crate::traits::ObjectStore;

/// Units accepted in a block size string
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockUnit {
    KB,
    MB,
    GB,
    TB,
}

impl BlockUnit {
    /// Bytes per unit (powers of ten)
    pub const fn bytes(self) -> u64 {
        match self {
            Self::KB => 1_000,
            Self::MB => 1_000_000,
            Self::GB => 1_000_000_000,
            Self::TB => 1_000_000_000_000,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KB => "KB",
            Self::MB => "MB",
            Self::GB => "GB",
            Self::TB => "TB",
        }
    }
}

/// A block size such as `1MB` or `500KB`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSize {
    pub count: u64,
    pub unit: BlockUnit,
}

impl BlockSize {
    /// Divisor in bytes
    pub const fn divisor(&self) -> u64 {
        self.count * self.unit.bytes()
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self {
            count: 1,
            unit: BlockUnit::KB,
        }
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.as_str())
    }
}

impl FromStr for BlockSize {
    type Err = Error;

    /// Strict parse of `<integer><unit>`, unit case-insensitive
    fn from_str(s: &str) -> Result<Self> {
        let input = s.trim();
        let invalid = |reason: &str| Error::InvalidBlockSize(format!("'{s}': {reason}"));

        if input.len() < 3 {
            return Err(invalid("not enough information"));
        }
        let split = input.len() - 2;
        if !input.is_char_boundary(split) {
            return Err(invalid("unrecognized unit"));
        }
        let (number, unit) = input.split_at(split);

        let unit = match unit.to_ascii_uppercase().as_str() {
            "KB" => BlockUnit::KB,
            "MB" => BlockUnit::MB,
            "GB" => BlockUnit::GB,
            "TB" => BlockUnit::TB,
            _ => return Err(invalid("unrecognized unit")),
        };
        let count: u64 = number
            .trim()
            .parse()
            .map_err(|_| invalid("count is not a positive integer"))?;
        if count == 0 || count.checked_mul(unit.bytes()).is_none() {
            return Err(invalid("count out of range"));
        }

        Ok(Self { count, unit })
    }
}

/// Parse a block size, falling back to 1KB on malformed input.
///
/// The fallback is logged at warn level; use [`BlockSize::from_str`] to get
/// the error instead.
pub fn parse_block_size(input: &str) -> BlockSize {
    parse_with_fallback(input).0
}

fn parse_with_fallback(input: &str) -> (BlockSize, Option<Error>) {
    match input.parse() {
        Ok(size) => (size, None),
        Err(e) => {
            let fallback = BlockSize::default();
            tracing::warn!(error = %e, "defaulting block size to {fallback}");
            (fallback, Some(e))
        }
    }
}

/// Aggregated size of a listing
#[derive(Debug, Clone, Serialize)]
pub struct DiskUsage {
    /// Total size expressed in `unit`
    pub total: f64,
    /// Effective block size, after any fallback
    pub unit: String,
    /// Number of objects counted
    pub objects: usize,
    /// Total size in bytes
    pub bytes: u64,
    /// Set when the requested block size was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Sum object sizes under a listing request, scaled by `block_size`.
pub async fn disk_usage(
    store: &dyn ObjectStore,
    bucket: &str,
    request: &ListRequest,
    block_size: &str,
) -> Result<DiskUsage> {
    let (size, warning) = parse_with_fallback(block_size);
    let records = Lister::new(store).list(bucket, request).await?;

    let bytes: u64 = records.iter().map(|r| r.size()).sum();
    let total = bytes as f64 / size.divisor() as f64;

    Ok(DiskUsage {
        total,
        unit: size.to_string(),
        objects: records.len(),
        bytes,
        warning: warning.map(|e| e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ListingPage, MockObjectStore, ObjectRecord};

    #[test]
    fn test_parse_known_units() {
        assert_eq!(parse_block_size("1MB").divisor(), 1_000_000);
        assert_eq!(parse_block_size("2GB").divisor(), 2_000_000_000);
        assert_eq!(parse_block_size("3tb").divisor(), 3_000_000_000_000);
        assert_eq!(parse_block_size("500KB").divisor(), 500_000);
    }

    #[test]
    fn test_parse_falls_back_to_1kb() {
        assert_eq!(parse_block_size("X").divisor(), 1_000);
        assert_eq!(parse_block_size("5ZZ").divisor(), 1_000);
        assert_eq!(parse_block_size("abMB").divisor(), 1_000);
        assert_eq!(parse_block_size("0MB").divisor(), 1_000);
    }

    #[test]
    fn test_strict_parse_errors() {
        assert!(matches!("X".parse::<BlockSize>(), Err(Error::InvalidBlockSize(_))));
        assert!(matches!("5ZZ".parse::<BlockSize>(), Err(Error::InvalidBlockSize(_))));
        assert!(matches!("1€".parse::<BlockSize>(), Err(Error::InvalidBlockSize(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(parse_block_size("10gb").to_string(), "10GB");
        assert_eq!(parse_block_size("??").to_string(), "1KB");
    }

    fn store_with_sizes(sizes: &'static [u64]) -> MockObjectStore {
        let mut store = MockObjectStore::new();
        store.expect_list_objects().returning(move |_, _| {
            Ok(ListingPage {
                items: sizes
                    .iter()
                    .enumerate()
                    .map(|(i, s)| ObjectRecord::file(format!("k{i}"), *s))
                    .collect(),
                ..Default::default()
            })
        });
        store
    }

    #[tokio::test]
    async fn test_disk_usage_sums_sizes() {
        let store = store_with_sizes(&[1000, 2000, 3000]);
        let usage = disk_usage(&store, "b", &ListRequest::new(""), "1KB")
            .await
            .unwrap();
        assert_eq!(usage.total, 6.0);
        assert_eq!(usage.unit, "1KB");
        assert_eq!(usage.objects, 3);
        assert_eq!(usage.bytes, 6000);
        assert!(usage.warning.is_none());
    }

    #[tokio::test]
    async fn test_disk_usage_fractional() {
        let store = store_with_sizes(&[1500]);
        let usage = disk_usage(&store, "b", &ListRequest::new(""), "1MB")
            .await
            .unwrap();
        assert_eq!(usage.total, 0.0015);
    }

    #[tokio::test]
    async fn test_disk_usage_reports_fallback() {
        let store = store_with_sizes(&[1000, 2000, 3000]);
        let usage = disk_usage(&store, "b", &ListRequest::new(""), "5ZZ")
            .await
            .unwrap();
        assert_eq!(usage.total, 6.0);
        assert_eq!(usage.unit, "1KB");
        assert!(usage.warning.is_some());
    }
}
