//! Remote listing
//!
//! Turns the store's paginated listing into one exhaustive sequence of
//! records, with optional anchored regex filtering on keys and a single-level
//! "directory" mode.

use regex::Regex;

use crate::error::Result;
use crate::traits::{ListOptions, ObjectRecord, ObjectStore};

/// Delimiter used for directory-style listings
pub const DIRECTORY_DELIMITER: &str = "/";

/// Regex applied to full object keys, anchored at the start of the key.
///
/// `abc/` matches `abc/def` but `bc/` does not: the match must begin at
/// position 0, although it need not consume the whole key. The pattern is
/// compiled as given, so it must be a valid regex on its own.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    source: String,
    regex: Regex,
}

impl KeyPattern {
    /// Compile a pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Compile an optional pattern
    pub fn optional(pattern: Option<&str>) -> Result<Option<Self>> {
        pattern.map(Self::new).transpose()
    }

    /// Check whether a key matches starting at its first byte
    pub fn is_match(&self, key: &str) -> bool {
        // leftmost-first: if any match starts at 0, the first one found does
        self.regex.find(key).is_some_and(|m| m.start() == 0)
    }

    /// The pattern as given by the caller
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// What to list
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    /// Key prefix sent to the store
    pub prefix: String,
    /// Post-filter applied to every collected key
    pub pattern: Option<KeyPattern>,
    /// List one level only, returning common prefixes when there are any
    pub directory: bool,
}

impl ListRequest {
    /// List everything under a prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// Keep only keys matching `pattern`
    pub fn with_pattern(mut self, pattern: Option<KeyPattern>) -> Self {
        self.pattern = pattern;
        self
    }

    /// Switch to single-level listing
    pub fn with_directory(mut self, directory: bool) -> Self {
        self.directory = directory;
        self
    }
}

/// Exhaustive lister over an [`ObjectStore`]
pub struct Lister<'a> {
    store: &'a dyn ObjectStore,
    page_size: Option<i32>,
}

impl<'a> Lister<'a> {
    /// Create a lister using the store's default page size
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            page_size: None,
        }
    }

    /// Request pages of at most `page_size` keys
    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// List records in store order.
    ///
    /// Store failures are returned as-is; no retry happens here.
    pub async fn list(&self, bucket: &str, request: &ListRequest) -> Result<Vec<ObjectRecord>> {
        let mut records = if request.directory {
            self.list_directory(bucket, &request.prefix).await?
        } else {
            self.list_all(bucket, &request.prefix).await?
        };

        if let Some(pattern) = &request.pattern {
            let before = records.len();
            records.retain(|r| pattern.is_match(&r.key));
            tracing::debug!(
                pattern = pattern.as_str(),
                before,
                after = records.len(),
                "filtered listing"
            );
        }

        Ok(records)
    }

    /// List keys only
    pub async fn list_keys(&self, bucket: &str, request: &ListRequest) -> Result<Vec<String>> {
        let records = self.list(bucket, request).await?;
        Ok(records.into_iter().map(|r| r.key).collect())
    }

    async fn list_all(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectRecord>> {
        let mut records = Vec::new();
        let mut continuation_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let options = ListOptions {
                prefix: prefix.to_string(),
                delimiter: None,
                continuation_token: continuation_token.take(),
                max_keys: self.page_size,
            };
            let page = self.store.list_objects(bucket, options).await?;
            pages += 1;
            tracing::debug!(bucket, prefix, page = pages, items = page.items.len(), "listed page");
            records.extend(page.items);

            if !page.truncated {
                break;
            }
            match page.continuation_token {
                Some(token) => continuation_token = Some(token),
                None => {
                    tracing::warn!(bucket, prefix, "truncated page without continuation token");
                    break;
                }
            }
        }

        Ok(records)
    }

    async fn list_directory(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectRecord>> {
        let options = ListOptions {
            prefix: prefix.to_string(),
            delimiter: Some(DIRECTORY_DELIMITER.to_string()),
            continuation_token: None,
            max_keys: self.page_size,
        };
        let page = self.store.list_objects(bucket, options).await?;

        if page.common_prefixes.is_empty() {
            Ok(page.items)
        } else {
            Ok(page.common_prefixes.into_iter().map(ObjectRecord::dir).collect())
        }
    }
}
