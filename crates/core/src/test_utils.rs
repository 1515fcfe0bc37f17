//! Shared test utilities for the isd-core crate.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::traits::{ListOptions, ListingPage, Metadata, ObjectRecord, ObjectStore};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    metadata: Metadata,
}

/// In-memory store keyed by (bucket, key), paging in key order.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    page_size: usize,
    calls: AtomicUsize,
    fail_keys: Vec<String>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            page_size: 1000,
            ..Default::default()
        }
    }

    /// Page size for listings
    pub(crate) fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Make every call touching `key` fail with `StoreUnavailable`
    pub(crate) fn failing_on(mut self, key: &str) -> Self {
        self.fail_keys.push(key.to_string());
        self
    }

    pub(crate) fn insert(&self, bucket: &str, key: &str, data: &[u8], metadata: Metadata) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data: data.to_vec(),
                metadata,
            },
        );
    }

    pub(crate) fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    /// Number of store calls made so far
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, key: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_keys.iter().any(|k| k == key) {
            return Err(Error::StoreUnavailable(format!("simulated failure for {key}")));
        }
        Ok(())
    }

    fn missing(bucket: &str, key: &str) -> Error {
        Error::StoreUnavailable(format!("NoSuchKey: {bucket}/{key}"))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> Result<Vec<ObjectRecord>> {
        self.check("")?;
        let mut names: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .map(|(b, _)| b.clone())
            .collect();
        names.dedup();
        Ok(names.into_iter().map(ObjectRecord::bucket).collect())
    }

    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListingPage> {
        self.check("")?;
        let objects = self.objects.lock().unwrap();
        let start: usize = options
            .continuation_token
            .as_deref()
            .map(|t| t.parse().unwrap())
            .unwrap_or(0);
        let matching: Vec<ObjectRecord> = objects
            .iter()
            .filter(|((b, k), _)| b == bucket && k.starts_with(&options.prefix))
            .map(|((_, k), o)| ObjectRecord::file(k.clone(), o.data.len() as u64))
            .collect();

        let end = (start + self.page_size).min(matching.len());
        let truncated = end < matching.len();
        Ok(ListingPage {
            items: matching[start..end].to_vec(),
            common_prefixes: Vec::new(),
            truncated,
            continuation_token: truncated.then(|| end.to_string()),
        })
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        metadata: &Metadata,
    ) -> Result<()> {
        self.check(key)?;
        let data = std::fs::read(local_path)?;
        self.insert(bucket, key, &data, metadata.clone());
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        self.check(key)?;
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn get_metadata(&self, bucket: &str, key: &str) -> Result<Metadata> {
        self.check(key)?;
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.metadata.clone())
            .ok_or_else(|| Self::missing(bucket, key))
    }

    async fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()> {
        self.check(key)?;
        let data = self
            .objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.data.clone())
            .ok_or_else(|| Self::missing(bucket, key))?;
        std::fs::write(local_path, data)?;
        Ok(())
    }
}

/// Build a metadata map from pairs
pub(crate) fn meta(pairs: &[(&str, &str)]) -> Metadata {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
