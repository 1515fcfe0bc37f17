//! Metadata search
//!
//! Narrows a listing by key pattern, then keeps the keys whose user metadata
//! contains a given key. Metadata is fetched one object at a time and the
//! first fetch failure aborts the search; there is no per-key isolation here,
//! unlike batch transfers.

use crate::error::Result;
use crate::lister::{ListRequest, Lister};
use crate::traits::ObjectStore;

/// Keys under `request` whose metadata contains `metadata_key`.
pub async fn search_metadata(
    store: &dyn ObjectStore,
    bucket: &str,
    request: &ListRequest,
    metadata_key: &str,
) -> Result<Vec<String>> {
    let keys = Lister::new(store).list_keys(bucket, request).await?;
    let mut matching = Vec::new();

    for key in keys {
        let metadata = store.get_metadata(bucket, &key).await?;
        if metadata.contains_key(metadata_key) {
            matching.push(key);
        }
    }

    tracing::debug!(bucket, metadata_key, matches = matching.len(), "metadata search done");
    Ok(matching)
}
