//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from isd-core.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_smithy_types::DateTime;
use tokio::io::AsyncWriteExt;

use isd_core::{
    Error, ListOptions, ListingPage, Metadata, ObjectRecord, ObjectStore, Result, StoreConfig,
};

/// S3 client wrapper, constructed once and shared by reference
#[derive(Debug, Clone)]
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from store settings
    pub async fn new(store: &StoreConfig) -> Result<Self> {
        store.validate()?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let (Some(access_key), Some(secret_key)) = (&store.access_key, &store.secret_key) {
            let credentials = aws_credential_types::Credentials::new(
                access_key,
                secret_key,
                None, // session token
                None, // expiry
                "isd-static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }
        if let Some(region) = &store.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &store.endpoint_url {
            tracing::debug!(endpoint_url = %endpoint, "using custom endpoint");
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(store.force_path_style)
            .build();

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }
}

fn store_error(context: &str, err: impl std::fmt::Display) -> Error {
    Error::StoreUnavailable(format!("{context}: {err}"))
}

fn to_timestamp(dt: &DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::from_second(dt.secs()).ok()
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<ObjectRecord>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| store_error("list buckets", e))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| {
                let mut record = ObjectRecord::bucket(b.name().unwrap_or_default());
                record.last_modified = b.creation_date().and_then(to_timestamp);
                record
            })
            .collect();

        Ok(buckets)
    }

    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListingPage> {
        let mut request = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .prefix(&options.prefix);

        if let Some(delimiter) = &options.delimiter {
            request = request.delimiter(delimiter);
        }
        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }
        if let Some(token) = &options.continuation_token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| store_error(&format!("list {bucket}/{}", options.prefix), e))?;

        let common_prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let size = object.size().unwrap_or(0).max(0) as u64;
                let mut record = ObjectRecord::file(object.key().unwrap_or_default(), size);
                record.last_modified = object.last_modified().and_then(to_timestamp);
                record.etag = object.e_tag().map(|e| e.trim_matches('"').to_string());
                record.storage_class = object.storage_class().map(|sc| sc.as_str().to_string());
                record
            })
            .collect();

        Ok(ListingPage {
            items,
            common_prefixes,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(str::to_string),
        })
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        metadata: &Metadata,
    ) -> Result<()> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| Error::General(format!("read {}: {e}", local_path.display())))?;

        let mut request = self.inner.put_object().bucket(bucket).key(key).body(body);

        if let Some(mime) = mime_guess::from_path(local_path).first() {
            request = request.content_type(mime.essence_str());
        }
        for (name, value) in metadata {
            request = request.metadata(name, value);
        }

        request
            .send()
            .await
            .map_err(|e| store_error(&format!("upload {bucket}/{key}"), e))?;

        tracing::debug!(bucket, key, path = %local_path.display(), "uploaded object");
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| store_error(&format!("delete {bucket}/{key}"), e))?;

        Ok(())
    }

    async fn get_metadata(&self, bucket: &str, key: &str) -> Result<Metadata> {
        let response = self
            .inner
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| store_error(&format!("head {bucket}/{key}"), e))?;

        Ok(response
            .metadata()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| store_error(&format!("get {bucket}/{key}"), e))?;

        let mut body = response.body.into_async_read();
        let mut file = tokio::fs::File::create(local_path).await?;
        let written = tokio::io::copy(&mut body, &mut file).await?;
        file.flush().await?;

        tracing::debug!(bucket, key, bytes = written, "downloaded object");
        Ok(())
    }
}
