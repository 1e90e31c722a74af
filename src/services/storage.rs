use async_trait::async_trait;
use chrono::Utc;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use std::sync::Arc;

use crate::models::asset::{MediaAsset, StoredObjectRef};

/// Durable object storage as seen by the pipeline: one confirmed write.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError>;

    fn bucket_name(&self) -> &str;
}

/// S3 client for the media bucket.
pub struct S3MediaStore {
    bucket: Box<Bucket>,
    bucket_name: String,
}

impl S3MediaStore {
    /// Credentials come from the standard AWS environment variables, the
    /// same chain the recognition and transcription clients use.
    pub fn new(bucket_name: &str, region: &str) -> Result<Self, StorageError> {
        let region: Region = region
            .parse()
            .map_err(|_| StorageError::Config(format!("unknown region: {region}")))?;

        let credentials =
            Credentials::default().map_err(|e| StorageError::Config(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            bucket,
            bucket_name: bucket_name.to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3MediaStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError> {
        self.bucket
            .put_object_with_content_type(key, bytes, content_type)
            .await
            .map_err(StorageError::S3)?;
        Ok(())
    }

    fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}

/// Object Store Gateway: derives the storage key and performs the single
/// upload that every analysis job depends on. No retries here; a failed
/// write aborts the pipeline upstream.
pub struct MediaStoreGateway {
    store: Arc<dyn ObjectStore>,
}

impl MediaStoreGateway {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn store(&self, asset: &MediaAsset) -> Result<StoredObjectRef, StorageError> {
        let key = derive_key(Utc::now().timestamp_millis(), &asset.original_name);

        self.store
            .put(&key, &asset.bytes, &asset.mime_type)
            .await?;

        tracing::info!(key = %key, mime = %asset.mime_type, size = asset.bytes.len(), "media stored");

        Ok(StoredObjectRef {
            bucket: self.store.bucket_name().to_string(),
            key,
        })
    }
}

/// Keys are `<unix-millis>_<original-name>`: practically unique, and the
/// original name stays visible in the bucket listing.
fn derive_key(timestamp_millis: i64, original_name: &str) -> String {
    format!("{timestamp_millis}_{original_name}")
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("storage configuration error: {0}")]
    Config(String),
}
