use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use serde::Deserialize;

use super::error::StorageError;
use super::key::ObjectKey;
use super::traits::{MediaStore, StoredObject};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...).
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    #[serde(default)]
    pub path_style: bool,
}

/// Media store backed by an S3-compatible object store.
pub struct S3MediaStore {
    bucket: Box<Bucket>,
    max_size: u64,
}

fn backend(err: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(err.to_string())
}

impl S3MediaStore {
    pub fn new(settings: &S3Settings, max_size: u64) -> Result<Self, StorageError> {
        let region = match &settings.endpoint {
            Some(endpoint) => Region::Custom {
                region: settings.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => settings.region.parse().map_err(backend)?,
        };
        let credentials = Credentials::new(
            Some(&settings.access_key),
            Some(&settings.secret_key),
            None,
            None,
            None,
        )
        .map_err(backend)?;

        let mut bucket = Bucket::new(&settings.bucket, region, credentials).map_err(backend)?;
        if settings.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket, max_size })
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn put(
        &self,
        key: &ObjectKey,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<StoredObject, StorageError> {
        self.check_size(data.len())?;

        let response = self
            .bucket
            .put_object_with_content_type(
                key.as_str(),
                data,
                content_type.unwrap_or("application/octet-stream"),
            )
            .await
            .map_err(backend)?;
        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::Backend(format!(
                "put {key} returned HTTP {status}"
            )));
        }

        Ok(StoredObject::describe(key.clone(), data))
    }

    async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>, StorageError> {
        let response = self.bucket.get_object(key.as_str()).await.map_err(backend)?;
        match response.status_code() {
            200..=299 => Ok(response.bytes().to_vec()),
            404 => Err(StorageError::NotFound(key.to_string())),
            status => Err(StorageError::Backend(format!(
                "get {key} returned HTTP {status}"
            ))),
        }
    }

    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        let (_, status) = self
            .bucket
            .head_object(key.as_str())
            .await
            .map_err(backend)?;
        match status {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(StorageError::Backend(format!(
                "head {key} returned HTTP {status}"
            ))),
        }
    }

    async fn delete(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        // S3 deletes are idempotent and do not report whether anything existed.
        if !self.exists(key).await? {
            return Ok(false);
        }
        let response = self
            .bucket
            .delete_object(key.as_str())
            .await
            .map_err(backend)?;
        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::Backend(format!(
                "delete {key} returned HTTP {status}"
            )));
        }
        Ok(true)
    }

    fn max_size(&self) -> u64 {
        self.max_size
    }
}
