use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::error::StorageError;
use super::key::ObjectKey;

/// What the store recorded for a successful `put`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub key: ObjectKey,
    pub size: u64,
    /// Lowercase hex SHA-256 of the content.
    pub sha256: String,
}

impl StoredObject {
    pub fn describe(key: ObjectKey, data: &[u8]) -> Self {
        Self {
            key,
            size: data.len() as u64,
            sha256: hex::encode(Sha256::digest(data)),
        }
    }
}

/// Key-addressed storage for uploaded media (contest submissions and the like).
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `data` under `key`, replacing any previous object.
    async fn put(
        &self,
        key: &ObjectKey,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<StoredObject, StorageError>;

    /// Retrieve all bytes stored under `key`.
    async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>, StorageError>;

    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError>;

    /// Delete the object under `key`.
    ///
    /// Returns `true` if an object was deleted, `false` if none existed.
    async fn delete(&self, key: &ObjectKey) -> Result<bool, StorageError>;

    /// Largest object this store accepts, in bytes.
    fn max_size(&self) -> u64;

    fn check_size(&self, len: usize) -> Result<(), StorageError> {
        let limit = self.max_size();
        if len as u64 > limit {
            return Err(StorageError::SizeLimitExceeded {
                actual: len as u64,
                limit,
            });
        }
        Ok(())
    }
}
