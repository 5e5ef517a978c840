use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::StorageError;

const MAX_KEY_LEN: usize = 512;
const MAX_FILE_NAME_LEN: usize = 100;

/// A validated, slash-separated object key such as
/// `submissions/12/0192f1c2-...-reel.mp4`.
///
/// Every segment is non-empty, uses only `[A-Za-z0-9._-]` and is neither
/// `.` nor `..`, so keys map safely onto filesystem paths.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn new(key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(StorageError::InvalidKey(format!(
                "key must be 1-{MAX_KEY_LEN} bytes"
            )));
        }
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(StorageError::InvalidKey(format!(
                    "bad segment in '{key}'"
                )));
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            {
                return Err(StorageError::InvalidKey(format!(
                    "disallowed character in '{key}'"
                )));
            }
        }
        Ok(Self(key))
    }

    /// Build a fresh, collision-free key for an uploaded file under `prefix`.
    pub fn for_upload(prefix: &[&str], file_name: &str) -> Result<Self, StorageError> {
        let mut key = prefix.join("/");
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(&uuid::Uuid::now_v7().to_string());
        key.push('-');
        key.push_str(&sanitize_file_name(file_name));
        Self::new(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

/// Reduce an arbitrary client file name to key-safe characters.
///
/// Path components are dropped, other characters become `_`, and the result
/// is capped at 100 characters. Falls back to `upload`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_LEN)
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({})", self.0)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ObjectKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
