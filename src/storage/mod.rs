// ABOUTME: Object storage boundary for oversized templates.
// ABOUTME: Content-addressed uploads that skip work when nothing changed.

mod s3;

pub use s3::S3AssetStore;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Placement options for an uploaded asset.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub key_prefix: String,
    pub key_suffix: String,
    pub content_type: String,
}

/// Result of an upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Object key within the store.
    pub key: String,
    /// True when the object already existed and no upload was performed.
    pub existed: bool,
}

/// Errors from asset storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Storage for deployment assets such as oversized templates.
///
/// Keys are derived from content, so re-uploading unchanged content is a
/// no-op and identical content always lands at the same key.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `content` unless an object with the same content already exists.
    async fn upload_if_changed(
        &self,
        content: &[u8],
        options: &UploadOptions,
    ) -> Result<Upload, StorageError>;

    /// Retrievable URL for an object key in this store.
    fn object_url(&self, key: &str) -> String;
}

/// Derive the content-addressed key for an asset.
pub fn asset_key(content: &[u8], options: &UploadOptions) -> String {
    let hash = hex::encode(Sha256::digest(content));
    format!("{}{}{}", options.key_prefix, hash, options.key_suffix)
}

/// Metadata for provisioned toolkit storage.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolkitResources {
    /// Bucket holding deployment assets.
    pub bucket_name: String,
    /// Base URL under which bucket objects are retrievable.
    pub bucket_url: String,
}

impl ToolkitResources {
    pub fn new(bucket_name: impl Into<String>, bucket_url: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            bucket_url: bucket_url.into(),
        }
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.bucket_url.trim_end_matches('/'), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> UploadOptions {
        UploadOptions {
            key_prefix: "templates/demo/".to_string(),
            key_suffix: ".yml".to_string(),
            content_type: "application/x-yaml".to_string(),
        }
    }

    #[test]
    fn key_is_deterministic_for_identical_content() {
        let a = asset_key(b"Resources: {}", &options());
        let b = asset_key(b"Resources: {}", &options());
        assert_eq!(a, b);
    }

    #[test]
    fn key_changes_with_content() {
        let a = asset_key(b"Resources: {}", &options());
        let b = asset_key(b"Outputs: {}", &options());
        assert_ne!(a, b);
    }

    #[test]
    fn key_carries_prefix_and_suffix() {
        let key = asset_key(b"x", &options());
        assert!(key.starts_with("templates/demo/"));
        assert!(key.ends_with(".yml"));
    }

    #[test]
    fn toolkit_object_url_joins_cleanly() {
        let toolkit = ToolkitResources::new("bucket", "https://bucket.s3.test/");
        assert_eq!(toolkit.object_url("a/b.yml"), "https://bucket.s3.test/a/b.yml");
    }
}
