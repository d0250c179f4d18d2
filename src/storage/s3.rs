// ABOUTME: S3-backed asset store for toolkit storage.
// ABOUTME: Head-then-put keeps identical content from being uploaded twice.

use super::{AssetStore, StorageError, ToolkitResources, Upload, UploadOptions, asset_key};
use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

fn map_storage_error<E>(err: SdkError<E, impl std::fmt::Debug>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match &err {
        SdkError::ServiceError(ctx) => {
            let e = ctx.err();
            StorageError::Api {
                code: e.code().unwrap_or("Unknown").to_string(),
                message: e.message().unwrap_or("no message").to_string(),
            }
        }
        _ => StorageError::Transport(err.to_string()),
    }
}

/// Asset store backed by the toolkit bucket.
pub struct S3AssetStore {
    client: aws_sdk_s3::Client,
    toolkit: ToolkitResources,
}

impl S3AssetStore {
    pub fn new(client: aws_sdk_s3::Client, toolkit: ToolkitResources) -> Self {
        Self { client, toolkit }
    }

    pub fn toolkit(&self) -> &ToolkitResources {
        &self.toolkit
    }

    async fn object_exists(&self, key: &str) -> Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.toolkit.bucket_name)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let not_found = matches!(
                    &err,
                    SdkError::ServiceError(ctx) if ctx.err().is_not_found()
                );
                if not_found {
                    Ok(false)
                } else {
                    Err(map_storage_error(err))
                }
            }
        }
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn upload_if_changed(
        &self,
        content: &[u8],
        options: &UploadOptions,
    ) -> Result<Upload, StorageError> {
        let key = asset_key(content, options);

        if self.object_exists(&key).await? {
            tracing::debug!(key, "asset unchanged, skipping upload");
            return Ok(Upload { key, existed: true });
        }

        tracing::debug!(key, bytes = content.len(), "uploading asset");
        self.client
            .put_object()
            .bucket(&self.toolkit.bucket_name)
            .key(&key)
            .content_type(&options.content_type)
            .body(ByteStream::from(Bytes::copy_from_slice(content)))
            .send()
            .await
            .map_err(map_storage_error)?;

        Ok(Upload {
            key,
            existed: false,
        })
    }

    fn object_url(&self, key: &str) -> String {
        self.toolkit.object_url(key)
    }
}
