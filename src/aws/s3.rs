//! S3 object uploads for the export bucket

use crate::aws::context::AwsContext;
use anyhow::{Context, Result};
use aws_sdk_s3::{primitives::ByteStream, Client};
use tracing::debug;

/// S3 client for writing export objects
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Create an S3 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
        }
    }

    /// Write bytes to an object, overwriting any previous version.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        debug!(bucket = %bucket, key = %key, size = data.len(), "Uploading object");

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .context("Failed to upload object")?;

        Ok(())
    }
}
