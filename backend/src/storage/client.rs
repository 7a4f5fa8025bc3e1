use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_smithy_types::byte_stream::ByteStream;
use log::debug;

use super::{BlobUploader, StorageError};
use crate::config::StorageSettings;

/// S3 client bound to the configured bucket.
pub struct BlobStorage {
    client: Client,
    bucket: String,
}

impl BlobStorage {
    /// Builds the SDK client from the parsed connection string. Purely
    /// local; no network traffic happens until the first upload.
    pub async fn connect(settings: &StorageSettings, bucket: &str) -> Self {
        let credentials = aws_sdk_s3::config::Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "storage-connection",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl BlobUploader for BlobStorage {
    async fn upload(&self, key: &str, local_path: &Path) -> Result<bool, StorageError> {
        if !local_path.exists() {
            debug!("nothing to upload for '{}': local file missing", key);
            return Ok(false);
        }

        let body = tokio::fs::read(local_path)
            .await
            .map_err(|source| StorageError::LocalRead {
                path: local_path.to_path_buf(),
                source,
            })?;

        let content_type = mime_guess::from_path(local_path).first_or_octet_stream();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type.as_ref())
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StorageError::PutObject {
                key: key.to_string(),
                detail: err.into_service_error().to_string(),
            })?;

        debug!("uploaded '{}' to bucket '{}'", key, self.bucket);
        Ok(true)
    }
}
