//! S3-compatible object store client

use std::sync::Arc;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use aws_sdk_s3::{
    config::{Credentials, Region},
    operation::get_object::GetObjectError,
    presigning::PresigningConfig,
    primitives::ByteStream,
    Client,
};
use tracing::{debug, error, info};

use super::ObjectStore;
use crate::{ObjectStoreError, StorageConfig};

const MAX_ATTEMPTS: u32 = 3;
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);
const CREDENTIALS_PROVIDER: &str = "report-storage";

/// Object store backed by an S3-compatible bucket
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Arc<Client>,
    bucket_name: String,
}

impl S3ObjectStore {
    /// Wraps a pre-configured S3 client
    #[must_use]
    pub const fn new(client: Arc<Client>, bucket_name: String) -> Self {
        Self {
            client,
            bucket_name,
        }
    }

    /// Builds a client from the storage configuration
    ///
    /// Credentials are taken from the configuration only, never from the
    /// ambient AWS credential chain.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id(),
            config.access_key_secret(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let retry_config = RetryConfig::standard()
            .with_max_attempts(MAX_ATTEMPTS)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(OPERATION_TIMEOUT)
            .build();

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region().to_string()))
            .endpoint_url(config.endpoint_url())
            .credentials_provider(credentials)
            .force_path_style(config.force_path_style())
            .retry_config(retry_config)
            .timeout_config(timeout_config)
            .build();

        info!(
            "Initialized object store client for bucket: {} at {} (region {})",
            config.bucket_name(),
            config.endpoint_url(),
            config.region()
        );

        Self::new(
            Arc::new(Client::from_conf(s3_config)),
            config.bucket_name().to_string(),
        )
    }

    /// Bucket this store writes to
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Underlying SDK client
    #[must_use]
    pub const fn client(&self) -> &Arc<Client> {
        &self.client
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        debug!("Putting object: {} ({} bytes)", key, body.len());

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to put object {}: {}", key, e);
                ObjectStoreError::upstream(e)
            })?;

        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        debug!("Getting object: {}", key);

        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e)
                if e.as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key) =>
            {
                debug!("Object does not exist: {}", key);
                return Err(ObjectStoreError::NotFound);
            }
            Err(e) => {
                error!("Failed to get object {}: {}", key, e);
                return Err(ObjectStoreError::upstream(e));
            }
        };

        let bytes = output.body.collect().await.map_err(|e| {
            error!("Failed to read body of object {}: {}", key, e);
            ObjectStoreError::upstream(e)
        })?;

        Ok(bytes.into_bytes().to_vec())
    }

    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
        debug!("Deleting object: {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to delete object {}: {}", key, e);
                ObjectStoreError::upstream(e)
            })?;

        Ok(())
    }

    async fn presign_get(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ObjectStoreError> {
        let presigning_config =
            PresigningConfig::expires_in(expires_in).map_err(ObjectStoreError::upstream)?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| {
                error!("Failed to presign GET for {}: {}", key, e);
                ObjectStoreError::upstream(e)
            })?;

        debug!(
            "Generated presigned GET URL for object: {} valid for {}s",
            key,
            expires_in.as_secs()
        );

        Ok(presigned.uri().to_string())
    }
}
