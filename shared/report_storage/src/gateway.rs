//! Report storage gateway

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::keys::{json_object_key, result_object_key};
use crate::{
    ObjectStore, S3ObjectStore, StorageConfig, StorageError, StorageResult, UploadSignature,
};

/// Validity of a signed read URL when the caller does not choose one
pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// Longest validity a signed read URL may have (7 days)
const MAX_URL_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const JSON_CONTENT_TYPE: &str = "application/json";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Gateway for all bucket interactions of the report pipeline
pub struct ReportStorage {
    config: StorageConfig,
    store: Arc<dyn ObjectStore>,
}

impl ReportStorage {
    /// Creates a gateway over an arbitrary object store
    #[must_use]
    pub fn new(config: StorageConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self { config, store }
    }

    /// Creates a gateway backed by an S3-compatible client built from `config`
    #[must_use]
    pub fn from_config(config: StorageConfig) -> Self {
        let store = Arc::new(S3ObjectStore::from_config(&config));
        Self::new(config, store)
    }

    /// Configuration the gateway was built with
    #[must_use]
    pub const fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Uploads a local JSON file under a timestamped key and returns the key
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` for an unusable filename
    /// Returns `StorageError::Io` if the local file cannot be read
    /// Returns `StorageError::Transport` if the upload fails
    pub async fn upload_json(
        &self,
        local_path: impl AsRef<Path>,
        original_filename: &str,
    ) -> StorageResult<String> {
        const CONTEXT: &str = "Failed to upload JSON to object storage";

        let key = json_object_key(self.config.json_prefix(), original_filename, Utc::now())?;
        self.upload_file(local_path.as_ref(), &key, JSON_CONTENT_TYPE, CONTEXT)
            .await?;

        info!("Uploaded JSON {} as {}", original_filename, key);
        Ok(key)
    }

    /// Downloads `key` into `local_path`, creating or truncating the file
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the object does not exist
    /// Returns `StorageError::Transport` if the download fails
    /// Returns `StorageError::Io` if the local file cannot be written
    pub async fn download_json(&self, key: &str, local_path: impl AsRef<Path>) -> StorageResult<()> {
        const CONTEXT: &str = "Failed to download JSON from object storage";

        let local_path = local_path.as_ref();
        let body = self
            .store
            .get_object(key)
            .await
            .map_err(|e| StorageError::from_store(CONTEXT, key, e))?;

        tokio::fs::write(local_path, &body)
            .await
            .map_err(|e| StorageError::io(CONTEXT, local_path, e))?;

        debug!(
            "Downloaded {} ({} bytes) to {}",
            key,
            body.len(),
            local_path.display()
        );
        Ok(())
    }

    /// Uploads a rendered report under `<result_prefix><report_id>.html`
    ///
    /// The key depends only on the report id, so uploading again replaces the
    /// previous result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` for an unusable report id
    /// Returns `StorageError::Io` if the local file cannot be read
    /// Returns `StorageError::Transport` if the upload fails
    pub async fn upload_result_html(
        &self,
        local_path: impl AsRef<Path>,
        report_id: &str,
    ) -> StorageResult<String> {
        const CONTEXT: &str = "Failed to upload result HTML to object storage";

        let key = result_object_key(self.config.result_prefix(), report_id)?;
        self.upload_file(local_path.as_ref(), &key, HTML_CONTENT_TYPE, CONTEXT)
            .await?;

        info!("Uploaded result for report {} as {}", report_id, key);
        Ok(key)
    }

    /// Returns a signed GET URL for `key`, valid for `expires_in` or one hour
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` if the expiry is zero or longer than 7 days
    /// Returns `StorageError::Transport` if signing fails
    pub async fn get_file_url(
        &self,
        key: &str,
        expires_in: Option<Duration>,
    ) -> StorageResult<String> {
        const CONTEXT: &str = "Failed to generate file URL";

        let expires_in = expires_in.unwrap_or(DEFAULT_URL_EXPIRY);
        if expires_in.is_zero() || expires_in > MAX_URL_EXPIRY {
            return Err(StorageError::InvalidInput(format!(
                "URL expiry must be between 1 and {} seconds, got {}",
                MAX_URL_EXPIRY.as_secs(),
                expires_in.as_secs()
            )));
        }

        self.store
            .presign_get(key, expires_in)
            .await
            .map_err(|e| StorageError::from_store(CONTEXT, key, e))
    }

    /// Deletes `key` from the bucket
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Transport` if the deletion fails
    pub async fn delete_file(&self, key: &str) -> StorageResult<()> {
        const CONTEXT: &str = "Failed to delete object storage file";

        self.store
            .delete_object(key)
            .await
            .map_err(|e| StorageError::from_store(CONTEXT, key, e))?;

        info!("Deleted object {}", key);
        Ok(())
    }

    /// Signs a browser POST upload of `filename`, valid for one hour from now
    ///
    /// # Errors
    ///
    /// Same as [`ReportStorage::generate_upload_signature_at`]
    pub fn generate_upload_signature(&self, filename: &str) -> StorageResult<UploadSignature> {
        self.generate_upload_signature_at(filename, Utc::now())
    }

    /// Signs a browser POST upload of `filename` as of `now`
    ///
    /// The key uses the same naming as [`ReportStorage::upload_json`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidInput` for an unusable filename
    /// Returns `StorageError::Serialization` if the policy cannot be encoded
    pub fn generate_upload_signature_at(
        &self,
        filename: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<UploadSignature> {
        let key = json_object_key(self.config.json_prefix(), filename, now)?;
        let signature = UploadSignature::create(&self.config, key, now)?;

        debug!(
            "Signed upload policy for {} expiring at {}",
            signature.key, signature.expire
        );
        Ok(signature)
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        key: &str,
        content_type: &str,
        context: &'static str,
    ) -> StorageResult<()> {
        let body = tokio::fs::read(local_path)
            .await
            .map_err(|e| StorageError::io(context, local_path, e))?;

        self.store
            .put_object(key, body, content_type)
            .await
            .map_err(|e| StorageError::from_store(context, key, e))
    }
}
