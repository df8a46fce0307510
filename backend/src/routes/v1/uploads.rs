use std::sync::Arc;

use axum::{Extension, Json};
use report_storage::{ReportStorage, UploadSignature};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::types::{AppError, ValidatedJson};

#[derive(Debug, Deserialize, Serialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct UploadSignatureRequest {
    /// Name of the file the browser is about to upload
    #[validate(length(min = 1, max = 255))]
    #[schemars(length(min = 1, max = 255))]
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UploadSignatureResponse {
    /// Access key id, sent as the `OSSAccessKeyId` form field
    pub access_key_id: String,
    /// Base64-encoded POST policy
    pub policy: String,
    /// Base64-encoded HMAC-SHA1 signature of `policy`
    pub signature: String,
    /// Object key the upload must use
    pub key: String,
    /// URL the multipart form is posted to
    pub host: String,
    /// Policy expiration as Unix seconds
    pub expire: i64,
}

impl From<UploadSignature> for UploadSignatureResponse {
    fn from(signature: UploadSignature) -> Self {
        Self {
            access_key_id: signature.access_key_id,
            policy: signature.policy,
            signature: signature.signature,
            key: signature.key,
            host: signature.host,
            expire: signature.expire,
        }
    }
}

/// Signs a one-hour POST policy so the browser can upload a report JSON
/// straight to the bucket
///
/// # Errors
///
/// - `StorageError::InvalidInput` - filename contains a path separator
/// - `StorageError::Serialization` - policy could not be encoded
#[instrument(skip(report_storage, payload))]
pub async fn create_upload_signature(
    Extension(report_storage): Extension<Arc<ReportStorage>>,
    ValidatedJson(payload): ValidatedJson<UploadSignatureRequest>,
) -> Result<Json<UploadSignatureResponse>, AppError> {
    let signature = report_storage.generate_upload_signature(&payload.filename)?;

    tracing::info!("upload key: {}", signature.key);

    Ok(Json(signature.into()))
}
