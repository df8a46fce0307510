use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Query, http::StatusCode, Extension, Json};
use report_storage::{ReportStorage, DEFAULT_URL_EXPIRY};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::types::AppError;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileUrlQuery {
    /// Object key
    #[schemars(length(min = 1))]
    pub key: String,
    /// URL validity in seconds, defaults to one hour
    #[schemars(range(min = 1, max = 604_800))]
    pub expires_in_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FileUrlResponse {
    /// Signed GET URL
    pub url: String,
    /// Validity of `url` in seconds
    pub expires_in_secs: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileKeyQuery {
    /// Object key
    #[schemars(length(min = 1))]
    pub key: String,
}

/// Returns a time-limited signed URL for reading an object
///
/// # Errors
///
/// - `StorageError::InvalidInput` - expiry outside 1 second to 7 days
/// - `StorageError::Transport` - the URL could not be signed
#[instrument(skip(report_storage))]
pub async fn get_file_url(
    Extension(report_storage): Extension<Arc<ReportStorage>>,
    Query(query): Query<FileUrlQuery>,
) -> Result<Json<FileUrlResponse>, AppError> {
    if query.key.is_empty() {
        return Err(AppError::validation("invalid_key", "Object key must not be empty"));
    }

    let expires_in = query
        .expires_in_secs
        .map_or(DEFAULT_URL_EXPIRY, Duration::from_secs);

    let url = report_storage
        .get_file_url(&query.key, Some(expires_in))
        .await?;

    Ok(Json(FileUrlResponse {
        url,
        expires_in_secs: expires_in.as_secs(),
    }))
}

/// Deletes an object from the bucket
///
/// # Errors
///
/// - `StorageError::Transport` - the backend rejected or failed the deletion
#[instrument(skip(report_storage))]
pub async fn delete_file(
    Extension(report_storage): Extension<Arc<ReportStorage>>,
    Query(query): Query<FileKeyQuery>,
) -> Result<StatusCode, AppError> {
    if query.key.is_empty() {
        return Err(AppError::validation("invalid_key", "Object key must not be empty"));
    }

    report_storage.delete_file(&query.key).await?;

    Ok(StatusCode::NO_CONTENT)
}
