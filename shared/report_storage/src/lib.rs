//! Object storage access for QQ chat reports
//!
//! This crate wraps an S3-compatible OSS bucket behind [`ReportStorage`]:
//! uploading report JSON and rendered HTML, downloading inputs, producing
//! signed read URLs, deleting objects and signing browser POST upload policies.

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

mod config;
mod error;
mod gateway;
pub mod keys;
pub mod policy;
pub mod store;

pub use config::{
    StorageConfig, DEFAULT_JSON_PREFIX, DEFAULT_REGION, DEFAULT_RESULT_PREFIX,
};
pub use error::{BoxError, ObjectStoreError, StorageError, StorageResult};
pub use gateway::{ReportStorage, DEFAULT_URL_EXPIRY};
pub use policy::UploadSignature;
pub use store::{s3::S3ObjectStore, ObjectStore};
