//! Error types for report storage operations

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error used to carry backend causes across the store seam
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for report storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during report storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Missing or invalid configuration, raised before any network call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied a value that cannot be turned into a valid request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested object does not exist in the bucket
    #[error("Object not found: {key}")]
    NotFound {
        /// Key that was looked up
        key: String,
    },

    /// Any failure reported by the object storage backend
    #[error("{context}: {source}")]
    Transport {
        /// Human-readable description of the failed operation
        context: &'static str,
        /// Underlying backend error
        #[source]
        source: BoxError,
    },

    /// Upload policy could not be serialized
    #[error("Failed to serialize upload policy: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing a local file failed
    #[error("{context} ({}): {source}", .path.display())]
    Io {
        /// Human-readable description of the failed operation
        context: &'static str,
        /// Local path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Wraps an object store error with the context of the calling operation
    pub(crate) fn from_store(context: &'static str, key: &str, error: ObjectStoreError) -> Self {
        match error {
            ObjectStoreError::NotFound => Self::NotFound {
                key: key.to_string(),
            },
            ObjectStoreError::Upstream(source) => Self::Transport { context, source },
        }
    }

    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }
}

/// Errors returned by an [`ObjectStore`](crate::ObjectStore) backend
#[derive(Error, Debug)]
pub enum ObjectStoreError {
    /// The object does not exist
    #[error("Object not found")]
    NotFound,

    /// Network, authentication, permission or service failure
    #[error("Object store error: {0}")]
    Upstream(#[source] BoxError),
}

impl ObjectStoreError {
    /// Wraps any backend error as an upstream failure
    pub fn upstream<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Upstream(error.into())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_transport_error_preserves_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        let err = StorageError::from_store(
            "Failed to upload JSON to object storage",
            "qq-reports/json/a.json",
            ObjectStoreError::upstream(cause),
        );

        assert_eq!(
            err.to_string(),
            "Failed to upload JSON to object storage: connection reset"
        );
        let source = err.source().expect("source should be preserved");
        assert_eq!(source.to_string(), "connection reset");
    }

    #[test]
    fn test_not_found_carries_key() {
        let err = StorageError::from_store(
            "Failed to download JSON from object storage",
            "missing.json",
            ObjectStoreError::NotFound,
        );

        assert!(matches!(err, StorageError::NotFound { ref key } if key == "missing.json"));
    }
}
