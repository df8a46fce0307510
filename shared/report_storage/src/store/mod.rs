//! Object store backends

pub mod s3;

use std::time::Duration;

use crate::ObjectStoreError;

/// Minimal object store surface the gateway relies on
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `key`, replacing any existing object
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError>;

    /// Fetches the full contents of `key`
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Removes `key`
    async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError>;

    /// Produces a signed GET URL for `key` valid for `expires_in`
    async fn presign_get(&self, key: &str, expires_in: Duration)
        -> Result<String, ObjectStoreError>;
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    use super::{ObjectStore, ObjectStoreError};

    /// A stored object
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StoredObject {
        /// Object contents
        pub body: Vec<u8>,
        /// Content type given on upload
        pub content_type: String,
    }

    /// In-memory object store for tests
    #[derive(Debug, Default)]
    pub struct InMemoryObjectStore {
        objects: Mutex<HashMap<String, StoredObject>>,
        failing: bool,
    }

    impl InMemoryObjectStore {
        /// Creates an empty store
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a store that fails every call with an upstream error
        #[must_use]
        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Self::default()
            }
        }

        /// Returns the object stored under `key`
        #[must_use]
        pub fn object(&self, key: &str) -> Option<StoredObject> {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
                .cloned()
        }

        /// Inserts an object directly
        pub fn insert(&self, key: &str, body: impl Into<Vec<u8>>, content_type: &str) {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(
                    key.to_string(),
                    StoredObject {
                        body: body.into(),
                        content_type: content_type.to_string(),
                    },
                );
        }

        /// Number of stored objects
        #[must_use]
        pub fn len(&self) -> usize {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }

        /// Whether the store is empty
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn check_available(&self) -> Result<(), ObjectStoreError> {
            if self.failing {
                return Err(ObjectStoreError::upstream("simulated backend outage"));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl ObjectStore for InMemoryObjectStore {
        async fn put_object(
            &self,
            key: &str,
            body: Vec<u8>,
            content_type: &str,
        ) -> Result<(), ObjectStoreError> {
            self.check_available()?;
            self.insert(key, body, content_type);
            Ok(())
        }

        async fn get_object(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
            self.check_available()?;
            self.object(key)
                .map(|object| object.body)
                .ok_or(ObjectStoreError::NotFound)
        }

        async fn delete_object(&self, key: &str) -> Result<(), ObjectStoreError> {
            self.check_available()?;
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(key);
            Ok(())
        }

        async fn presign_get(
            &self,
            key: &str,
            expires_in: Duration,
        ) -> Result<String, ObjectStoreError> {
            self.check_available()?;
            Ok(format!(
                "memory://objects/{key}?expires={}",
                expires_in.as_secs()
            ))
        }
    }
}
