//! Browser POST upload policies
//!
//! A policy document restricts a direct-to-bucket upload to one key and a
//! maximum size for one hour. The document is serialized to JSON, base64
//! encoded, and signed with HMAC-SHA1 keyed by the access key secret. The
//! bucket's POST endpoint recomputes the signature over the submitted policy.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{ser::SerializeTuple, Deserialize, Serialize, Serializer};
use sha1::Sha1;

use crate::{StorageConfig, StorageError, StorageResult};

type HmacSha1 = Hmac<Sha1>;

/// Lifetime of a signed upload policy
pub const UPLOAD_POLICY_TTL_SECS: i64 = 60 * 60;
/// Largest object a signed policy admits (100 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000Z";

/// Everything a client needs to POST a file straight to the bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSignature {
    /// Access key id sent as `OSSAccessKeyId`
    pub access_key_id: String,
    /// Base64-encoded policy document
    pub policy: String,
    /// Base64-encoded HMAC-SHA1 of `policy`
    pub signature: String,
    /// Object key the upload must use
    pub key: String,
    /// Upload endpoint, `https://<bucket>.<endpoint>`
    pub host: String,
    /// Policy expiration as Unix seconds
    pub expire: i64,
}

impl UploadSignature {
    /// Signs a policy for `key` that expires one hour after `now`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the policy cannot be encoded
    /// Returns `StorageError::Config` if the secret is rejected as an HMAC key
    pub fn create(config: &StorageConfig, key: String, now: DateTime<Utc>) -> StorageResult<Self> {
        let expires_at = now + Duration::seconds(UPLOAD_POLICY_TTL_SECS);
        let policy = PolicyDocument::for_key(&key, expires_at).encode()?;
        let signature = sign(config.access_key_secret(), &policy)?;

        Ok(Self {
            access_key_id: config.access_key_id().to_string(),
            policy,
            signature,
            key,
            host: config.upload_host(),
            expire: expires_at.timestamp(),
        })
    }
}

/// Upload policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDocument {
    expiration: String,
    conditions: Vec<PolicyCondition>,
}

impl PolicyDocument {
    /// Policy that admits one upload to exactly `key`, up to [`MAX_UPLOAD_BYTES`]
    #[must_use]
    pub fn for_key(key: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            expiration: expires_at.format(EXPIRATION_FORMAT).to_string(),
            conditions: vec![
                PolicyCondition::ContentLengthRange {
                    min: 0,
                    max: MAX_UPLOAD_BYTES,
                },
                PolicyCondition::KeyEquals(key.to_string()),
            ],
        }
    }

    /// Expiration as written into the document
    #[must_use]
    pub fn expiration(&self) -> &str {
        &self.expiration
    }

    /// Serializes the document and base64-encodes the UTF-8 JSON
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if JSON serialization fails
    pub fn encode(&self) -> StorageResult<String> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json))
    }
}

/// A single policy condition, serialized in array form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyCondition {
    /// `["content-length-range", min, max]`
    ContentLengthRange {
        /// Smallest accepted size in bytes
        min: u64,
        /// Largest accepted size in bytes
        max: u64,
    },
    /// `["eq", "$key", key]`
    KeyEquals(String),
}

impl Serialize for PolicyCondition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut tuple = serializer.serialize_tuple(3)?;
        match self {
            Self::ContentLengthRange { min, max } => {
                tuple.serialize_element("content-length-range")?;
                tuple.serialize_element(min)?;
                tuple.serialize_element(max)?;
            }
            Self::KeyEquals(key) => {
                tuple.serialize_element("eq")?;
                tuple.serialize_element("$key")?;
                tuple.serialize_element(key)?;
            }
        }
        tuple.end()
    }
}

/// Computes the base64 HMAC-SHA1 of `encoded_policy` keyed by `secret`
///
/// # Errors
///
/// Returns `StorageError::Config` if the key is rejected by the MAC
pub fn sign(secret: &str, encoded_policy: &str) -> StorageResult<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| StorageError::Config(format!("Invalid access key secret: {e}")))?;
    mac.update(encoded_policy.as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
