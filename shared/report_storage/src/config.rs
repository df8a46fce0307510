//! Storage configuration loaded from the environment

use std::env;
use std::fmt;

use crate::{StorageError, StorageResult};

/// Default key prefix for uploaded report JSON
pub const DEFAULT_JSON_PREFIX: &str = "qq-reports/json/";
/// Default key prefix for rendered HTML results
pub const DEFAULT_RESULT_PREFIX: &str = "qq-reports/results/";
/// Signing region used when none is configured and none can be derived from the endpoint
pub const DEFAULT_REGION: &str = "us-east-1";

const ACCESS_KEY_ID_VAR: &str = "OSS_ACCESS_KEY_ID";
const ACCESS_KEY_SECRET_VAR: &str = "OSS_ACCESS_KEY_SECRET";
const ENDPOINT_VAR: &str = "OSS_ENDPOINT";
const BUCKET_NAME_VAR: &str = "OSS_BUCKET_NAME";
const JSON_PREFIX_VAR: &str = "OSS_JSON_PREFIX";
const RESULT_PREFIX_VAR: &str = "OSS_RESULT_PREFIX";
const REGION_VAR: &str = "OSS_REGION";
const FORCE_PATH_STYLE_VAR: &str = "OSS_FORCE_PATH_STYLE";

/// Immutable configuration for the report storage gateway
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    access_key_id: String,
    access_key_secret: String,
    endpoint: String,
    bucket_name: String,
    region: String,
    json_prefix: String,
    result_prefix: String,
    force_path_style: bool,
}

impl StorageConfig {
    /// Creates a configuration from the four required values, using default prefixes
    ///
    /// The region is derived from `oss-<region>.` endpoints and falls back to
    /// [`DEFAULT_REGION`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` naming every required value that is empty
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        endpoint: impl Into<String>,
        bucket_name: impl Into<String>,
    ) -> StorageResult<Self> {
        let access_key_id = access_key_id.into();
        let access_key_secret = access_key_secret.into();
        let endpoint: String = endpoint.into();
        let endpoint = endpoint.trim().trim_end_matches('/').to_string();
        let bucket_name = bucket_name.into();

        let missing: Vec<&str> = [
            (ACCESS_KEY_ID_VAR, access_key_id.trim().is_empty()),
            (ACCESS_KEY_SECRET_VAR, access_key_secret.trim().is_empty()),
            (ENDPOINT_VAR, endpoint.is_empty()),
            (BUCKET_NAME_VAR, bucket_name.trim().is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, is_missing)| is_missing.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(StorageError::Config(format!(
                "OSS configuration is incomplete, missing: {}",
                missing.join(", ")
            )));
        }

        let region = region_from_endpoint(&endpoint).unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(Self {
            access_key_id,
            access_key_secret,
            endpoint,
            bucket_name,
            region,
            json_prefix: DEFAULT_JSON_PREFIX.to_string(),
            result_prefix: DEFAULT_RESULT_PREFIX.to_string(),
            force_path_style: false,
        })
    }

    /// Loads the configuration from process environment variables
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if a required variable is missing or
    /// `OSS_FORCE_PATH_STYLE` is not a boolean
    pub fn from_env() -> StorageResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Same as [`StorageConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> StorageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).unwrap_or_default();

        let mut config = Self::new(
            get(ACCESS_KEY_ID_VAR),
            get(ACCESS_KEY_SECRET_VAR),
            get(ENDPOINT_VAR),
            get(BUCKET_NAME_VAR),
        )?;

        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(json_prefix) = non_empty(JSON_PREFIX_VAR) {
            config.json_prefix = json_prefix;
        }
        if let Some(result_prefix) = non_empty(RESULT_PREFIX_VAR) {
            config.result_prefix = result_prefix;
        }
        if let Some(region) = non_empty(REGION_VAR) {
            config.region = region.trim().to_string();
        }
        if let Some(flag) = non_empty(FORCE_PATH_STYLE_VAR) {
            config.force_path_style = flag.trim().to_lowercase().parse().map_err(|_| {
                StorageError::Config(format!(
                    "{FORCE_PATH_STYLE_VAR} must be `true` or `false`, got `{flag}`"
                ))
            })?;
        }

        Ok(config)
    }

    /// Overrides the JSON and result key prefixes
    #[must_use]
    pub fn with_prefixes(
        mut self,
        json_prefix: impl Into<String>,
        result_prefix: impl Into<String>,
    ) -> Self {
        self.json_prefix = json_prefix.into();
        self.result_prefix = result_prefix.into();
        self
    }

    /// Overrides the signing region
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Addresses the bucket as a path segment instead of a subdomain
    #[must_use]
    pub const fn with_force_path_style(mut self, force_path_style: bool) -> Self {
        self.force_path_style = force_path_style;
        self
    }

    /// Access key id
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub(crate) fn access_key_secret(&self) -> &str {
        &self.access_key_secret
    }

    /// Endpoint as configured, e.g. `oss-cn-hangzhou.aliyuncs.com`
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Bucket name
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Signing region
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Key prefix for uploaded JSON
    #[must_use]
    pub fn json_prefix(&self) -> &str {
        &self.json_prefix
    }

    /// Key prefix for HTML results
    #[must_use]
    pub fn result_prefix(&self) -> &str {
        &self.result_prefix
    }

    /// Whether path-style addressing is used
    #[must_use]
    pub const fn force_path_style(&self) -> bool {
        self.force_path_style
    }

    /// Endpoint URL handed to the SDK, `https://` is assumed when no scheme is given
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("https://{}", self.endpoint)
        }
    }

    /// Endpoint host without scheme
    #[must_use]
    pub fn endpoint_host(&self) -> &str {
        self.endpoint
            .split_once("://")
            .map_or(self.endpoint.as_str(), |(_, host)| host)
    }

    /// Host that browser POST uploads are sent to
    #[must_use]
    pub fn upload_host(&self) -> String {
        format!("https://{}.{}", self.bucket_name, self.endpoint_host())
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .field("json_prefix", &self.json_prefix)
            .field("result_prefix", &self.result_prefix)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// Extracts `cn-hangzhou` from `oss-cn-hangzhou.aliyuncs.com` or `oss-cn-hangzhou-internal.aliyuncs.com`
fn region_from_endpoint(endpoint: &str) -> Option<String> {
    let host = endpoint
        .split_once("://")
        .map_or(endpoint, |(_, host)| host);
    let first_label = host.split('.').next()?;
    let region = first_label.strip_prefix("oss-")?;
    let region = region.strip_suffix("-internal").unwrap_or(region);

    (!region.is_empty()).then(|| region.to_string())
}
