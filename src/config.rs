//! Configuration for wikirace
//!
//! Centralized store configuration with sensible defaults.

use std::env;
use std::path::PathBuf;

use crate::error::{Result, WikiError};
use crate::transform::PathTransformer;

/// Default scheme marking an index address as remote
pub const DEFAULT_REMOTE_SCHEME: &str = "r2://";

/// Environment variables holding remote credentials
pub const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
pub const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
pub const ENV_ENDPOINT: &str = "R2_ENDPOINT";

/// Main configuration for a [`WikiData`](crate::store::WikiData) instance
#[derive(Debug, Clone)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Index Location
    // -------------------------------------------------------------------------
    /// Index directory: a local path, or `{remote_scheme}bucket/prefix`
    /// Layout:
    ///   {index_path}/
    ///     ├── data.idx     (sorted title → location table)
    ///     └── meta.json    (optional build metadata)
    pub index_path: String,

    /// Prefix that marks `index_path` as a remote object address
    pub remote_scheme: String,

    // -------------------------------------------------------------------------
    // Remote Access
    // -------------------------------------------------------------------------
    /// Required only for remote addresses
    pub credentials: Option<RemoteCredentials>,

    /// Endpoint override; defaults to the account's R2 endpoint
    pub endpoint: Option<String>,

    /// Retries per remote request (0 = fail on first error)
    pub max_retries: usize,

    /// Whole-request timeout (milliseconds)
    pub request_timeout_ms: u64,

    /// Connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Parent directory for the downloaded index copy (system temp dir if unset)
    pub cache_root: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Shard Addressing
    // -------------------------------------------------------------------------
    /// Base directory for relative local shard locations (cwd if unset)
    pub shard_root: Option<PathBuf>,

    /// Rewrite applied to every stored location before reading the shard
    pub path_transformer: PathTransformer,
}

/// Credentials for the S3-compatible remote store
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl RemoteCredentials {
    pub fn new(
        account_id: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Read all three values from the environment.
    ///
    /// Fails with [`WikiError::Configuration`] naming the first missing variable.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            account_id: require_env(ENV_ACCOUNT_ID)?,
            access_key_id: require_env(ENV_ACCESS_KEY_ID)?,
            secret_access_key: require_env(ENV_SECRET_ACCESS_KEY)?,
        })
    }

    /// Reject blank values before anything touches the network.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            (ENV_ACCOUNT_ID, &self.account_id),
            (ENV_ACCESS_KEY_ID, &self.access_key_id),
            (ENV_SECRET_ACCESS_KEY, &self.secret_access_key),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(WikiError::Configuration(format!("{} is empty", name)));
            }
        }
        Ok(())
    }

    /// Cloudflare R2 endpoint for this account
    pub fn default_endpoint(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

impl std::fmt::Debug for RemoteCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCredentials")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

fn require_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(WikiError::Configuration(format!(
            "environment variable {} is not set",
            name
        ))),
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            index_path: "./index".to_string(),
            remote_scheme: DEFAULT_REMOTE_SCHEME.to_string(),
            credentials: None,
            endpoint: None,
            max_retries: 3,
            request_timeout_ms: 30_000,
            connect_timeout_ms: 5_000,
            cache_root: None,
            shard_root: None,
            path_transformer: PathTransformer::identity(),
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Config for `index_path`, taking remote settings from the environment.
    ///
    /// Missing credentials are not an error here; they only matter (and are
    /// reported) when the address turns out to be remote.
    pub fn from_env(index_path: impl Into<String>) -> Self {
        let mut builder = Self::builder().index_path(index_path);
        if let Ok(credentials) = RemoteCredentials::from_env() {
            builder = builder.credentials(credentials);
        }
        if let Ok(endpoint) = env::var(ENV_ENDPOINT) {
            if !endpoint.trim().is_empty() {
                builder = builder.endpoint(endpoint);
            }
        }
        builder.build()
    }

    /// Whether `index_path` uses the remote scheme
    pub fn is_remote(&self) -> bool {
        self.index_path.starts_with(&self.remote_scheme)
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the index address (local directory or remote address)
    pub fn index_path(mut self, path: impl Into<String>) -> Self {
        self.config.index_path = path.into();
        self
    }

    /// Set the remote scheme prefix (e.g. `r2://`, `s3://`)
    pub fn remote_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.remote_scheme = scheme.into();
        self
    }

    /// Set the remote credentials
    pub fn credentials(mut self, credentials: RemoteCredentials) -> Self {
        self.config.credentials = Some(credentials);
        self
    }

    /// Override the remote endpoint URL
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    /// Set the retry count for remote requests
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the remote request timeout (in milliseconds)
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms;
        self
    }

    /// Set the remote connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the parent directory for the downloaded index
    pub fn cache_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_root = Some(path.into());
        self
    }

    /// Set the base directory for relative shard locations
    pub fn shard_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.shard_root = Some(path.into());
        self
    }

    /// Set the location rewrite
    pub fn path_transformer(mut self, transformer: PathTransformer) -> Self {
        self.config.path_transformer = transformer;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
