//! Object-store clients, one per bucket.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use object_store::aws::AmazonS3Builder;
use object_store::{ClientOptions, ObjectStore, RetryConfig};
use parking_lot::RwLock;
use tracing::debug;

use crate::config::{RemoteCredentials, StoreConfig};
use crate::error::{Result, WikiError};

/// Hands out a client for a bucket.
pub trait StoreProvider: Send + Sync {
    fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>>;
}

// =============================================================================
// R2 / S3-compatible
// =============================================================================

/// Builds S3-compatible clients from credentials and caches them per bucket.
///
/// Building a client performs no network I/O.
pub struct R2Provider {
    credentials: RemoteCredentials,
    endpoint: String,
    max_retries: usize,
    request_timeout: Duration,
    connect_timeout: Duration,
    stores: RwLock<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl R2Provider {
    /// Fails with [`WikiError::Configuration`] if credentials are absent or blank.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let credentials = config.credentials.clone().ok_or_else(|| {
            WikiError::Configuration(format!(
                "remote index {:?} requires credentials",
                config.index_path
            ))
        })?;
        credentials.validate()?;

        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| credentials.default_endpoint());

        Ok(Self {
            credentials,
            endpoint,
            max_retries: config.max_retries,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            stores: RwLock::new(HashMap::new()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        let mut retry = RetryConfig::default();
        retry.max_retries = self.max_retries;
        retry.retry_timeout = self.request_timeout;

        let options = ClientOptions::new()
            .with_allow_http(self.endpoint.starts_with("http://"))
            .with_timeout(self.request_timeout)
            .with_connect_timeout(self.connect_timeout);

        let store = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_region("auto")
            .with_endpoint(&self.endpoint)
            .with_access_key_id(&self.credentials.access_key_id)
            .with_secret_access_key(&self.credentials.secret_access_key)
            .with_retry(retry)
            .with_client_options(options)
            .build()
            .map_err(|e| {
                WikiError::Configuration(format!("cannot configure bucket {:?}: {}", bucket, e))
            })?;

        debug!(bucket, endpoint = %self.endpoint, "Object store client built");
        Ok(Arc::new(store))
    }
}

impl StoreProvider for R2Provider {
    fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        if let Some(store) = self.stores.read().get(bucket) {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.stores.write();
        if let Some(store) = stores.get(bucket) {
            return Ok(Arc::clone(store));
        }
        let store = self.build(bucket)?;
        stores.insert(bucket.to_string(), Arc::clone(&store));
        Ok(store)
    }
}

// =============================================================================
// Prebuilt stores
// =============================================================================

/// Serves a fixed set of prebuilt stores (in-memory stores, custom clients).
#[derive(Default)]
pub struct StaticProvider {
    stores: HashMap<String, Arc<dyn ObjectStore>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        self.stores.insert(bucket.into(), store);
        self
    }
}

impl StoreProvider for StaticProvider {
    fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        self.stores.get(bucket).cloned().ok_or_else(|| {
            WikiError::Configuration(format!("no object store configured for bucket {:?}", bucket))
        })
    }
}
