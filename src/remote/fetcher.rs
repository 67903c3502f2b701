//! Blocking façade over the async object-store client.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, warn};

use super::address::{normalize_key, RemoteAddress};
use super::provider::StoreProvider;
use crate::error::{Result, WikiError};
use crate::index::{DATA_FILE, META_FILE};

/// Downloads index files and shards, blocking the calling thread.
///
/// Must not be used from inside an async runtime.
pub struct RemoteFetcher {
    provider: Arc<dyn StoreProvider>,
    runtime: Runtime,
}

impl RemoteFetcher {
    pub fn new(provider: Arc<dyn StoreProvider>) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| WikiError::Runtime(format!("cannot start fetch runtime: {}", e)))?;
        Ok(Self { provider, runtime })
    }

    /// Read a whole object into memory.
    pub fn fetch_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let store = self.provider.store_for(bucket)?;
        let key = normalize_key(key);
        let path = ObjectPath::from(key.as_str());

        self.runtime
            .block_on(async { store.get(&path).await?.bytes().await })
            .map_err(|source| WikiError::RemoteFetch {
                key: format!("{}/{}", bucket, key),
                source,
            })
    }

    /// Read one shard, keyed relative to the bucket root.
    pub fn fetch_shard(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let body = self.fetch_object(bucket, key)?;
        debug!(bucket, key, bytes = body.len(), "Fetched shard");
        Ok(body)
    }

    /// Download the index at `address` into `dest_dir`.
    ///
    /// `data.idx` is required. `meta.json` is optional: a missing object is
    /// skipped silently and any other failure is logged and skipped.
    pub fn fetch_whole_index(&self, address: &RemoteAddress, dest_dir: &Path) -> Result<()> {
        let store = self.provider.store_for(&address.bucket)?;
        fs::create_dir_all(dest_dir)?;

        let data_path = dest_dir.join(DATA_FILE);
        let bytes = self.download(&store, &address.bucket, &address.key(DATA_FILE), &data_path)?;
        info!(address = %address, bytes, "Downloaded index");

        let meta_path = dest_dir.join(META_FILE);
        match self.download(&store, &address.bucket, &address.key(META_FILE), &meta_path) {
            Ok(_) => {}
            Err(e) if e.is_remote_not_found() => {
                debug!(address = %address, "No index metadata in remote store");
            }
            Err(e) => {
                warn!(address = %address, error = %e, "Skipping index metadata");
            }
        }

        Ok(())
    }

    /// Stream one object to `dest`; a partial file is removed on failure.
    fn download(
        &self,
        store: &Arc<dyn ObjectStore>,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> Result<u64> {
        let result = self.runtime.block_on(stream_to_file(store, key, dest.to_path_buf()));
        if result.is_err() {
            let _ = fs::remove_file(dest);
        }
        result.map_err(|e| match e {
            DownloadError::Remote(source) => WikiError::RemoteFetch {
                key: format!("{}/{}", bucket, key),
                source,
            },
            DownloadError::Io(e) => WikiError::Io(e),
        })
    }
}

enum DownloadError {
    Remote(object_store::Error),
    Io(std::io::Error),
}

async fn stream_to_file(
    store: &Arc<dyn ObjectStore>,
    key: &str,
    dest: PathBuf,
) -> std::result::Result<u64, DownloadError> {
    let path = ObjectPath::from(key);
    let mut stream = store
        .get(&path)
        .await
        .map_err(DownloadError::Remote)?
        .into_stream();

    let mut writer = BufWriter::new(File::create(&dest).map_err(DownloadError::Io)?);
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(DownloadError::Remote)?;
        writer.write_all(&chunk).map_err(DownloadError::Io)?;
        written += chunk.len() as u64;
    }
    writer.flush().map_err(DownloadError::Io)?;
    writer.get_ref().sync_all().map_err(DownloadError::Io)?;

    Ok(written)
}
