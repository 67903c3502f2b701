//! Article Store
//!
//! The one handle the game loop talks to: title in, [`Page`] out.
//!
//! ## Lookup Path
//! ```text
//! get_page(title)
//!   → resolve_location (exact, then case fallbacks)
//!   → path transformer
//!   → shard (local file, or object in remote storage)
//!   → parse_page (first record with the matched title)
//! ```
//!
//! ## Resource Model
//! - The index is opened (and, if remote, downloaded) once in [`WikiData::open`]
//! - A remote index lives in a scoped temp directory removed on close or drop
//! - Lookups take `&self`; any number of threads may read concurrently

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{Result, WikiError};
use crate::index::TitleIndex;
use crate::page::Page;
use crate::remote::{normalize_key, R2Provider, RemoteAddress, RemoteFetcher, StoreProvider};
use crate::resolver::{resolve_location, Resolution};
use crate::shard::ShardSource;

/// Remote side of a store opened from an object address
struct RemoteBackend {
    address: RemoteAddress,
    fetcher: RemoteFetcher,
}

/// Title → article store over a local or remote index
///
/// Must not be used from inside an async runtime when remote: fetches block
/// on the store's own runtime.
pub struct WikiData {
    config: StoreConfig,

    /// Memory-mapped index; declared before `cache_dir` so the mapping is
    /// released before the directory is removed
    index: TitleIndex,

    remote: Option<RemoteBackend>,

    /// Downloaded index copy (remote only)
    cache_dir: Option<TempDir>,
}

impl WikiData {
    /// Open the index named by `config.index_path`.
    ///
    /// A remote address needs credentials; they are checked before any
    /// network call. On failure nothing is left behind on disk.
    pub fn open(config: StoreConfig) -> Result<Self> {
        match RemoteAddress::parse(&config.index_path, &config.remote_scheme)? {
            Some(address) => {
                let provider = Arc::new(R2Provider::from_config(&config)?);
                Self::open_remote(config, address, provider)
            }
            None => Self::open_local(config),
        }
    }

    /// Open with a caller-supplied object-store provider.
    ///
    /// Used for custom clients and in-memory stores; a local `index_path`
    /// ignores the provider.
    pub fn open_with_provider(
        config: StoreConfig,
        provider: Arc<dyn StoreProvider>,
    ) -> Result<Self> {
        match RemoteAddress::parse(&config.index_path, &config.remote_scheme)? {
            Some(address) => Self::open_remote(config, address, provider),
            None => Self::open_local(config),
        }
    }

    /// Open a local index directory
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = StoreConfig::builder()
            .index_path(path.as_ref().to_string_lossy())
            .build();
        Self::open_local(config)
    }

    fn open_local(config: StoreConfig) -> Result<Self> {
        let index = TitleIndex::open(Path::new(&config.index_path))?;
        info!(
            path = %config.index_path,
            entries = index.entry_count(),
            "Opened local index"
        );

        Ok(Self {
            config,
            index,
            remote: None,
            cache_dir: None,
        })
    }

    fn open_remote(
        config: StoreConfig,
        address: RemoteAddress,
        provider: Arc<dyn StoreProvider>,
    ) -> Result<Self> {
        let fetcher = RemoteFetcher::new(provider)?;
        let cache_dir = create_cache_dir(config.cache_root.as_deref())?;

        // Any early return from here drops `cache_dir`, removing the partial copy
        fetcher.fetch_whole_index(&address, cache_dir.path())?;
        let index = TitleIndex::open(cache_dir.path())?;
        info!(
            address = %address,
            cache = %cache_dir.path().display(),
            entries = index.entry_count(),
            "Opened remote index"
        );

        Ok(Self {
            config,
            index,
            remote: Some(RemoteBackend { address, fetcher }),
            cache_dir: Some(cache_dir),
        })
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Resolve `title` to its stored (untransformed) location.
    pub fn locate(&self, title: &str) -> Result<Resolution> {
        resolve_location(&self.index, title)
    }

    /// Fetch the article for `title`.
    ///
    /// Lookup, shard and remote errors are returned as-is; anything
    /// unexpected (I/O and the like) comes back as [`WikiError::Runtime`].
    pub fn get_page(&self, title: &str) -> Result<Page> {
        self.read_page(title).map_err(WikiError::into_runtime)
    }

    fn read_page(&self, title: &str) -> Result<Page> {
        let resolution = self.locate(title)?;
        let location = self.config.path_transformer.apply(&resolution.location);
        debug!(
            title,
            matched = %resolution.matched_title,
            location = %location,
            "Located article"
        );

        let source = self.shard_source(&location)?;
        source.find_page(&resolution.matched_title)
    }

    fn shard_source(&self, location: &str) -> Result<ShardSource> {
        let Some(remote) = &self.remote else {
            return Ok(ShardSource::local(self.local_shard_path(location)));
        };

        let (bucket, key) = match RemoteAddress::parse(location, &self.config.remote_scheme)? {
            Some(address) => (address.bucket, address.prefix),
            None => (remote.address.bucket.clone(), normalize_key(location)),
        };
        let body = remote.fetcher.fetch_shard(&bucket, &key)?;
        Ok(ShardSource::remote(format!("{}/{}", bucket, key), body))
    }

    fn local_shard_path(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        match &self.config.shard_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    // =========================================================================
    // Lifecycle & Accessors
    // =========================================================================

    /// Release the mapping, then remove the downloaded index (if any).
    ///
    /// A cache directory that is already gone is not an error.
    pub fn close(self) -> Result<()> {
        let WikiData {
            index, cache_dir, ..
        } = self;
        drop(index);

        if let Some(dir) = cache_dir {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!(cache = %path.display(), "Removed index cache"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Whether the index was downloaded from remote storage
    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Number of titles in the index
    pub fn entry_count(&self) -> u64 {
        self.index.entry_count()
    }

    /// Local directory holding the downloaded index (remote only)
    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_ref().map(TempDir::path)
    }

    pub fn index(&self) -> &TitleIndex {
        &self.index
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

fn create_cache_dir(root: Option<&Path>) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("wikirace-index-");
    let dir = match root {
        Some(root) => {
            std::fs::create_dir_all(root)?;
            builder.tempdir_in(root)?
        }
        None => builder.tempdir()?,
    };
    Ok(dir)
}
