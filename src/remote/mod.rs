//! Remote Object Module
//!
//! Serves the index and shards from S3-compatible storage (Cloudflare R2 by
//! default).
//!
//! ## Responsibilities
//! - Recognize `scheme://bucket/prefix` addresses
//! - Build (and cache) one object-store client per bucket
//! - Download the whole index once into a scoped local directory
//! - Fetch individual shards on demand
//!
//! ## Remote Layout
//! ```text
//! scheme://bucket/prefix/
//!   ├── data.idx     (required)
//!   └── meta.json    (optional)
//! ```
//!
//! All calls block the caller: the fetcher owns a current-thread runtime and
//! drives the async client to completion on each request.

mod address;
mod fetcher;
mod provider;

pub use address::{normalize_key, RemoteAddress};
pub use fetcher::RemoteFetcher;
pub use provider::{R2Provider, StaticProvider, StoreProvider};
