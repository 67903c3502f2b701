//! # wikirace
//!
//! Title index and article store for playing the Wikipedia game over an
//! offline dump:
//! - Memory-mapped, sorted title → shard-location index
//! - Case-fallback title resolution
//! - JSON-lines article shards on local disk or S3-compatible storage
//! - Whole-index download into a scoped cache for remote stores
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Game Runner / CLI                           │
//! │                get_page(title) → Page                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    WikiData (store)                          │
//! │        resolve → transform → read shard → parse              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼─────────────────────┐
//!          │            │                     │
//!          ▼            ▼                     ▼
//!   ┌─────────────┐ ┌─────────────┐   ┌──────────────┐
//!   │  Resolver   │ │   Shards    │   │    Remote    │
//!   │ (fallbacks) │ │ (JSON lines)│   │ (R2 / S3)    │
//!   └──────┬──────┘ └─────────────┘   └──────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │ TitleIndex  │
//!   │   (mmap)    │
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod game;
pub mod index;
pub mod page;
pub mod remote;
pub mod resolver;
pub mod shard;
pub mod store;
pub mod transform;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{RemoteCredentials, StoreConfig};
pub use error::{Result, WikiError};
pub use game::{run_game, GameOptions, GameOutcome, LinkChooser};
pub use page::Page;
pub use resolver::Resolution;
pub use store::WikiData;
pub use transform::PathTransformer;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of wikirace
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
