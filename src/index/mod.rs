//! Title Index Module
//!
//! Immutable, memory-mapped, sorted title → location table. Built once by a
//! single writer, then opened read-only by any number of readers.
//!
//! ## Directory Layout
//! ```text
//! {index_dir}/
//!   ├── data.idx     (primary data file, required)
//!   └── meta.json    (build metadata, optional at read time)
//! ```
//!
//! ## File Format (`data.idx`)
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                       │
//! │   Magic: "WKIX" (4) | Version: u16 (2) | Count: u64 (8) │
//! ├─────────────────────────────────────────────────────────┤
//! │ Data Block (variable)                                   │
//! │   [KeyLen: u32][ValLen: u32][Key][Value]                │
//! │   ... repeated for each entry, sorted by key bytes ...  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Offset Table (8 × Count bytes)                          │
//! │   [EntryOffset: u64] ... one per entry, same order ...  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (16 bytes)                                       │
//! │   TableOffset: u64 (8) | CRC: u32 (4) | Padding (4)     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The CRC covers everything between header and footer. The fixed-width
//! offset table lets readers binary search straight out of the mapping
//! without loading anything into memory.

mod builder;
mod bulk;
mod iterator;
mod reader;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

pub use builder::IndexBuilder;
pub use bulk::{build_from_json, BulkOptions, BulkReport, DEFAULT_BATCH_SIZE};
pub use iterator::IndexIterator;
pub use reader::TitleIndex;

// =============================================================================
// Shared Constants (used by builder, reader, iterator)
// =============================================================================

/// Magic bytes identifying a title index file
pub(crate) const MAGIC: &[u8; 4] = b"WKIX";

/// Current index format version
pub const FORMAT_VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + EntryCount (8) = 14 bytes
pub(crate) const HEADER_SIZE: u64 = 14;

/// Footer size: TableOffset (8) + CRC (4) + Padding (4) = 16 bytes
pub(crate) const FOOTER_SIZE: u64 = 16;

/// Per-entry header: KeyLen (4) + ValLen (4)
pub(crate) const ENTRY_HEADER_SIZE: u64 = 8;

/// Primary data file inside an index directory
pub const DATA_FILE: &str = "data.idx";

/// Companion metadata file inside an index directory
pub const META_FILE: &str = "meta.json";

// =============================================================================
// Index Metadata
// =============================================================================

/// Build metadata written next to the data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u16,
    pub entry_count: u64,
    pub crc: u32,
    /// Unix seconds
    pub built_at: u64,
    /// Where the entries came from (e.g. the bulk JSON path)
    #[serde(default)]
    pub source: Option<String>,
}

impl IndexMeta {
    /// Read `meta.json` from an index directory.
    ///
    /// Absent or unreadable metadata is not an error: the data file is
    /// self-describing, so this only logs and returns `None`.
    pub fn load(dir: &Path) -> Option<Self> {
        let path = dir.join(META_FILE);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(_) => return None,
        };
        match serde_json::from_slice(&raw) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(path = ?path, error = %e, "Ignoring unreadable index metadata");
                None
            }
        }
    }

    pub(crate) fn store(&self, dir: &Path) -> Result<()> {
        let path = dir.join(META_FILE);
        let raw = serde_json::to_vec_pretty(self)
            .map_err(|e| crate::WikiError::Build(format!("Failed to encode metadata: {}", e)))?;
        fs::write(path, raw)?;
        Ok(())
    }
}

// =============================================================================
// Build Summary
// =============================================================================

/// What a finished build produced.
#[derive(Debug, Clone)]
pub struct IndexSummary {
    /// Index directory
    pub path: PathBuf,
    /// Number of entries in this index
    pub entry_count: u64,
    /// Smallest key
    pub min_key: Vec<u8>,
    /// Largest key
    pub max_key: Vec<u8>,
    /// Size of `data.idx` in bytes
    pub file_size: u64,
    pub crc: u32,
}

impl IndexSummary {
    /// Get the number of entries
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Quick check if a key might be in this index (range check)
    /// Returns false if key is definitely outside [min_key, max_key]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        self.entry_count > 0 && key >= self.min_key.as_slice() && key <= self.max_key.as_slice()
    }
}
