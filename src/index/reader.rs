//! Index Reader
//!
//! Maps `data.idx` read-only and answers point lookups by binary search over
//! the offset table. All reads borrow from the mapping; `&self` only.

use std::cmp::Ordering;
use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::info;

use crate::error::{Result, WikiError};

use super::iterator::IndexIterator;
use super::{
    IndexMeta, DATA_FILE, ENTRY_HEADER_SIZE, FOOTER_SIZE, FORMAT_VERSION, HEADER_SIZE, MAGIC,
};

/// Read-only, memory-mapped title index
pub struct TitleIndex {
    mmap: Mmap,
    dir: PathBuf,
    entry_count: u64,
    /// Start of the offset table (end of the data block)
    table_offset: usize,
    meta: Option<IndexMeta>,
}

impl TitleIndex {
    /// Open an index directory for reading
    ///
    /// Validates the header, footer, CRC and every entry offset up front so
    /// lookups never have to deal with a truncated or corrupt file.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(DATA_FILE);
        let file = File::open(&path)
            .map_err(|e| WikiError::StoreOpen(format!("{}: {}", path.display(), e)))?;

        // SAFETY: index files are immutable once built; nothing writes them
        // while they are mapped.
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| WikiError::StoreOpen(format!("{}: {}", path.display(), e)))?;

        let (entry_count, table_offset) = validate(&mmap)
            .map_err(|reason| WikiError::StoreOpen(format!("{}: {}", path.display(), reason)))?;

        let meta = IndexMeta::load(dir);

        info!(path = ?dir, entries = entry_count, "Index opened");

        Ok(Self {
            mmap,
            dir: dir.to_path_buf(),
            entry_count,
            table_offset,
            meta,
        })
    }

    /// Get a value by key: O(log n) binary search, zero-copy
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let mut lo = 0u64;
        let mut hi = self.entry_count;

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (entry_key, value) = self.entry(mid)?;
            match entry_key.cmp(key) {
                Ordering::Equal => return Some(value),
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
            }
        }
        None
    }

    /// Look up a UTF-8 key and decode the stored location
    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key.as_bytes()) {
            Some(value) => std::str::from_utf8(value).map(Some).map_err(|_| {
                WikiError::Runtime(format!("location stored for {:?} is not valid UTF-8", key))
            }),
            None => Ok(None),
        }
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Get entry count
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Directory this index was opened from
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Build metadata, if `meta.json` was present and readable
    pub fn meta(&self) -> Option<&IndexMeta> {
        self.meta.as_ref()
    }

    /// Iterate over all entries in sorted key order
    pub fn iter(&self) -> IndexIterator<'_> {
        IndexIterator::new(self)
    }

    /// Entry `i` in sorted order
    pub(super) fn entry(&self, i: u64) -> Option<(&[u8], &[u8])> {
        if i >= self.entry_count {
            return None;
        }
        let slot = self.table_offset + (i as usize) * 8;
        let offset = read_u64(&self.mmap, slot)? as usize;
        read_entry(&self.mmap, offset, self.table_offset).map(|(key, value, _)| (key, value))
    }
}

// =============================================================================
// Layout Helpers
// =============================================================================

fn read_u32(data: &[u8], pos: usize) -> Option<u32> {
    data.get(pos..pos + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
}

fn read_u64(data: &[u8], pos: usize) -> Option<u64> {
    data.get(pos..pos + 8)
        .and_then(|b| b.try_into().ok())
        .map(u64::from_le_bytes)
}

/// Decode the entry at `offset`; returns (key, value, next_offset).
/// `limit` is the end of the data block.
fn read_entry(data: &[u8], offset: usize, limit: usize) -> Option<(&[u8], &[u8], usize)> {
    let key_len = read_u32(data, offset)? as usize;
    let val_len = read_u32(data, offset + 4)? as usize;
    let key_start = offset + ENTRY_HEADER_SIZE as usize;
    let val_start = key_start.checked_add(key_len)?;
    let end = val_start.checked_add(val_len)?;
    if end > limit {
        return None;
    }
    Some((&data[key_start..val_start], &data[val_start..end], end))
}

/// Check structure and checksum; returns (entry_count, table_offset).
fn validate(data: &[u8]) -> std::result::Result<(u64, usize), String> {
    let len = data.len() as u64;
    if len < HEADER_SIZE + FOOTER_SIZE {
        return Err(format!("file too small ({} bytes)", len));
    }

    if &data[0..4] != MAGIC {
        return Err(format!(
            "invalid magic: expected WKIX, got {:?}",
            &data[0..4]
        ));
    }

    let version = u16::from_le_bytes([data[4], data[5]]);
    if version != FORMAT_VERSION {
        return Err(format!("unsupported index version: {}", version));
    }

    let entry_count = read_u64(data, 6).ok_or("truncated header")?;

    let footer_start = (len - FOOTER_SIZE) as usize;
    let table_offset = read_u64(data, footer_start).ok_or("truncated footer")?;
    let stored_crc = read_u32(data, footer_start + 8).ok_or("truncated footer")?;

    let table_len = entry_count.checked_mul(8).ok_or("entry count overflows")?;
    if table_offset < HEADER_SIZE || table_offset.checked_add(table_len) != Some(len - FOOTER_SIZE)
    {
        return Err(format!(
            "inconsistent layout: {} entries, table at {}, file is {} bytes",
            entry_count, table_offset, len
        ));
    }

    let crc = crc32fast::hash(&data[HEADER_SIZE as usize..footer_start]);
    if crc != stored_crc {
        return Err(format!("checksum mismatch: stored {:08x}, computed {:08x}", stored_crc, crc));
    }

    // Entries must tile the data block exactly, in table order.
    let table_offset = table_offset as usize;
    let mut expected = HEADER_SIZE as usize;
    for i in 0..entry_count as usize {
        let offset =
            read_u64(data, table_offset + i * 8).ok_or("truncated offset table")? as usize;
        if offset != expected {
            return Err(format!("entry {} at offset {}, expected {}", i, offset, expected));
        }
        let (_, _, next) = read_entry(data, offset, table_offset)
            .ok_or_else(|| format!("entry {} overruns data block", i))?;
        expected = next;
    }
    if expected != table_offset {
        return Err("data block has trailing bytes".to_string());
    }

    Ok((entry_count, table_offset))
}
