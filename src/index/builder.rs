//! Index Builder
//!
//! Writes sorted title → location entries to a new index directory.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::error::{Result, WikiError};

use super::{
    IndexMeta, IndexSummary, DATA_FILE, ENTRY_HEADER_SIZE, FORMAT_VERSION, HEADER_SIZE, MAGIC,
};

/// Builder for creating a new index from sorted entries
pub struct IndexBuilder {
    /// Output directory
    dir: PathBuf,
    /// Buffered writer for `data.idx`
    writer: BufWriter<File>,
    /// Number of entries written
    entry_count: u64,
    /// Current write position
    current_offset: u64,
    /// Offset table: one data-block offset per entry
    offsets: Vec<u64>,
    /// Track min/max keys for the summary (max doubles as the ordering check)
    min_key: Option<Vec<u8>>,
    max_key: Option<Vec<u8>>,
    /// Running CRC over data block and offset table
    hasher: crc32fast::Hasher,
    /// Recorded in metadata
    source: Option<String>,
}

impl IndexBuilder {
    /// Create a new index builder in `dir` (created if missing)
    ///
    /// Writes the header immediately; call `add()` in strictly ascending key
    /// order, then `finish()` to write the offset table, footer and metadata.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(dir.join(DATA_FILE))?;

        let mut writer = BufWriter::new(file);

        // entry_count is a placeholder, patched in finish()
        writer.write_all(MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?;

        Ok(Self {
            dir: dir.to_path_buf(),
            writer,
            entry_count: 0,
            current_offset: HEADER_SIZE,
            offsets: Vec::new(),
            min_key: None,
            max_key: None,
            hasher: crc32fast::Hasher::new(),
            source: None,
        })
    }

    /// Record where the entries came from (stored in `meta.json`)
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add an entry (keys must be strictly ascending by byte order)
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if let Some(last) = &self.max_key {
            if key <= last.as_slice() {
                return Err(WikiError::Build(format!(
                    "keys must be strictly ascending: {:?} after {:?}",
                    String::from_utf8_lossy(key),
                    String::from_utf8_lossy(last)
                )));
            }
        }

        let key_len = u32::try_from(key.len())
            .map_err(|_| WikiError::Build(format!("key too long: {} bytes", key.len())))?;
        let val_len = u32::try_from(value.len())
            .map_err(|_| WikiError::Build(format!("value too long: {} bytes", value.len())))?;

        self.offsets.push(self.current_offset);

        if self.min_key.is_none() {
            self.min_key = Some(key.to_vec());
        }
        self.max_key = Some(key.to_vec());

        // [key_len(4)][val_len(4)][key][value]
        let key_len_bytes = key_len.to_le_bytes();
        let val_len_bytes = val_len.to_le_bytes();

        self.writer.write_all(&key_len_bytes)?;
        self.writer.write_all(&val_len_bytes)?;
        self.writer.write_all(key)?;
        self.writer.write_all(value)?;

        self.hasher.update(&key_len_bytes);
        self.hasher.update(&val_len_bytes);
        self.hasher.update(key);
        self.hasher.update(value);

        self.current_offset += ENTRY_HEADER_SIZE + key.len() as u64 + value.len() as u64;
        self.entry_count += 1;

        Ok(())
    }

    /// Number of entries added so far
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Finish building: write offset table, footer, metadata and return a summary
    pub fn finish(mut self) -> Result<IndexSummary> {
        let table_offset = self.current_offset;

        for offset in &self.offsets {
            let bytes = offset.to_le_bytes();
            self.writer.write_all(&bytes)?;
            self.hasher.update(&bytes);
        }

        let crc = self.hasher.finalize();

        // Footer: table_offset (8) + crc (4) + padding (4)
        self.writer.write_all(&table_offset.to_le_bytes())?;
        self.writer.write_all(&crc.to_le_bytes())?;
        self.writer.write_all(&[0u8; 4])?;

        self.writer.flush()?;

        // Patch the entry count in the header
        let mut file = self
            .writer
            .into_inner()
            .map_err(|e| WikiError::Build(format!("Failed to flush index: {}", e)))?;
        file.seek(SeekFrom::Start(6))?; // After magic + version
        file.write_all(&self.entry_count.to_le_bytes())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();

        let built_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        IndexMeta {
            version: FORMAT_VERSION,
            entry_count: self.entry_count,
            crc,
            built_at,
            source: self.source,
        }
        .store(&self.dir)?;

        debug!(
            path = ?self.dir,
            entries = self.entry_count,
            bytes = file_size,
            "Index written"
        );

        Ok(IndexSummary {
            path: self.dir,
            entry_count: self.entry_count,
            min_key: self.min_key.unwrap_or_default(),
            max_key: self.max_key.unwrap_or_default(),
            file_size,
            crc,
        })
    }
}
