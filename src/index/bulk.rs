//! Bulk Index Build
//!
//! Converts a corpus-wide `{"title": "location", ...}` JSON object into an
//! index directory without ever holding the whole mapping in memory:
//!
//! 1. Stream the object with a serde visitor, buffering at most
//!    `batch_size` entries.
//! 2. Spill each full batch, sorted, as a run (itself a small index).
//! 3. K-way merge the runs into the final index. For duplicate titles the
//!    later occurrence in the source wins.
//! 4. Reopen the result and verify its entry count.
//!
//! The new index is staged next to the destination and swapped in at the
//! end, so a rebuild replaces the previous store wholesale.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::mem;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer, MapAccess, Visitor};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{Result, WikiError};

use super::{IndexBuilder, IndexIterator, IndexSummary, TitleIndex};

/// Default number of entries buffered before a run is spilled
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Options for [`build_from_json`]
#[derive(Debug, Clone)]
pub struct BulkOptions {
    /// Entries held in memory before spilling a sorted run
    pub batch_size: usize,
    /// Where runs are written (defaults to the destination's parent)
    pub scratch_dir: Option<PathBuf>,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            scratch_dir: None,
        }
    }
}

/// Result of a bulk build
#[derive(Debug, Clone)]
pub struct BulkReport {
    pub summary: IndexSummary,
    /// Entries read from the source, duplicates included
    pub source_entries: u64,
    /// Sorted runs spilled before the merge
    pub runs: usize,
}

/// Build an index at `dest` from the JSON object in `source`.
pub fn build_from_json(source: &Path, dest: &Path, options: &BulkOptions) -> Result<BulkReport> {
    if !source.is_file() {
        return Err(WikiError::Build(format!("{} does not exist", source.display())));
    }
    if options.batch_size == 0 {
        return Err(WikiError::Build("batch size must be positive".to_string()));
    }

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let scratch_root = options.scratch_dir.clone().unwrap_or_else(|| parent.clone());
    fs::create_dir_all(&scratch_root)?;
    let scratch = tempfile::Builder::new()
        .prefix(".wikirace-runs-")
        .tempdir_in(&scratch_root)?;
    let staging = tempfile::Builder::new()
        .prefix(".wikirace-staging-")
        .tempdir_in(&parent)?;

    info!(
        source = ?source,
        dest = ?dest,
        batch_size = options.batch_size,
        "Building title index"
    );

    // Pass 1: stream and spill sorted runs
    let mut spiller = RunSpiller::new(&scratch, options.batch_size);
    let file = File::open(source)?;
    let mut deserializer = serde_json::Deserializer::from_reader(BufReader::new(file));
    let source_entries = (&mut deserializer)
        .deserialize_map(MappingVisitor {
            spiller: &mut spiller,
        })
        .and_then(|count| deserializer.end().map(|_| count))
        .map_err(|e| match spiller.error.take() {
            Some(inner) => inner,
            None => WikiError::Build(format!(
                "{} is not a JSON object of title -> location: {}",
                source.display(),
                e
            )),
        })?;
    spiller.spill()?;
    let runs = spiller.runs;

    info!(
        entries = source_entries,
        runs = runs.len(),
        "Source streamed, merging runs"
    );

    // Pass 2: merge runs into the staged index
    let staged = staging.path().join("index");
    let summary = merge_runs(&runs, &staged, &source.display().to_string())?;
    drop(scratch);

    // Verify before swapping in
    let verified = TitleIndex::open(&staged)?;
    let counted = verified.iter().count() as u64;
    if counted != summary.entry_count {
        return Err(WikiError::Build(format!(
            "verification failed: wrote {} entries, read back {}",
            summary.entry_count, counted
        )));
    }
    drop(verified);

    if dest.exists() {
        info!(path = ?dest, "Removing existing index");
        fs::remove_dir_all(dest)?;
    }
    fs::rename(&staged, dest)?;

    info!(
        entries = summary.entry_count,
        bytes = summary.file_size,
        path = ?dest,
        "Title index built"
    );

    Ok(BulkReport {
        summary: IndexSummary {
            path: dest.to_path_buf(),
            ..summary
        },
        source_entries,
        runs: runs.len(),
    })
}

// =============================================================================
// Pass 1: bounded batches
// =============================================================================

struct RunSpiller<'a> {
    scratch: &'a TempDir,
    batch: BTreeMap<String, String>,
    batch_size: usize,
    runs: Vec<PathBuf>,
    /// Set when a spill fails inside the visitor, so the real cause survives
    /// serde's error conversion
    error: Option<WikiError>,
}

impl<'a> RunSpiller<'a> {
    fn new(scratch: &'a TempDir, batch_size: usize) -> Self {
        Self {
            scratch,
            batch: BTreeMap::new(),
            batch_size,
            runs: Vec::new(),
            error: None,
        }
    }

    fn push(&mut self, title: String, location: String) -> Result<()> {
        // Later duplicates overwrite earlier ones within a batch
        self.batch.insert(title, location);
        if self.batch.len() >= self.batch_size {
            self.spill()?;
        }
        Ok(())
    }

    fn spill(&mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let dir = self.scratch.path().join(format!("run-{:05}", self.runs.len()));
        let mut builder = IndexBuilder::new(&dir)?;
        for (title, location) in mem::take(&mut self.batch) {
            builder.add(title.as_bytes(), location.as_bytes())?;
        }
        let run = builder.finish()?;
        debug!(run = self.runs.len(), entries = run.entry_count, "Spilled run");
        self.runs.push(dir);
        Ok(())
    }
}

struct MappingVisitor<'s, 'a> {
    spiller: &'s mut RunSpiller<'a>,
}

impl<'de, 's, 'a> Visitor<'de> for MappingVisitor<'s, 'a> {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object mapping article titles to locations")
    }

    fn visit_map<M>(self, mut map: M) -> std::result::Result<u64, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut seen = 0u64;
        while let Some((title, location)) = map.next_entry::<String, String>()? {
            if let Err(e) = self.spiller.push(title, location) {
                let message = e.to_string();
                self.spiller.error = Some(e);
                return Err(de::Error::custom(message));
            }
            seen += 1;
        }
        Ok(seen)
    }
}

// =============================================================================
// Pass 2: k-way merge
// =============================================================================

fn merge_runs(runs: &[PathBuf], dest: &Path, source: &str) -> Result<IndexSummary> {
    let readers = runs
        .iter()
        .map(|dir| TitleIndex::open(dir))
        .collect::<Result<Vec<_>>>()?;
    let mut iters: Vec<IndexIterator<'_>> = readers.iter().map(TitleIndex::iter).collect();

    // Min-heap on (key, run); equal keys pop in run order, so the last one
    // popped comes from the latest run.
    let mut heap = BinaryHeap::new();
    for (run, iter) in iters.iter_mut().enumerate() {
        if let Some((key, value)) = iter.next() {
            heap.push(Reverse((key, run, value)));
        }
    }

    let mut builder = IndexBuilder::new(dest)?.with_source(source);
    while let Some(Reverse((key, run, mut value))) = heap.pop() {
        if let Some((next_key, next_value)) = iters[run].next() {
            heap.push(Reverse((next_key, run, next_value)));
        }
        while let Some(Reverse((dup_key, _, _))) = heap.peek() {
            if *dup_key != key {
                break;
            }
            if let Some(Reverse((_, dup_run, dup_value))) = heap.pop() {
                value = dup_value;
                if let Some((next_key, next_value)) = iters[dup_run].next() {
                    heap.push(Reverse((next_key, dup_run, next_value)));
                }
            }
        }
        builder.add(key, value)?;
    }

    builder.finish()
}
