//! Shard Reader & Page Parser
//!
//! A shard is a JSON-lines file holding many article records:
//!
//! ```text
//! {"title": "Python", "text": "...", "url": "/wiki/Python", "links": ["..."]}
//! {"title": "Rust", "text": "...", "url": "/wiki/Rust", "links": ["..."]}
//! ```
//!
//! Records are found by linear scan on exact title. Only the title of each
//! line is decoded during the scan; the full record is decoded once, for the
//! match.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, WikiError};
use crate::page::Page;

/// Where a shard's bytes come from
#[derive(Debug, Clone)]
pub enum ShardSource {
    /// File on local disk, streamed line by line
    Local(PathBuf),
    /// Whole object body fetched from remote storage
    Remote { key: String, body: Bytes },
}

/// One non-blank line of a shard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line number
    pub line: usize,
    pub json: String,
}

impl ShardSource {
    pub fn local(path: impl AsRef<Path>) -> Self {
        ShardSource::Local(path.as_ref().to_path_buf())
    }

    pub fn remote(key: impl Into<String>, body: impl Into<Bytes>) -> Self {
        ShardSource::Remote {
            key: key.into(),
            body: body.into(),
        }
    }

    /// Human-readable origin, for logs and errors
    pub fn describe(&self) -> String {
        match self {
            ShardSource::Local(path) => path.display().to_string(),
            ShardSource::Remote { key, .. } => key.clone(),
        }
    }

    /// Lazily iterate over the shard's records.
    ///
    /// Each call starts a fresh pass, so the sequence can be restarted.
    pub fn records(&self) -> Result<ShardRecords<'_>> {
        let lines = match self {
            ShardSource::Local(path) => Lines::Local(BufReader::new(File::open(path)?).lines()),
            ShardSource::Remote { key, body } => {
                let text = std::str::from_utf8(body).map_err(|e| {
                    WikiError::Parse(format!("{} is not valid UTF-8: {}", key, e))
                })?;
                Lines::Remote(text.lines())
            }
        };
        Ok(ShardRecords { lines, line: 0 })
    }

    /// Scan this shard for `matched_title`.
    pub fn find_page(&self, matched_title: &str) -> Result<Page> {
        debug!(shard = %self.describe(), title = matched_title, "Scanning shard");
        parse_page(self.records()?, matched_title)
    }
}

enum Lines<'a> {
    Local(io::Lines<BufReader<File>>),
    Remote(std::str::Lines<'a>),
}

/// Iterator over the non-blank lines of a shard
pub struct ShardRecords<'a> {
    lines: Lines<'a>,
    line: usize,
}

impl Iterator for ShardRecords<'_> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let json = match &mut self.lines {
                Lines::Local(lines) => match lines.next()? {
                    Ok(line) => line,
                    Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                        return Some(Err(WikiError::Parse(format!(
                            "line {} is not valid UTF-8",
                            self.line + 1
                        ))));
                    }
                    Err(e) => return Some(Err(e.into())),
                },
                Lines::Remote(lines) => lines.next()?.to_string(),
            };
            self.line += 1;
            if json.trim().is_empty() {
                continue;
            }
            return Some(Ok(RawRecord {
                line: self.line,
                json,
            }));
        }
    }
}

// =============================================================================
// Record Decoding
// =============================================================================

/// Just enough of a record to filter on title
#[derive(Deserialize)]
struct TitleProbe {
    #[serde(default)]
    title: Option<String>,
}

/// The full record; every field is checked explicitly so a missing one is
/// reported rather than defaulted.
#[derive(Deserialize)]
struct ShardRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    links: Option<Vec<String>>,
}

/// Return the first record whose `title` equals `matched_title` exactly.
///
/// - no such record → [`WikiError::ArticleNotFound`]
/// - a line that is not JSON → [`WikiError::Parse`]
/// - a record without `title`, or the match without `text`/`url`/`links`
///   → [`WikiError::MalformedRecord`]
pub fn parse_page<I>(records: I, matched_title: &str) -> Result<Page>
where
    I: IntoIterator<Item = Result<RawRecord>>,
{
    for record in records {
        let record = record?;
        let probe: TitleProbe = serde_json::from_str(&record.json)
            .map_err(|e| WikiError::Parse(format!("line {}: {}", record.line, e)))?;

        let title = probe.title.ok_or_else(|| {
            WikiError::MalformedRecord(format!("line {}: missing field `title`", record.line))
        })?;
        if title != matched_title {
            continue;
        }

        let full: ShardRecord = serde_json::from_str(&record.json)
            .map_err(|e| WikiError::Parse(format!("line {}: {}", record.line, e)))?;
        let missing = |field: &str| {
            WikiError::MalformedRecord(format!(
                "line {}: record {:?} is missing field `{}`",
                record.line, matched_title, field
            ))
        };
        let text = full.text.ok_or_else(|| missing("text"))?;
        let url = full.url.ok_or_else(|| missing("url"))?;
        let links = full.links.ok_or_else(|| missing("links"))?;

        return Ok(Page::new(full.title.unwrap_or(title), url, text, links));
    }

    Err(WikiError::ArticleNotFound(format!(
        "{} (indexed, but absent from its shard)",
        matched_title
    )))
}
