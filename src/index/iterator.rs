//! Index Iterator
//!
//! Sequential iteration over all entries of a mapped index.

use super::reader::TitleIndex;

/// Iterator over index entries in sorted key order
pub struct IndexIterator<'a> {
    index: &'a TitleIndex,
    /// Next entry to yield
    position: u64,
}

impl<'a> IndexIterator<'a> {
    pub(super) fn new(index: &'a TitleIndex) -> Self {
        Self { index, position: 0 }
    }
}

impl<'a> Iterator for IndexIterator<'a> {
    /// (key, value), both borrowed from the mapping
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.index.entry(self.position)?;
        self.position += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.index.entry_count().saturating_sub(self.position) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndexIterator<'_> {}
