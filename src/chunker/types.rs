use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// `element_path` of chunks cut by the size-based strategy
pub const SIZE_BASED_PATH: &str = "size_based";

/// How a document was partitioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Cuts at major element boundaries
    Structural,
    /// Fixed windows with element-aware cut points and overlap
    SizeBased,
}

/// A boundary-safe slice of the source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Content hash prefix
    pub id: String,
    /// Position in the chunk sequence
    pub index: usize,
    pub content: String,
    /// Path of the first element starting in the chunk, or the enclosing
    /// path; [`SIZE_BASED_PATH`] for size-based chunks
    pub element_path: String,
    /// Inclusive 1-based lines
    pub line_range: (u64, u64),
    /// Half-open byte offsets in the source
    pub byte_range: (u64, u64),
    pub size_bytes: usize,
    /// Leading bytes repeated from the end of the previous chunk
    pub overlap_bytes: usize,
    /// Tags whose start tags lie in this chunk (outside the overlap). A
    /// structural chunk with none names its enclosing element instead; one
    /// holding only markup after the root end tag has none.
    pub elements_contained: Vec<String>,
    pub summary: String,
}

impl DocumentChunk {
    /// Content without the region shared with the previous chunk
    pub fn fresh_content(&self) -> &str {
        &self.content[self.overlap_bytes..]
    }
}

/// Stable identifier derived from chunk bytes
pub fn chunk_id(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

/// Line numbers for offsets that mostly move forward
pub(crate) struct LineTracker<'a> {
    source: &'a [u8],
    offset: usize,
    /// Newlines before `offset`
    newlines: u64,
}

impl<'a> LineTracker<'a> {
    pub(crate) fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            offset: 0,
            newlines: 0,
        }
    }

    /// 1-based line of the byte at `offset`
    pub(crate) fn line_at(&mut self, offset: usize) -> u64 {
        let offset = offset.min(self.source.len());
        if offset >= self.offset {
            self.newlines += count_newlines(&self.source[self.offset..offset]);
        } else {
            self.newlines -= count_newlines(&self.source[offset..self.offset]);
        }
        self.offset = offset;
        self.newlines + 1
    }

    /// Inclusive line range covered by `start..end`
    pub(crate) fn range(&mut self, start: usize, end: usize) -> (u64, u64) {
        let first = self.line_at(start);
        let last = if end > start { self.line_at(end - 1) } else { first };
        (first, last)
    }
}

fn count_newlines(bytes: &[u8]) -> u64 {
    bytes.iter().filter(|&&b| b == b'\n').count() as u64
}
