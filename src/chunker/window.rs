use super::types::{chunk_id, DocumentChunk, LineTracker, SIZE_BASED_PATH};
use crate::config::ChunkingConfig;
use crate::error::AnalysisError;
use crate::reader::{EventReader, XmlEvent};
use std::ops::Range;
use std::path::Path;

/// Fixed-size windows over the raw text, for documents without major elements.
///
/// Window ends are pulled back to the end of an end tag when one lies in
/// the back half of the window. Consecutive chunks share up to
/// `overlap_size` bytes. Every cut, including the start of a shared region,
/// falls on a token boundary or on a character boundary inside plain text,
/// so quoted attribute values, CDATA sections and comments are never split.
pub(crate) fn split_windows(
    source: &str,
    config: &ChunkingConfig,
    path: &Path,
) -> Result<Vec<DocumentChunk>, AnalysisError> {
    let boundaries = Boundaries::scan(source, path)?;
    let len = source.len();
    let max = config.max_chunk_size.max(1);
    let mut lines = LineTracker::new(source.as_bytes());
    let mut chunks = Vec::new();

    let mut start = 0;
    let mut overlap = 0;
    while start < len {
        let window_end = start + max;
        let end = if window_end >= len {
            len
        } else {
            boundaries.cut_point(source, start, window_end)
        };

        let content = source[start..end].to_string();
        let elements_contained = boundaries.starts_between(start + overlap, end);
        let index = chunks.len();
        chunks.push(DocumentChunk {
            id: chunk_id(&content),
            index,
            element_path: SIZE_BASED_PATH.to_string(),
            line_range: lines.range(start, end),
            byte_range: (start as u64, end as u64),
            size_bytes: content.len(),
            overlap_bytes: overlap,
            summary: format!(
                "Size-based chunk {} ({} start tags)",
                index + 1,
                elements_contained.len()
            ),
            elements_contained,
            content,
        });

        if end >= len {
            break;
        }
        let next = boundaries.overlap_start(source, start, end, config.overlap_size);
        overlap = end - next;
        start = next;
    }

    Ok(chunks)
}

/// Offsets at which a document may be cut, taken from its token spans
struct Boundaries {
    /// Ends of end tags, ascending
    closes: Vec<usize>,
    /// Ends of every token, ascending, from 0 to the document length
    tokens: Vec<usize>,
    /// Text runs without markup, which may also be cut inside
    texts: Vec<Range<usize>>,
    /// End offset and local name of every start tag
    starts: Vec<(usize, String)>,
}

impl Boundaries {
    fn scan(source: &str, path: &Path) -> Result<Self, AnalysisError> {
        let mut boundaries = Self {
            closes: Vec::new(),
            tokens: vec![0],
            texts: Vec::new(),
            starts: Vec::new(),
        };

        let mut reader = EventReader::from_bytes(source.as_bytes(), path);
        while let Some(spanned) = reader.next_event()? {
            let (start, end) = (spanned.span.start as usize, spanned.span.end as usize);
            match spanned.event {
                XmlEvent::StartElement { name, .. } => boundaries.starts.push((end, name)),
                XmlEvent::EndElement { .. } => push_ascending(&mut boundaries.closes, end),
                // CDATA and folded comments keep their `<`
                XmlEvent::Characters(_) if !source[start..end].contains('<') => {
                    boundaries.texts.push(start..end)
                }
                XmlEvent::Characters(_) | XmlEvent::StartNamespace { .. } => {}
            }
            push_ascending(&mut boundaries.tokens, end);
        }
        push_ascending(&mut boundaries.tokens, source.len());

        Ok(boundaries)
    }

    /// Where a window that ends inside the document should be cut
    fn cut_point(&self, source: &str, start: usize, window_end: usize) -> usize {
        let floor = start + (window_end - start) / 2;

        if let Some(cut) = latest(&self.closes, floor, window_end) {
            return cut;
        }
        if let Some(cut) = latest(&self.tokens, floor, window_end) {
            return cut;
        }
        if let Some(run) = self.text_at(window_end) {
            let cut = text_floor(source, &run, window_end);
            return if cut > start {
                cut
            } else {
                text_ceil(source, &run, window_end)
            };
        }
        if let Some(cut) = latest(&self.tokens, start, window_end) {
            return cut;
        }

        // A token longer than the whole window is kept intact
        earliest(&self.tokens, window_end).unwrap_or(source.len())
    }

    /// Start of the next chunk, sharing up to `overlap` bytes with `start..end`
    fn overlap_start(&self, source: &str, start: usize, end: usize, overlap: usize) -> usize {
        let next = end.saturating_sub(overlap);
        if next <= start {
            return end;
        }

        let snapped = match self.text_at(next) {
            Some(run) => text_ceil(source, &run, next),
            None => earliest(&self.tokens, next).unwrap_or(end),
        };
        snapped.min(end)
    }

    /// Local names of the start tags ending in `from..=to`, skipping `from`
    fn starts_between(&self, from: usize, to: usize) -> Vec<String> {
        let lo = self.starts.partition_point(|(offset, _)| *offset <= from);
        let hi = self.starts.partition_point(|(offset, _)| *offset <= to);
        self.starts[lo..hi].iter().map(|(_, name)| name.clone()).collect()
    }

    /// Plain text run strictly containing `offset`
    fn text_at(&self, offset: usize) -> Option<Range<usize>> {
        let i = self.texts.partition_point(|run| run.end <= offset);
        self.texts
            .get(i)
            .filter(|run| run.start < offset && offset < run.end)
            .cloned()
    }
}

fn push_ascending(offsets: &mut Vec<usize>, offset: usize) {
    match offsets.last() {
        Some(&last) if last >= offset => {}
        _ => offsets.push(offset),
    }
}

/// Latest offset in `from < offset <= to`
fn latest(offsets: &[usize], from: usize, to: usize) -> Option<usize> {
    let i = offsets.partition_point(|&o| o <= to);
    offsets[..i].last().copied().filter(|&o| o > from)
}

/// Earliest offset `>= from`
fn earliest(offsets: &[usize], from: usize) -> Option<usize> {
    offsets.get(offsets.partition_point(|&o| o < from)).copied()
}

/// Largest offset `<= at` in `run` that splits neither a character nor an
/// entity reference
fn text_floor(source: &str, run: &Range<usize>, at: usize) -> usize {
    let mut at = at;
    while at > run.start && !source.is_char_boundary(at) {
        at -= 1;
    }
    open_entity(source, run.start, at).unwrap_or(at)
}

/// Smallest such offset `>= at`
fn text_ceil(source: &str, run: &Range<usize>, at: usize) -> usize {
    let mut at = at;
    while at < run.end && !source.is_char_boundary(at) {
        at += 1;
    }
    if open_entity(source, run.start, at).is_some() {
        return source[at..run.end]
            .find(';')
            .map(|i| at + i + 1)
            .unwrap_or(run.end);
    }
    at
}

/// Offset of an `&` in `from..at` whose reference is still open at `at`
fn open_entity(source: &str, from: usize, at: usize) -> Option<usize> {
    let amp = from + source[from..at].rfind('&')?;
    (!source[amp..at].contains(';')).then_some(amp)
}
