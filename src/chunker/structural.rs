use super::types::{chunk_id, DocumentChunk, LineTracker};
use crate::config::ChunkingConfig;
use crate::error::AnalysisError;
use crate::reader::{EventReader, XmlEvent};
use std::collections::BTreeSet;
use std::path::Path;

/// Start tag seen in the pending buffer
struct OpenedTag {
    offset: usize,
    tag: String,
    path: String,
}

/// Splits a document at major element boundaries.
///
/// Events are consumed in document order. Cuts only ever fall on event
/// span boundaries, so no chunk begins or ends inside markup.
pub(crate) struct StructuralSplitter<'a> {
    source: &'a str,
    config: &'a ChunkingConfig,
    majors: &'a BTreeSet<String>,
    chunks: Vec<DocumentChunk>,
    lines: LineTracker<'a>,
    chunk_start: usize,
    /// Enclosing path at `chunk_start`
    start_path: String,
    /// Start tags inside `chunk_start..`
    opened: Vec<OpenedTag>,
    /// Local names of open elements
    stack: Vec<String>,
    /// Latest offset directly after an end tag, with the path enclosing it
    close_cut: Option<(usize, String)>,
}

impl<'a> StructuralSplitter<'a> {
    pub(crate) fn new(
        source: &'a str,
        config: &'a ChunkingConfig,
        majors: &'a BTreeSet<String>,
    ) -> Self {
        Self {
            source,
            config,
            majors,
            chunks: Vec::new(),
            lines: LineTracker::new(source.as_bytes()),
            chunk_start: 0,
            start_path: "/".to_string(),
            opened: Vec::new(),
            stack: Vec::new(),
            close_cut: None,
        }
    }

    pub(crate) fn split(mut self, path: &Path) -> Result<Vec<DocumentChunk>, AnalysisError> {
        let mut reader = EventReader::from_bytes(self.source.as_bytes(), path);
        let mut last_end = 0;

        while let Some(spanned) = reader.next_event()? {
            let start = spanned.span.start as usize;
            let end = spanned.span.end as usize;

            if let XmlEvent::StartElement { name, .. } = &spanned.event {
                if self.majors.contains(name)
                    && start - self.chunk_start > self.config.min_chunk_size
                {
                    let path = self.current_path();
                    self.flush(start, path);
                }
            }

            if end - self.chunk_start > self.config.max_chunk_size && start > self.chunk_start {
                match self.close_cut.clone() {
                    Some((cut, path))
                        if cut > self.chunk_start && end - cut <= self.config.max_chunk_size =>
                    {
                        self.flush(cut, path)
                    }
                    _ => {
                        let path = self.current_path();
                        self.flush(start, path);
                    }
                }
            }

            match spanned.event {
                XmlEvent::StartElement { name, .. } => {
                    self.stack.push(name.clone());
                    let path = self.current_path();
                    self.opened.push(OpenedTag {
                        offset: start,
                        tag: name,
                        path,
                    });
                }
                XmlEvent::EndElement { .. } => {
                    self.stack.pop();
                    self.close_cut = Some((end, self.current_path()));
                }
                XmlEvent::Characters(_) | XmlEvent::StartNamespace { .. } => {}
            }

            // Only reachable when the event alone exceeds the limit
            if end - self.chunk_start > self.config.max_chunk_size {
                let path = self.current_path();
                self.flush(end, path);
            }
            last_end = end;
        }

        // Markup after the root end tag has no events to cut at. It joins the
        // last chunk when that fits, and is emitted whole otherwise.
        let len = self.source.len();
        if len - self.chunk_start > self.config.max_chunk_size && last_end > self.chunk_start {
            self.flush(last_end, "/".to_string());
        }
        self.flush(len, "/".to_string());

        Ok(self.chunks)
    }

    fn current_path(&self) -> String {
        format!("/{}", self.stack.join("/"))
    }

    /// Emit `chunk_start..cut` as a chunk; `next_path` encloses `cut`
    fn flush(&mut self, cut: usize, next_path: String) {
        if cut <= self.chunk_start {
            return;
        }

        let split_at = self.opened.partition_point(|t| t.offset < cut);
        let remaining = self.opened.split_off(split_at);
        let contained = std::mem::replace(&mut self.opened, remaining);

        let element_path = contained
            .first()
            .map(|t| t.path.clone())
            .unwrap_or_else(|| self.start_path.clone());
        let mut elements_contained: Vec<String> = contained.into_iter().map(|t| t.tag).collect();
        if elements_contained.is_empty() {
            if let Some(enclosing) = self.start_path.rsplit('/').next().filter(|s| !s.is_empty()) {
                elements_contained.push(enclosing.to_string());
            }
        }

        let index = self.chunks.len();
        let content = self.source[self.chunk_start..cut].to_string();
        let summary = summarize(&element_path, &elements_contained);
        self.chunks.push(DocumentChunk {
            id: chunk_id(&content),
            index,
            element_path,
            line_range: self.lines.range(self.chunk_start, cut),
            byte_range: (self.chunk_start as u64, cut as u64),
            size_bytes: content.len(),
            overlap_bytes: 0,
            elements_contained,
            summary,
            content,
        });

        self.chunk_start = cut;
        self.start_path = next_path;
        if matches!(self.close_cut, Some((offset, _)) if offset <= cut) {
            self.close_cut = None;
        }
    }
}

fn summarize(element_path: &str, elements: &[String]) -> String {
    let distinct: BTreeSet<&str> = elements.iter().map(String::as_str).collect();
    match distinct.len() {
        0 => format!("Content under {}", element_path),
        1 => format!(
            "{} element(s) <{}> at {}",
            elements.len(),
            elements[0],
            element_path
        ),
        n => format!(
            "{} elements ({} distinct) starting at {}",
            elements.len(),
            n,
            element_path
        ),
    }
}
