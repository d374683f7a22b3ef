use super::profile::{DocumentSchema, ElementProfile, SchemaStatistics, GENERIC_DOCUMENT_TYPE};
use super::tree::build_structure_tree;
use crate::config::SchemaConfig;
use crate::error::AnalysisError;
use crate::reader::{EventReader, SpannedEvent, XmlEvent};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Paths at or above this depth are eligible for `sample_paths`
const SAMPLE_PATH_MAX_DEPTH: usize = 3;

/// Single-pass builder of a [`DocumentSchema`].
///
/// Holds all per-document state, so one instance must be used for exactly
/// one document. Memory is bounded by the number of distinct tags: samples,
/// paths and pending text are all capped by [`SchemaConfig`].
pub struct SchemaAccumulator {
    config: SchemaConfig,
    elements: BTreeMap<String, ElementProfile>,
    namespaces: BTreeMap<String, String>,
    stack: Vec<OpenElement>,
    root: Option<String>,
    max_depth: usize,
    total_elements: u64,
    sample_paths: Vec<String>,
}

struct OpenElement {
    tag: String,
    path: String,
    text: TextBuffer,
}

/// Direct text of one open element, kept only until a sample can be cut
#[derive(Default)]
struct TextBuffer {
    text: String,
    full: bool,
}

impl TextBuffer {
    fn push(&mut self, chunk: &str, limit: usize) {
        if self.full {
            return;
        }
        self.text.push_str(chunk);
        let content = self.text.trim_start();
        if content.is_empty() {
            self.text.clear();
        } else if content.chars().count() >= limit {
            self.full = true;
        }
    }
}

impl SchemaAccumulator {
    pub fn new(config: SchemaConfig) -> Self {
        Self {
            config,
            elements: BTreeMap::new(),
            namespaces: BTreeMap::new(),
            stack: Vec::new(),
            root: None,
            max_depth: 0,
            total_elements: 0,
            sample_paths: Vec::new(),
        }
    }

    /// Profile a file in one streaming pass.
    ///
    /// The file is closed before returning, on success and on error.
    pub fn analyze_path(
        path: impl AsRef<Path>,
        config: &SchemaConfig,
    ) -> Result<DocumentSchema, AnalysisError> {
        let path = path.as_ref();
        let io_error = |source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;
        let file_size = file.metadata().map_err(io_error)?.len();

        let reader = EventReader::new(BufReader::new(file), path);
        Self::new(config.clone()).consume(reader, file_size)
    }

    /// Profile an in-memory document; `path` is only used in errors
    pub fn analyze_bytes(
        bytes: &[u8],
        path: impl AsRef<Path>,
        config: &SchemaConfig,
    ) -> Result<DocumentSchema, AnalysisError> {
        let reader = EventReader::from_bytes(bytes, path);
        Self::new(config.clone()).consume(reader, bytes.len() as u64)
    }

    /// Drain an event stream and build the schema. Any parse error aborts
    /// without returning partial results.
    pub fn consume<R: BufRead>(
        mut self,
        reader: EventReader<R>,
        file_size_bytes: u64,
    ) -> Result<DocumentSchema, AnalysisError> {
        for event in reader {
            self.observe(&event?);
        }
        self.finish(file_size_bytes)
    }

    /// Fold one event into the tables
    pub fn observe(&mut self, event: &SpannedEvent) {
        match &event.event {
            XmlEvent::StartNamespace { prefix, uri } => self.declare_namespace(prefix.as_deref(), uri),
            XmlEvent::StartElement {
                name,
                namespace_uri,
                attributes,
                ..
            } => {
                self.start_element(name, namespace_uri.as_deref(), event.line);
                for attribute in attributes {
                    self.sample_attribute(name, &attribute.name, &attribute.value);
                }
            }
            XmlEvent::Characters(text) => self.characters(text),
            XmlEvent::EndElement { .. } => self.end_element(),
        }
    }

    fn declare_namespace(&mut self, prefix: Option<&str>, uri: &str) {
        let key = prefix.unwrap_or("default");
        match self.namespaces.entry(key.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(uri.to_string());
            }
            Entry::Occupied(entry) => {
                if entry.get() != uri {
                    debug!(
                        "Prefix '{}' rebound to {} (keeping {})",
                        key,
                        uri,
                        entry.get()
                    );
                }
            }
        }
    }

    fn start_element(&mut self, tag: &str, namespace_uri: Option<&str>, line: u64) {
        let depth = self.stack.len();
        self.max_depth = self.max_depth.max(depth);
        self.total_elements += 1;
        if self.root.is_none() {
            self.root = Some(tag.to_string());
        }

        let path = match self.stack.last() {
            Some(parent) => format!("{}/{}", parent.path, tag),
            None => format!("/{}", tag),
        };

        if depth <= SAMPLE_PATH_MAX_DEPTH
            && self.sample_paths.len() < self.config.max_sample_paths
            && !self.sample_paths.contains(&path)
        {
            self.sample_paths.push(path.clone());
        }

        let max_paths = self.config.max_paths_per_tag;
        let profile = self
            .elements
            .entry(tag.to_string())
            .or_insert_with(|| ElementProfile::new(tag));
        profile.occurrence_count += 1;
        profile.depths.insert(depth);
        if profile.first_line == 0 {
            profile.first_line = line;
        }
        if profile.namespace_uri.is_none() {
            profile.namespace_uri = namespace_uri.map(str::to_string);
        }
        if profile.paths.len() < max_paths && !profile.paths.contains(&path) {
            profile.paths.push(path.clone());
        }

        if let Some(parent) = self.stack.last() {
            let parent_tag = parent.tag.clone();
            profile.parent_tags.insert(parent_tag.clone());
            if let Some(parent_profile) = self.elements.get_mut(&parent_tag) {
                parent_profile.child_tags.insert(tag.to_string());
            }
        }

        self.stack.push(OpenElement {
            tag: tag.to_string(),
            path,
            text: TextBuffer::default(),
        });
    }

    fn sample_attribute(&mut self, tag: &str, name: &str, value: &str) {
        let max_samples = self.config.max_samples_per_tag;
        let value = truncate_chars(value, self.config.max_attribute_value_length);
        if let Some(profile) = self.elements.get_mut(tag) {
            let values = profile.attributes.entry(name.to_string()).or_default();
            if values.len() < max_samples && !values.contains(&value) {
                values.push(value);
            }
        }
    }

    fn characters(&mut self, text: &str) {
        let limit = self.config.max_sample_text_length;
        let max_samples = self.config.max_samples_per_tag;
        let Some(open) = self.stack.last_mut() else {
            return;
        };
        let wants_sample = self
            .elements
            .get(&open.tag)
            .map(|p| p.text_samples.len() < max_samples)
            .unwrap_or(false);
        if wants_sample {
            open.text.push(text, limit);
        }
    }

    fn end_element(&mut self) {
        let Some(open) = self.stack.pop() else {
            return;
        };
        let text = open.text.text.trim();
        if text.is_empty() {
            return;
        }
        let max_samples = self.config.max_samples_per_tag;
        let sample = truncate_chars(text, self.config.max_sample_text_length);
        if let Some(profile) = self.elements.get_mut(&open.tag) {
            if profile.text_samples.len() < max_samples {
                profile.text_samples.push(sample);
            }
        }
    }

    /// Close the pass: compute statistics and the structure tree
    pub fn finish(self, file_size_bytes: u64) -> Result<DocumentSchema, AnalysisError> {
        let Some(root) = self.root else {
            return Err(AnalysisError::Structure {
                message: "no root element was observed".to_string(),
            });
        };
        if let Some(open) = self.stack.last() {
            return Err(AnalysisError::Structure {
                message: format!("<{}> was never closed", open.tag),
            });
        }

        let structure_tree = build_structure_tree(
            &root,
            &self.elements,
            self.max_depth,
            self.config.max_tree_nodes,
        )?;

        let statistics = SchemaStatistics {
            total_elements: self.total_elements,
            unique_elements: self.elements.len(),
            max_depth: self.max_depth,
            namespace_count: self.namespaces.len(),
            file_size_bytes,
        };

        Ok(DocumentSchema {
            root_element: root,
            namespaces: self.namespaces,
            elements: self.elements,
            structure_tree,
            statistics,
            sample_paths: self.sample_paths,
            document_type: GENERIC_DOCUMENT_TYPE.to_string(),
            confidence: 0.0,
        })
    }
}

/// First `limit` characters of `text`
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}
