use super::tree::StructureNode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Type label used before classification and when no pattern matches
pub const GENERIC_DOCUMENT_TYPE: &str = "GENERIC_XML";

/// Everything observed about one distinct tag name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementProfile {
    /// Local name, prefix stripped
    pub tag: String,
    /// First namespace URI this tag resolved to
    pub namespace_uri: Option<String>,
    pub occurrence_count: u64,
    /// Nesting depths this tag occurred at (root = 0)
    pub depths: BTreeSet<usize>,
    /// Attribute local name -> first distinct sampled values
    pub attributes: BTreeMap<String, Vec<String>>,
    /// First non-empty text contents, trimmed and truncated
    pub text_samples: Vec<String>,
    pub parent_tags: BTreeSet<String>,
    pub child_tags: BTreeSet<String>,
    /// First distinct root-to-node paths, e.g. `/catalog/book/title`
    pub paths: Vec<String>,
    /// 1-based line of the first occurrence
    pub first_line: u64,
}

impl ElementProfile {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            namespace_uri: None,
            occurrence_count: 0,
            depths: BTreeSet::new(),
            attributes: BTreeMap::new(),
            text_samples: Vec::new(),
            parent_tags: BTreeSet::new(),
            child_tags: BTreeSet::new(),
            paths: Vec::new(),
            first_line: 0,
        }
    }

    /// Shallowest depth this tag was seen at
    pub fn min_depth(&self) -> Option<usize> {
        self.depths.iter().next().copied()
    }

    pub fn has_text(&self) -> bool {
        !self.text_samples.is_empty()
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes.keys().cloned().collect()
    }
}

/// Whole-document counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaStatistics {
    /// Element instances; always the sum of every profile's count
    pub total_elements: u64,
    pub unique_elements: usize,
    pub max_depth: usize,
    pub namespace_count: usize,
    pub file_size_bytes: u64,
}

/// Structural profile of one XML document.
///
/// Built once by a single pass of a
/// [`SchemaAccumulator`](super::SchemaAccumulator); the only later change is
/// [`DocumentSchema::classified`], which records the detected document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSchema {
    pub root_element: String,
    /// Prefix -> URI; the unprefixed default namespace is keyed `"default"`
    pub namespaces: BTreeMap<String, String>,
    pub elements: BTreeMap<String, ElementProfile>,
    /// Nested summary keyed by the root element
    pub structure_tree: BTreeMap<String, StructureNode>,
    pub statistics: SchemaStatistics,
    /// Distinct paths at depth <= 3, in document order
    pub sample_paths: Vec<String>,
    pub document_type: String,
    pub confidence: f64,
}

impl DocumentSchema {
    /// Record the detected type and confidence
    pub fn classified(mut self, document_type: impl Into<String>, confidence: f64) -> Self {
        self.document_type = document_type.into();
        self.confidence = confidence;
        self
    }

    pub fn element(&self, tag: &str) -> Option<&ElementProfile> {
        self.elements.get(tag)
    }

    /// Every namespace URI seen, from declarations and resolved elements
    pub fn namespace_uris(&self) -> BTreeSet<&str> {
        self.namespaces
            .values()
            .map(String::as_str)
            .chain(
                self.elements
                    .values()
                    .filter_map(|e| e.namespace_uri.as_deref()),
            )
            .collect()
    }

    /// Most frequent tags, ties broken by tag name
    pub fn top_elements(&self, limit: usize) -> Vec<&ElementProfile> {
        let mut elements: Vec<&ElementProfile> = self.elements.values().collect();
        elements.sort_by(|a, b| {
            b.occurrence_count
                .cmp(&a.occurrence_count)
                .then_with(|| a.tag.cmp(&b.tag))
        });
        elements.truncate(limit);
        elements
    }
}
