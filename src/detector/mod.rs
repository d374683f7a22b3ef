//! Best-fit document type classification.
//!
//! Patterns are scored in registration order and the first pattern with the
//! highest score wins. Registration order is therefore part of the contract:
//! register more specific patterns before broader ones that may tie with them.

mod patterns;

#[cfg(test)]
mod tests;

pub use patterns::{builtin_patterns, DocumentPattern};

use crate::schema::{DocumentSchema, GENERIC_DOCUMENT_TYPE};
use serde::{Deserialize, Serialize};

/// Score for an exact root element match
pub const ROOT_MATCH_WEIGHT: f64 = 0.7;
/// Score per distinct namespace URI matching a pattern substring
pub const NAMESPACE_MATCH_WEIGHT: f64 = 0.2;
/// Upper bound on the namespace part of a score
pub const NAMESPACE_WEIGHT_CAP: f64 = 0.3;
/// Scores at or below this fall back to the generic type
pub const MIN_CONFIDENCE: f64 = 0.15;
/// Confidence reported for the generic fallback
pub const BASELINE_CONFIDENCE: f64 = 0.1;

/// Outcome of classifying one schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub document_type: String,
    pub description: String,
    pub confidence: f64,
}

impl Detection {
    fn generic() -> Self {
        Self {
            document_type: GENERIC_DOCUMENT_TYPE.to_string(),
            description: "Generic XML document".to_string(),
            confidence: BASELINE_CONFIDENCE,
        }
    }

    pub fn is_generic(&self) -> bool {
        self.document_type == GENERIC_DOCUMENT_TYPE
    }
}

/// Ordered registry of [`DocumentPattern`]s
#[derive(Debug, Clone)]
pub struct DocumentTypeDetector {
    patterns: Vec<DocumentPattern>,
}

impl DocumentTypeDetector {
    /// Detector with the built-in patterns
    pub fn new() -> Self {
        Self {
            patterns: builtin_patterns(),
        }
    }

    /// Detector with no patterns; everything classifies as generic
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Append a pattern. It loses ties against every earlier pattern.
    pub fn register(&mut self, pattern: DocumentPattern) {
        self.patterns.push(pattern);
    }

    pub fn patterns(&self) -> &[DocumentPattern] {
        &self.patterns
    }

    /// Description of a registered type, if known
    pub fn describe(&self, document_type: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.name == document_type)
            .map(|p| p.description.as_str())
    }

    /// Score one pattern against a schema
    pub fn score(pattern: &DocumentPattern, schema: &DocumentSchema) -> f64 {
        let mut score = 0.0;
        if pattern.matches_root(&schema.root_element) {
            score += ROOT_MATCH_WEIGHT;
        }

        let matching_uris = schema
            .namespace_uris()
            .into_iter()
            .filter(|uri| pattern.matches_namespace(uri))
            .count();
        score += (matching_uris as f64 * NAMESPACE_MATCH_WEIGHT).min(NAMESPACE_WEIGHT_CAP);

        score
    }

    /// Pick the best-scoring pattern, earliest registered on ties
    pub fn detect(&self, schema: &DocumentSchema) -> Detection {
        let mut best: Option<(&DocumentPattern, f64)> = None;
        for pattern in &self.patterns {
            let score = Self::score(pattern, schema);
            // Strict comparison keeps the earlier pattern on ties
            if best.map(|(_, top)| score > top).unwrap_or(true) {
                best = Some((pattern, score));
            }
        }

        match best {
            Some((pattern, score)) if score > MIN_CONFIDENCE => Detection {
                document_type: pattern.name.clone(),
                description: pattern.description.clone(),
                confidence: score.min(1.0),
            },
            _ => Detection::generic(),
        }
    }

    /// Classify and record the result on the schema
    pub fn classify(&self, schema: DocumentSchema) -> (DocumentSchema, Detection) {
        let detection = self.detect(&schema);
        let schema = schema.classified(detection.document_type.clone(), detection.confidence);
        (schema, detection)
    }
}

impl Default for DocumentTypeDetector {
    fn default() -> Self {
        Self::new()
    }
}
