mod docbook;
mod feed;
mod generic;
mod log4j;
mod maven;
mod registry;
mod scap;
mod sitemap;
mod spring;
mod walk;

#[cfg(test)]
mod tests;

pub use docbook::DocBookHandler;
pub use feed::FeedHandler;
pub use generic::GenericHandler;
pub use log4j::Log4jHandler;
pub use maven::MavenHandler;
pub use registry::{HandlerRegistry, HandlerReport};
pub use scap::ScapHandler;
pub use sitemap::SitemapHandler;
pub use spring::SpringHandler;

use crate::error::HandlerError;
use crate::schema::DocumentSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Type-specific analysis of a classified document
pub trait DocumentHandler: Send + Sync {
    /// Stable identifier reported alongside findings
    fn name(&self) -> &str;

    /// Decide from the schema alone whether this handler applies
    fn probe(&self, schema: &DocumentSchema) -> Probe;

    /// Extract findings, re-reading the document at `path` if needed
    fn analyze(&self, schema: &DocumentSchema, path: &Path) -> Result<Findings, HandlerError>;
}

/// Applicability of a handler to one document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub applicable: bool,
    pub confidence: f64,
}

impl Probe {
    pub fn applicable(confidence: f64) -> Self {
        Self {
            applicable: true,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn not_applicable() -> Self {
        Self {
            applicable: false,
            confidence: 0.0,
        }
    }
}

/// What a handler learned about a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Findings {
    pub document_type: String,
    pub key_findings: BTreeMap<String, Value>,
    pub recommendations: Vec<String>,
    /// Counts of the notable record kinds in the document
    pub data_inventory: BTreeMap<String, u64>,
    pub ai_use_cases: Vec<String>,
    pub structured_data: Value,
    /// Scores in `[0, 1]`
    pub quality_metrics: BTreeMap<String, f64>,
}

impl Findings {
    pub fn new(document_type: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            structured_data: Value::Null,
            ..Self::default()
        }
    }

    pub fn finding(mut self, key: impl Into<String>, value: Value) -> Self {
        self.key_findings.insert(key.into(), value);
        self
    }

    pub fn inventory(mut self, kind: impl Into<String>, count: u64) -> Self {
        self.data_inventory.insert(kind.into(), count);
        self
    }

    /// Record a quality score, clamped into `[0, 1]`. NaN becomes 0.
    pub fn metric(mut self, name: impl Into<String>, score: f64) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        self.quality_metrics.insert(name.into(), score);
        self
    }

    pub fn recommendations(mut self, items: &[&str]) -> Self {
        self.recommendations = items.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn ai_use_cases(mut self, items: &[&str]) -> Self {
        self.ai_use_cases = items.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn structured(mut self, data: Value) -> Self {
        self.structured_data = data;
        self
    }
}

/// `part / whole`, or `empty` when there is nothing to measure
pub(crate) fn ratio(part: u64, whole: u64, empty: f64) -> f64 {
    if whole == 0 {
        empty
    } else {
        part as f64 / whole as f64
    }
}
