//! Human and LLM readable renderings of a schema.

use crate::detector::DocumentTypeDetector;
use crate::schema::DocumentSchema;
use serde::{Deserialize, Serialize};

const TOP_ELEMENTS: usize = 10;
const SAMPLE_PREVIEW_CHARS: usize = 50;

/// Suggested way to process documents of one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStrategy {
    pub approach: String,
    pub key_elements: Vec<String>,
    pub extraction_pattern: String,
}

impl ProcessingStrategy {
    fn new(approach: &str, key_elements: &[&str], extraction_pattern: &str) -> Self {
        Self {
            approach: approach.to_string(),
            key_elements: key_elements.iter().map(|s| s.to_string()).collect(),
            extraction_pattern: extraction_pattern.to_string(),
        }
    }
}

/// Compact multi-line summary of a schema
pub fn schema_description(schema: &DocumentSchema) -> String {
    let stats = &schema.statistics;
    let detector = DocumentTypeDetector::default();
    let description = detector
        .describe(&schema.document_type)
        .unwrap_or("Generic XML document");

    let mut out = String::new();
    out.push_str(&format!(
        "Document type: {} ({}), confidence {:.2}\n",
        schema.document_type, description, schema.confidence
    ));
    out.push_str(&format!("Root element: {}\n", schema.root_element));
    out.push_str(&format!(
        "Elements: {} total, {} unique, max depth {}\n",
        stats.total_elements, stats.unique_elements, stats.max_depth
    ));
    out.push_str(&format!(
        "File size: {:.2} MB\n",
        stats.file_size_bytes as f64 / (1024.0 * 1024.0)
    ));

    if !schema.namespaces.is_empty() {
        out.push_str("Namespaces:\n");
        for (prefix, uri) in &schema.namespaces {
            out.push_str(&format!("  {}: {}\n", prefix, uri));
        }
    }

    if !schema.sample_paths.is_empty() {
        out.push_str("Sample paths:\n");
        for path in &schema.sample_paths {
            out.push_str(&format!("  {}\n", path));
        }
    }

    out.push_str("Top elements:\n");
    for element in schema.top_elements(TOP_ELEMENTS) {
        let attributes = if element.attributes.is_empty() {
            "no attrs".to_string()
        } else {
            format!("attrs: {}", element.attribute_names().join(", "))
        };
        let children = if element.child_tags.is_empty() {
            "leaf".to_string()
        } else {
            format!("{} children", element.child_tags.len())
        };
        out.push_str(&format!(
            "  {}: {} occurrences [{}] [{}]\n",
            element.tag, element.occurrence_count, attributes, children
        ));
        if let Some(sample) = element.text_samples.first() {
            let preview: String = sample.chars().take(SAMPLE_PREVIEW_CHARS).collect();
            out.push_str(&format!("    sample: \"{}\"\n", preview));
        }
    }

    let tree = serde_json::to_string_pretty(&schema.structure_tree)
        .unwrap_or_else(|_| "{}".to_string());
    out.push_str("Structure:\n");
    out.push_str(&tree);
    out.push('\n');
    out
}

/// Processing suggestion for the schema's detected type
pub fn processing_strategy(schema: &DocumentSchema) -> ProcessingStrategy {
    match schema.document_type.as_str() {
        "SCAP" => ProcessingStrategy::new(
            "Security-focused analysis",
            &["Rule", "check", "TestResult", "rule-result"],
            "Extract compliance status and security findings",
        ),
        "XCCDF" => ProcessingStrategy::new(
            "Checklist processing",
            &["Rule", "select", "check"],
            "Extract security configuration requirements",
        ),
        "OVAL" => ProcessingStrategy::new(
            "Vulnerability assessment",
            &["definition", "test", "object", "state"],
            "Extract vulnerability definitions and test criteria",
        ),
        "SITEMAP" => ProcessingStrategy::new(
            "URL inventory",
            &["url", "loc", "lastmod"],
            "Extract URLs with their update metadata",
        ),
        "MAVEN_POM" => ProcessingStrategy::new(
            "Build dependency analysis",
            &["dependency", "plugin", "properties"],
            "Extract project coordinates and dependencies",
        ),
        "LOG4J" => ProcessingStrategy::new(
            "Logging configuration review",
            &["appender", "logger", "level", "Appenders", "Loggers"],
            "Extract appenders, logger levels and risky patterns",
        ),
        "SPRING" => ProcessingStrategy::new(
            "Dependency injection mapping",
            &["bean", "property", "import", "component-scan"],
            "Extract bean definitions, profiles and property sources",
        ),
        "DOCBOOK" => ProcessingStrategy::new(
            "Documentation structure extraction",
            &["chapter", "section", "title", "para"],
            "Extract the outline, metadata and code listings",
        ),
        "RSS" => ProcessingStrategy::new(
            "Feed item extraction",
            &["item", "entry", "title", "link"],
            "Extract items with titles, links and dates",
        ),
        _ => ProcessingStrategy {
            approach: "General XML processing".to_string(),
            key_elements: schema
                .top_elements(5)
                .iter()
                .map(|e| e.tag.clone())
                .collect(),
            extraction_pattern: "Extract structured data based on element hierarchy".to_string(),
        },
    }
}
