use super::{ratio, DocumentHandler, Findings, Probe};
use crate::detector::BASELINE_CONFIDENCE;
use crate::error::HandlerError;
use crate::schema::DocumentSchema;
use serde_json::json;
use std::path::Path;

const TOP_ELEMENTS: usize = 10;

/// Schema-only findings for any well-formed document
pub struct GenericHandler;

impl GenericHandler {
    /// Findings derived from the schema; never touches the file
    pub fn findings(&self, schema: &DocumentSchema) -> Findings {
        let stats = &schema.statistics;
        let top = schema.top_elements(TOP_ELEMENTS);
        let unique = schema.elements.len() as u64;
        let with_text = schema.elements.values().filter(|e| e.has_text()).count() as u64;
        let with_attributes = schema
            .elements
            .values()
            .filter(|e| !e.attributes.is_empty())
            .count() as u64;

        let attributes: serde_json::Map<String, serde_json::Value> = top
            .iter()
            .map(|e| (e.tag.clone(), json!(e.attribute_names())))
            .collect();

        let mut findings = Findings::new(schema.document_type.clone())
            .finding("root_element", json!(schema.root_element))
            .finding("total_elements", json!(stats.total_elements))
            .finding("unique_elements", json!(stats.unique_elements))
            .finding("max_depth", json!(stats.max_depth))
            .finding("namespaces", json!(schema.namespaces))
            .finding(
                "top_elements",
                json!(top
                    .iter()
                    .map(|e| json!({"tag": e.tag, "count": e.occurrence_count}))
                    .collect::<Vec<_>>()),
            )
            .recommendations(&[
                "Review the most frequent elements as candidate records",
                "Map text-bearing elements to fields for extraction",
                "Register a specialised handler if this document type recurs",
            ])
            .ai_use_cases(&[
                "Schema-guided information extraction",
                "Document summarisation",
                "Semantic search over chunked content",
            ])
            .structured(json!({
                "sample_paths": schema.sample_paths,
                "attributes": attributes,
            }))
            .metric("text_coverage", ratio(with_text, unique, 0.0))
            .metric("attribute_coverage", ratio(with_attributes, unique, 0.0));

        for element in &top {
            findings = findings.inventory(element.tag.clone(), element.occurrence_count);
        }
        findings
    }
}

impl DocumentHandler for GenericHandler {
    fn name(&self) -> &str {
        "generic"
    }

    fn probe(&self, _schema: &DocumentSchema) -> Probe {
        Probe::applicable(BASELINE_CONFIDENCE)
    }

    fn analyze(&self, schema: &DocumentSchema, _path: &Path) -> Result<Findings, HandlerError> {
        Ok(self.findings(schema))
    }
}
