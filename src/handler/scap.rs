use super::walk::walk_elements;
use super::{ratio, DocumentHandler, Findings, Probe};
use crate::error::HandlerError;
use crate::schema::DocumentSchema;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;

const SCAP_ROOTS: &[&str] = &[
    "asset-report-collection",
    "data-stream-collection",
    "Benchmark",
    "oval_definitions",
    "oval_results",
];

/// Rules listed in structured data
const MAX_LISTED_RULES: usize = 50;

/// SCAP data streams, XCCDF benchmarks and OVAL content
pub struct ScapHandler;

#[derive(Debug, Default, Serialize)]
struct RuleRecord {
    id: Option<String>,
    severity: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Default)]
struct ScapTally {
    benchmark_title: Option<String>,
    rules: u64,
    rules_with_title: u64,
    rules_with_severity: u64,
    groups: u64,
    definitions: u64,
    rule_results: u64,
    identified: u64,
    severities: BTreeMap<String, u64>,
    results: BTreeMap<String, u64>,
    definition_classes: BTreeMap<String, u64>,
    scores: BTreeMap<String, String>,
    targets: Vec<String>,
    pending_title: Option<String>,
    listed: Vec<RuleRecord>,
}

impl ScapTally {
    fn pass_rate(&self) -> Option<f64> {
        let pass = self.results.get("pass").copied().unwrap_or(0);
        let fail = self.results.get("fail").copied().unwrap_or(0);
        (pass + fail > 0).then(|| ratio(pass, pass + fail, 0.0))
    }
}

impl DocumentHandler for ScapHandler {
    fn name(&self) -> &str {
        "scap"
    }

    fn probe(&self, schema: &DocumentSchema) -> Probe {
        let uris = schema.namespace_uris();
        let mut score = 0.0;
        if uris.iter().any(|uri| uri.contains("scap.nist.gov")) {
            score += 0.5;
        }
        if SCAP_ROOTS.contains(&schema.root_element.as_str()) {
            score += 0.3;
        }
        if uris.iter().any(|uri| {
            let uri = uri.to_lowercase();
            uri.contains("xccdf") || uri.contains("oval")
        }) {
            score += 0.2;
        }

        if score >= 0.5 {
            Probe::applicable(score)
        } else {
            Probe::not_applicable()
        }
    }

    fn analyze(&self, _schema: &DocumentSchema, path: &Path) -> Result<Findings, HandlerError> {
        let mut tally = ScapTally::default();

        walk_elements(path, |element| {
            if element.attr("id").is_some() {
                tally.identified += 1;
            }
            match (element.tag, element.parent()) {
                ("title", Some("Rule")) => tally.pending_title = element.text(),
                ("title", Some("Benchmark")) => tally.benchmark_title = element.text(),
                ("result", Some("rule-result")) => {
                    if let Some(result) = element.text() {
                        *tally.results.entry(result).or_insert(0) += 1;
                    }
                }
                ("score", Some("TestResult")) => {
                    let system = element.attr("system").unwrap_or("default").to_string();
                    tally.scores.insert(system, element.text.to_string());
                }
                ("target", Some("TestResult")) => {
                    if let Some(target) = element.text() {
                        tally.targets.push(target);
                    }
                }
                ("Rule", _) => {
                    let record = RuleRecord {
                        id: element.attr("id").map(str::to_string),
                        severity: element.attr("severity").map(str::to_string),
                        title: tally.pending_title.take(),
                    };
                    tally.rules += 1;
                    if record.title.is_some() {
                        tally.rules_with_title += 1;
                    }
                    if let Some(severity) = &record.severity {
                        tally.rules_with_severity += 1;
                        *tally.severities.entry(severity.clone()).or_insert(0) += 1;
                    }
                    if tally.listed.len() < MAX_LISTED_RULES {
                        tally.listed.push(record);
                    }
                }
                ("Group", _) => tally.groups += 1,
                ("rule-result", _) => tally.rule_results += 1,
                ("definition", _) if element.within("definitions") => {
                    tally.definitions += 1;
                    let class = element.attr("class").unwrap_or("unspecified").to_string();
                    *tally.definition_classes.entry(class).or_insert(0) += 1;
                }
                _ => {}
            }
        })?;

        if tally.rules + tally.definitions + tally.rule_results == 0 {
            return Err(HandlerError::MissingData {
                handler: self.name().to_string(),
                what: "rules, definitions or rule results".to_string(),
            });
        }

        let mut findings = Findings::new("SCAP Security Content")
            .finding("benchmark_title", json!(tally.benchmark_title))
            .finding("total_rules", json!(tally.rules))
            .finding("severity_counts", json!(tally.severities))
            .finding("rule_results", json!(tally.results))
            .finding("definition_classes", json!(tally.definition_classes))
            .finding("pass_rate", json!(tally.pass_rate()))
            .inventory("rules", tally.rules)
            .inventory("groups", tally.groups)
            .inventory("definitions", tally.definitions)
            .inventory("rule_results", tally.rule_results)
            .inventory("identified_elements", tally.identified)
            .recommendations(&[
                "Use for automated compliance monitoring",
                "Extract failed rules for remediation workflows",
                "Trend compliance scores across scans",
                "Prioritise remediation by rule severity",
            ])
            .ai_use_cases(&[
                "Automated compliance report generation",
                "Predictive risk analysis",
                "Remediation recommendation engine",
                "Security posture classification",
            ])
            .structured(json!({
                "rules": tally.listed,
                "targets": tally.targets,
                "scores": tally.scores,
            }))
            .metric("title_coverage", ratio(tally.rules_with_title, tally.rules, 1.0))
            .metric(
                "severity_coverage",
                ratio(tally.rules_with_severity, tally.rules, 1.0),
            );

        if let Some(rate) = tally.pass_rate() {
            findings = findings.metric("compliance", rate);
        }
        Ok(findings)
    }
}
