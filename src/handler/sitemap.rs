use super::walk::walk_elements;
use super::{ratio, DocumentHandler, Findings, Probe};
use crate::error::HandlerError;
use crate::schema::DocumentSchema;
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const SITEMAP_NAMESPACE: &str = "sitemaps.org/schemas/sitemap";
const MAX_LISTED_ENTRIES: usize = 100;

/// XML sitemaps and sitemap indexes
pub struct SitemapHandler;

#[derive(Debug, Default, Clone, Serialize)]
struct Entry {
    #[serde(skip_serializing_if = "Option::is_none")]
    loc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lastmod: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    changefreq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<String>,
}

#[derive(Debug, Default)]
struct SitemapTally {
    entries: u64,
    pending: Entry,
    listed: Vec<Entry>,
    priorities: BTreeMap<String, u64>,
    change_frequencies: BTreeMap<String, u64>,
    lastmod_count: u64,
    latest: Option<String>,
    oldest: Option<String>,
    domains: BTreeSet<String>,
    depth_levels: BTreeMap<usize, u64>,
}

impl SitemapTally {
    fn close_entry(&mut self) {
        let entry = std::mem::take(&mut self.pending);
        self.entries += 1;
        if let Some(priority) = &entry.priority {
            *self.priorities.entry(priority.clone()).or_insert(0) += 1;
        }
        if let Some(freq) = &entry.changefreq {
            *self.change_frequencies.entry(freq.clone()).or_insert(0) += 1;
        }
        if let Some(lastmod) = &entry.lastmod {
            self.observe_lastmod(lastmod);
        }
        if let Some(loc) = &entry.loc {
            if let Some((_, rest)) = loc.split_once("://") {
                let domain = rest.split('/').next().unwrap_or(rest);
                self.domains.insert(domain.to_string());
                *self.depth_levels.entry(rest.matches('/').count()).or_insert(0) += 1;
            }
        }
        if self.listed.len() < MAX_LISTED_ENTRIES {
            self.listed.push(entry);
        }
    }

    // W3C datetimes of one precision order lexicographically
    fn observe_lastmod(&mut self, lastmod: &str) {
        self.lastmod_count += 1;
        if self.latest.as_deref().map_or(true, |latest| lastmod > latest) {
            self.latest = Some(lastmod.to_string());
        }
        if self.oldest.as_deref().map_or(true, |oldest| lastmod < oldest) {
            self.oldest = Some(lastmod.to_string());
        }
    }

    fn last_modified(&self) -> serde_json::Value {
        json!({
            "count": self.lastmod_count,
            "latest": self.latest,
            "oldest": self.oldest,
        })
    }
}

impl DocumentHandler for SitemapHandler {
    fn name(&self) -> &str {
        "sitemap"
    }

    fn probe(&self, schema: &DocumentSchema) -> Probe {
        if schema
            .namespace_uris()
            .iter()
            .any(|uri| uri.contains(SITEMAP_NAMESPACE))
        {
            Probe::applicable(1.0)
        } else if matches!(schema.root_element.as_str(), "urlset" | "sitemapindex") {
            Probe::applicable(0.8)
        } else {
            Probe::not_applicable()
        }
    }

    fn analyze(&self, schema: &DocumentSchema, path: &Path) -> Result<Findings, HandlerError> {
        let is_index = schema.root_element == "sitemapindex";
        let record = if is_index { "sitemap" } else { "url" };
        let mut tally = SitemapTally::default();

        walk_elements(path, |element| {
            if element.parent() == Some(record) {
                let value = element.text();
                match element.tag {
                    "loc" => tally.pending.loc = value,
                    "lastmod" => tally.pending.lastmod = value,
                    "changefreq" => tally.pending.changefreq = value,
                    "priority" => tally.pending.priority = value,
                    _ => {}
                }
            } else if element.tag == record {
                tally.close_entry();
            }
        })?;

        let kind = if is_index { "sitemaps" } else { "urls" };
        let mut listing = serde_json::Map::new();
        listing.insert(kind.to_string(), json!(tally.listed));
        let listing = serde_json::Value::Object(listing);
        let findings = Findings::new(if is_index {
            "XML Sitemap Index"
        } else {
            "XML Sitemap"
        })
        .finding(format!("{}_count", record), json!(tally.entries))
        .finding("last_modified", tally.last_modified())
        .finding("priorities", json!(tally.priorities))
        .finding("change_frequencies", json!(tally.change_frequencies))
        .finding(
            "url_patterns",
            json!({"domains": tally.domains, "depth_levels": tally.depth_levels}),
        )
        .inventory(kind, tally.entries)
        .recommendations(&[
            "Validate URLs for accessibility",
            "Check for outdated or broken links",
            "Analyze URL patterns for SEO optimization",
            "Compare change frequencies with actual updates",
        ])
        .ai_use_cases(&[
            "SEO health monitoring",
            "Content update pattern analysis",
            "Website structure visualization",
            "Broken link detection",
        ])
        .structured(listing);

        let priority = tally.priorities.values().sum::<u64>();
        let changefreq = tally.change_frequencies.values().sum::<u64>();
        let completeness = ratio(priority, tally.entries, 0.0) * 0.3
            + ratio(changefreq, tally.entries, 0.0) * 0.3
            + ratio(tally.lastmod_count, tally.entries, 0.0) * 0.4;

        Ok(findings
            .metric("completeness", completeness)
            .metric(
                "structure_diversity",
                tally.depth_levels.len() as f64 / 5.0,
            ))
    }
}
