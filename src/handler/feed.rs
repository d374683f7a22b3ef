use super::walk::{walk_elements, ClosedElement};
use super::{ratio, DocumentHandler, Findings, Probe};
use crate::error::HandlerError;
use crate::schema::DocumentSchema;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";
const MAX_LISTED_ITEMS: usize = 50;

/// RSS 2.0, RSS 1.0 (RDF) and Atom feeds
pub struct FeedHandler;

#[derive(Debug, Default, Serialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    published: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    categories: Vec<String>,
}

impl Item {
    fn is_complete(&self) -> bool {
        self.title.is_some() && self.link.is_some() && self.published.is_some()
    }
}

#[derive(Debug, Default)]
struct FeedTally {
    title: Option<String>,
    description: Option<String>,
    has_channel: bool,
    items: u64,
    complete_items: u64,
    pending: Item,
    listed: Vec<Item>,
    categories: BTreeMap<String, u64>,
    authors: BTreeMap<String, u64>,
    parsed_dates: u64,
    unparsed_dates: u64,
    latest: Option<DateTime<FixedOffset>>,
    oldest: Option<DateTime<FixedOffset>>,
}

fn is_item(tag: &str) -> bool {
    tag == "item" || tag == "entry"
}

/// RSS uses RFC 2822 dates, Atom uses RFC 3339
fn parse_date(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(text)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .ok()
}

impl FeedTally {
    fn observe(&mut self, element: &ClosedElement<'_>) {
        match element.parent() {
            Some(parent) if is_item(parent) => self.observe_item_field(element),
            Some("author") if element.tag == "name" => {
                if let Some(name) = element.text() {
                    *self.authors.entry(name).or_insert(0) += 1;
                }
            }
            Some("channel") | Some("feed") => match element.tag {
                "title" => self.title = element.text(),
                "description" | "subtitle" => self.description = element.text(),
                _ => {}
            },
            _ => {}
        }

        match element.tag {
            "channel" => self.has_channel = true,
            tag if is_item(tag) => self.close_item(),
            _ => {}
        }
    }

    fn observe_item_field(&mut self, element: &ClosedElement<'_>) {
        match element.tag {
            "title" => self.pending.title = element.text(),
            // Atom links carry the target in `href`
            "link" => {
                self.pending.link = element
                    .attr("href")
                    .map(str::to_string)
                    .or_else(|| element.text())
            }
            "pubDate" | "published" | "updated" | "date" => {
                if self.pending.published.is_none() {
                    self.pending.published = element.text();
                }
            }
            "category" | "subject" => {
                if let Some(category) = element.attr("term").map(str::to_string).or_else(|| element.text()) {
                    self.pending.categories.push(category);
                }
            }
            "author" | "creator" => {
                if let Some(author) = element.text() {
                    *self.authors.entry(author).or_insert(0) += 1;
                }
            }
            _ => {}
        }
    }

    fn close_item(&mut self) {
        let item = std::mem::take(&mut self.pending);
        self.items += 1;
        if item.is_complete() {
            self.complete_items += 1;
        }
        for category in &item.categories {
            *self.categories.entry(category.clone()).or_insert(0) += 1;
        }
        if let Some(published) = &item.published {
            match parse_date(published) {
                Some(date) => self.observe_date(date),
                None => self.unparsed_dates += 1,
            }
        }
        if self.listed.len() < MAX_LISTED_ITEMS {
            self.listed.push(item);
        }
    }

    fn observe_date(&mut self, date: DateTime<FixedOffset>) {
        self.parsed_dates += 1;
        self.latest = Some(self.latest.map_or(date, |latest| latest.max(date)));
        self.oldest = Some(self.oldest.map_or(date, |oldest| oldest.min(date)));
    }
}

impl DocumentHandler for FeedHandler {
    fn name(&self) -> &str {
        "feed"
    }

    fn probe(&self, schema: &DocumentSchema) -> Probe {
        let uris = schema.namespace_uris();
        match schema.root_element.as_str() {
            "rss" => Probe::applicable(0.9),
            "feed" if uris.contains(ATOM_NAMESPACE) => Probe::applicable(0.9),
            "feed" => Probe::applicable(0.6),
            "RDF" if uris.iter().any(|uri| uri.contains("purl.org/rss")) => {
                Probe::applicable(0.8)
            }
            _ => Probe::not_applicable(),
        }
    }

    fn analyze(&self, schema: &DocumentSchema, path: &Path) -> Result<Findings, HandlerError> {
        let mut tally = FeedTally::default();
        walk_elements(path, |element| tally.observe(element))?;

        if schema.root_element == "rss" && !tally.has_channel {
            return Err(HandlerError::MissingData {
                handler: self.name().to_string(),
                what: "channel".to_string(),
            });
        }

        let latest = tally.latest.map(|d| d.to_rfc3339());
        let oldest = tally.oldest.map(|d| d.to_rfc3339());
        let parsed = tally.parsed_dates;

        Ok(Findings::new(if schema.root_element == "feed" {
            "Atom Feed"
        } else {
            "RSS Feed"
        })
        .finding("title", json!(tally.title))
        .finding("description", json!(tally.description))
        .finding("item_count", json!(tally.items))
        .finding("categories", json!(tally.categories))
        .finding("authors", json!(tally.authors))
        .finding(
            "publication_range",
            json!({"latest": latest, "oldest": oldest, "unparsed": tally.unparsed_dates}),
        )
        .inventory("items", tally.items)
        .inventory("categories", tally.categories.len() as u64)
        .inventory("authors", tally.authors.len() as u64)
        .recommendations(&[
            "Track publication frequency over time",
            "Cluster items by category for topic analysis",
            "Deduplicate items syndicated from other feeds",
        ])
        .ai_use_cases(&[
            "Content summarisation",
            "Topic classification",
            "Trend detection",
            "Personalised recommendations",
        ])
        .structured(json!({ "items": tally.listed }))
        .metric("completeness", ratio(tally.complete_items, tally.items, 0.0))
        .metric("date_validity", ratio(parsed, parsed + tally.unparsed_dates, 1.0)))
    }
}
