use super::walk::{walk_elements, ClosedElement};
use super::{DocumentHandler, Findings, Probe};
use crate::error::HandlerError;
use crate::schema::DocumentSchema;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeSet;
use std::path::Path;

const DOCBOOK_NAMESPACE: &str = "docbook.org";
const ROOT_TAGS: [&str; 5] = ["book", "article", "chapter", "section", "para"];
const MAX_LISTED: usize = 50;
const MAX_CODE_EXAMPLES: usize = 10;

/// DocBook books, articles and their fragments
pub struct DocBookHandler;

fn is_info(tag: &str) -> bool {
    matches!(tag, "info" | "bookinfo" | "articleinfo")
}

/// `section` or one of the numbered `sect1`..`sect5` forms
fn is_section(tag: &str) -> bool {
    tag == "section"
        || (tag.len() == 5 && tag.starts_with("sect") && tag.ends_with(|c: char| c.is_ascii_digit()))
}

#[derive(Debug, Default, Serialize)]
struct Metadata {
    title: Option<String>,
    author: Option<String>,
    date: Option<String>,
    #[serde(rename = "abstract")]
    summary: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct ContentStats {
    paragraphs: u64,
    lists: u64,
    tables: u64,
    examples: u64,
    notes: u64,
    warnings: u64,
}

#[derive(Debug, Default)]
struct Chapter {
    title: Option<String>,
    sections: u64,
    section_titles: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Media {
    #[serde(rename = "type")]
    kind: &'static str,
    fileref: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Serialize)]
struct GlossEntry {
    term: String,
    definition: String,
}

#[derive(Debug, Serialize)]
struct CodeExample {
    language: String,
    code: String,
}

#[derive(Debug, Default)]
struct DocBookTally {
    title: Option<String>,
    has_metadata: bool,
    metadata: Metadata,
    pending_name: (Option<String>, Option<String>),
    chapters: u64,
    listed_chapters: Vec<Chapter>,
    pending_chapter: Chapter,
    sections: u64,
    max_section_depth: usize,
    content: ContentStats,
    media: u64,
    listed_media: Vec<Media>,
    xrefs: u64,
    xref_targets: BTreeSet<String>,
    pending_term: Option<String>,
    pending_definition: Option<String>,
    glossary: Vec<GlossEntry>,
    code_examples: Vec<CodeExample>,
}

impl DocBookTally {
    fn observe(&mut self, element: &ClosedElement<'_>) {
        // Only the document-level info block describes the document
        let in_root_info = element.ancestors.get(1).map_or(false, |a| is_info(a));
        if in_root_info {
            self.observe_metadata(element);
        }

        match element.tag {
            "title" => self.observe_title(element),
            "para" | "simpara" => {
                self.content.paragraphs += 1;
                if element.parent() == Some("glossdef") && self.pending_definition.is_none() {
                    self.pending_definition = element.text();
                }
            }
            "itemizedlist" | "orderedlist" => self.content.lists += 1,
            "table" | "informaltable" => self.content.tables += 1,
            "example" => self.content.examples += 1,
            "note" => self.content.notes += 1,
            "warning" => self.content.warnings += 1,
            tag if is_info(tag) && element.ancestors.len() == 1 => self.has_metadata = true,
            tag if is_section(tag) => {
                self.sections += 1;
                let depth = element.ancestors.iter().filter(|a| is_section(a)).count() + 1;
                self.max_section_depth = self.max_section_depth.max(depth);
                if element.within("chapter") {
                    self.pending_chapter.sections += 1;
                }
            }
            "chapter" => {
                let chapter = std::mem::take(&mut self.pending_chapter);
                self.chapters += 1;
                if self.listed_chapters.len() < MAX_LISTED {
                    self.listed_chapters.push(chapter);
                }
            }
            "imagedata" => {
                self.media += 1;
                if self.listed_media.len() < MAX_LISTED {
                    self.listed_media.push(Media {
                        kind: "image",
                        fileref: element.attr("fileref").map(str::to_string),
                        format: element.attr("format").map(str::to_string),
                    });
                }
            }
            "xref" => {
                if let Some(linkend) = element.attr("linkend") {
                    self.xrefs += 1;
                    if self.xref_targets.len() < MAX_LISTED {
                        self.xref_targets.insert(linkend.to_string());
                    }
                }
            }
            "glossterm" if element.parent() == Some("glossentry") => {
                self.pending_term = element.text();
            }
            "glossdef" => {
                if self.pending_definition.is_none() {
                    self.pending_definition = element.text();
                }
            }
            "glossentry" => {
                let term = self.pending_term.take();
                let definition = self.pending_definition.take();
                if let (Some(term), Some(definition)) = (term, definition) {
                    if self.glossary.len() < MAX_LISTED {
                        self.glossary.push(GlossEntry { term, definition });
                    }
                }
            }
            "programlisting" => {
                if self.code_examples.len() < MAX_CODE_EXAMPLES {
                    self.code_examples.push(CodeExample {
                        language: element.attr("language").unwrap_or("unknown").to_string(),
                        code: element.text.to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    fn observe_title(&mut self, element: &ClosedElement<'_>) {
        if self.title.is_none() {
            self.title = element.text();
        }

        let Some(title) = element.text() else {
            return;
        };
        let owner = match element.parent() {
            Some(parent) if is_info(parent) => element
                .ancestors
                .len()
                .checked_sub(2)
                .map(|i| element.ancestors[i].as_str()),
            parent => parent,
        };
        match owner {
            Some("chapter") if self.pending_chapter.title.is_none() => {
                self.pending_chapter.title = Some(title);
            }
            Some(owner) if is_section(owner) && element.within("chapter") => {
                if self.pending_chapter.section_titles.len() < MAX_LISTED {
                    self.pending_chapter.section_titles.push(title);
                }
            }
            _ => {}
        }
    }

    fn observe_metadata(&mut self, element: &ClosedElement<'_>) {
        let direct = element.ancestors.len() == 2;
        match element.tag {
            "title" if direct => self.metadata.title = element.text(),
            "date" if direct => self.metadata.date = element.text(),
            "abstract" if direct && self.metadata.summary.is_none() => {
                self.metadata.summary = element.text();
            }
            "para" | "simpara" if element.parent() == Some("abstract") => {
                if self.metadata.summary.is_none() {
                    self.metadata.summary = element.text();
                }
            }
            "firstname" | "givenname" => self.pending_name.0 = element.text(),
            "surname" => self.pending_name.1 = element.text(),
            "author" => {
                if let (Some(first), Some(last)) = std::mem::take(&mut self.pending_name) {
                    if self.metadata.author.is_none() {
                        self.metadata.author = Some(format!("{} {}", first, last));
                    }
                }
            }
            _ => {}
        }
    }

    fn table_of_contents(&self) -> serde_json::Value {
        self.listed_chapters
            .iter()
            .filter_map(|chapter| {
                let title = chapter.title.as_ref()?;
                Some(json!({"title": title, "sections": chapter.section_titles}))
            })
            .collect()
    }
}

impl DocumentHandler for DocBookHandler {
    fn name(&self) -> &str {
        "docbook"
    }

    fn probe(&self, schema: &DocumentSchema) -> Probe {
        if schema
            .namespace_uris()
            .iter()
            .any(|uri| uri.contains(DOCBOOK_NAMESPACE))
        {
            Probe::applicable(1.0)
        } else if ROOT_TAGS.contains(&schema.root_element.as_str()) {
            Probe::applicable(0.8)
        } else {
            Probe::not_applicable()
        }
    }

    fn analyze(&self, schema: &DocumentSchema, path: &Path) -> Result<Findings, HandlerError> {
        let mut tally = DocBookTally::default();
        walk_elements(path, |element| tally.observe(element))?;

        if tally.content.paragraphs == 0 && tally.sections == 0 && tally.chapters == 0 {
            return Err(HandlerError::MissingData {
                handler: self.name().to_string(),
                what: "sections or paragraphs".to_string(),
            });
        }

        let chapters: Vec<_> = tally
            .listed_chapters
            .iter()
            .map(|chapter| {
                json!({
                    "title": chapter.title.as_deref().unwrap_or("Untitled"),
                    "sections": chapter.sections,
                })
            })
            .collect();
        let metadata = if tally.has_metadata {
            json!(tally.metadata)
        } else {
            json!({})
        };

        let has_examples = tally.content.examples > 0;
        let has_structure = tally.sections > 0;
        let completeness = [has_examples, has_structure, tally.has_metadata]
            .iter()
            .filter(|present| **present)
            .count() as f64
            / 3.0;
        let example_coverage = tally.content.examples as f64 / tally.sections.max(1) as f64;
        let warning_ratio = tally.content.warnings as f64 / tally.content.paragraphs.max(1) as f64;

        Ok(Findings::new("DocBook Documentation")
            .finding(
                "structure",
                json!({
                    "type": schema.root_element,
                    "chapters": chapters,
                    "total_sections": tally.sections,
                    "max_depth": tally.max_section_depth,
                }),
            )
            .finding("metadata", metadata)
            .finding("content_stats", json!(tally.content))
            .finding("media", json!(tally.listed_media))
            .finding(
                "cross_references",
                json!({"count": tally.xrefs, "targets": tally.xref_targets}),
            )
            .inventory("chapters", tally.chapters)
            .inventory("sections", tally.sections)
            .inventory("media_items", tally.media)
            .recommendations(&[
                "Extract for documentation search system",
                "Generate multiple output formats (HTML, PDF)",
                "Check for broken cross-references",
                "Analyze readability and completeness",
            ])
            .ai_use_cases(&[
                "Documentation quality analysis",
                "Automatic summary generation",
                "Technical content extraction",
                "Glossary and index generation",
                "Documentation translation",
            ])
            .structured(json!({
                "title": tally.title.as_deref().unwrap_or("Untitled"),
                "table_of_contents": tally.table_of_contents(),
                "glossary": tally.glossary,
                "code_examples": tally.code_examples,
            }))
            .metric("completeness", completeness)
            .metric("example_coverage", example_coverage)
            // A few warnings per hundred paragraphs is healthy
            .metric("safety_documentation", warning_ratio * 10.0))
    }
}
