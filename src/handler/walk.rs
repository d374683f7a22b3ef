use crate::error::AnalysisError;
use crate::reader::{Attribute, EventReader, XmlEvent};
use std::path::Path;

/// An element reported once its end tag has been read
pub(crate) struct ClosedElement<'a> {
    /// Local names of the enclosing elements, root first
    pub ancestors: &'a [String],
    pub tag: &'a str,
    pub attributes: &'a [Attribute],
    /// Direct text content, trimmed
    pub text: &'a str,
}

impl ClosedElement<'_> {
    pub fn parent(&self) -> Option<&str> {
        self.ancestors.last().map(String::as_str)
    }

    pub fn within(&self, tag: &str) -> bool {
        self.ancestors.iter().any(|a| a == tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Text content, `None` when empty
    pub fn text(&self) -> Option<String> {
        (!self.text.is_empty()).then(|| self.text.to_string())
    }
}

struct Frame {
    tag: String,
    attributes: Vec<Attribute>,
    text: String,
}

/// Stream a document and call `visit` for every element, innermost first
pub(crate) fn walk_elements<F>(path: &Path, mut visit: F) -> Result<(), AnalysisError>
where
    F: FnMut(&ClosedElement<'_>),
{
    let mut reader = EventReader::from_path(path)?;
    let mut frames: Vec<Frame> = Vec::new();
    let mut ancestors: Vec<String> = Vec::new();

    while let Some(spanned) = reader.next_event()? {
        match spanned.event {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                if let Some(parent) = frames.last() {
                    ancestors.push(parent.tag.clone());
                }
                frames.push(Frame {
                    tag: name,
                    attributes,
                    text: String::new(),
                });
            }
            XmlEvent::Characters(text) => {
                if let Some(frame) = frames.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            XmlEvent::EndElement { .. } => {
                if let Some(frame) = frames.pop() {
                    visit(&ClosedElement {
                        ancestors: &ancestors,
                        tag: &frame.tag,
                        attributes: &frame.attributes,
                        text: frame.text.trim(),
                    });
                    ancestors.pop();
                }
            }
            XmlEvent::StartNamespace { .. } => {}
        }
    }

    Ok(())
}
