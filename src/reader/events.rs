use std::ops::Range;

/// A namespace-resolved attribute on an element start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Local name, prefix stripped
    pub name: String,
    /// Prefix as written in the source, if any
    pub prefix: Option<String>,
    /// Unescaped value
    pub value: String,
}

/// Parse events in document order.
///
/// Empty elements (`<a/>`) are reported as a `StartElement` with
/// `empty: true` followed by an `EndElement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// A namespace binding declared on the element that starts next.
    /// `prefix` is `None` for the default namespace.
    StartNamespace { prefix: Option<String>, uri: String },
    StartElement {
        /// Local name, prefix stripped
        name: String,
        prefix: Option<String>,
        /// Namespace URI the element resolved to, if any is in scope
        namespace_uri: Option<String>,
        attributes: Vec<Attribute>,
        empty: bool,
    },
    EndElement { name: String },
    /// Text or CDATA content
    Characters(String),
}

/// An event plus the source bytes it was read from.
///
/// Spans are contiguous: each event starts where the previous one ended,
/// so markup without an event of its own (comments, processing
/// instructions, the XML declaration) is folded into the following span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedEvent {
    pub event: XmlEvent,
    /// Half-open byte range in the source
    pub span: Range<u64>,
    /// 1-based line on which the event's own markup or text starts
    pub line: u64,
}
