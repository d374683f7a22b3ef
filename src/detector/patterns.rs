use serde::{Deserialize, Serialize};

/// A named structural signature of a document type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPattern {
    pub name: String,
    pub description: String,
    /// Exact root element local names
    pub root_elements: Vec<String>,
    /// Substrings matched against every namespace URI in the document
    pub namespace_substrings: Vec<String>,
}

impl DocumentPattern {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        root_elements: &[&str],
        namespace_substrings: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            root_elements: root_elements.iter().map(|s| s.to_string()).collect(),
            namespace_substrings: namespace_substrings.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn matches_root(&self, root: &str) -> bool {
        self.root_elements.iter().any(|r| r == root)
    }

    pub fn matches_namespace(&self, uri: &str) -> bool {
        self.namespace_substrings.iter().any(|s| uri.contains(s.as_str()))
    }
}

/// Patterns known out of the box, in registration order
pub fn builtin_patterns() -> Vec<DocumentPattern> {
    vec![
        DocumentPattern::new(
            "SCAP",
            "Security Content Automation Protocol document",
            &["asset-report-collection", "data-stream-collection"],
            &["http://scap.nist.gov", "http://checklists.nist.gov/xccdf"],
        ),
        DocumentPattern::new(
            "XCCDF",
            "Extensible Configuration Checklist Description Format",
            &["Benchmark"],
            &["checklists.nist.gov/xccdf"],
        ),
        DocumentPattern::new(
            "OVAL",
            "Open Vulnerability and Assessment Language",
            &["oval_definitions", "oval_results"],
            &["oval.mitre.org/XMLSchema"],
        ),
        DocumentPattern::new(
            "SOAP",
            "SOAP web service message",
            &["Envelope"],
            &["schemas.xmlsoap.org/soap", "www.w3.org/2003/05/soap-envelope"],
        ),
        DocumentPattern::new(
            "XML_SCHEMA",
            "XML Schema Definition",
            &["schema"],
            &["http://www.w3.org/2001/XMLSchema"],
        ),
        DocumentPattern::new(
            "RSS",
            "RSS/Atom feed",
            &["rss", "feed"],
            &["http://www.w3.org/2005/Atom", "purl.org/rss"],
        ),
        DocumentPattern::new(
            "SVG",
            "Scalable Vector Graphics",
            &["svg"],
            &["http://www.w3.org/2000/svg"],
        ),
        DocumentPattern::new(
            "WSDL",
            "Web Services Description Language",
            &["definitions", "description"],
            &["schemas.xmlsoap.org/wsdl", "www.w3.org/ns/wsdl"],
        ),
        DocumentPattern::new(
            "MAVEN_POM",
            "Maven project object model",
            &["project"],
            &["maven.apache.org/POM"],
        ),
        DocumentPattern::new(
            "SITEMAP",
            "XML sitemap or sitemap index",
            &["urlset", "sitemapindex"],
            &["sitemaps.org/schemas/sitemap"],
        ),
        DocumentPattern::new(
            "SPRING",
            "Spring framework bean configuration",
            &["beans"],
            &["springframework.org/schema"],
        ),
        DocumentPattern::new(
            "LOG4J",
            "Log4j logging configuration",
            &["Configuration", "configuration"],
            &["jakarta.apache.org/log4j", "logging.apache.org/log4j"],
        ),
        DocumentPattern::new(
            "DOCBOOK",
            "DocBook technical documentation",
            &["book", "article"],
            &["docbook.org/ns/docbook"],
        ),
        DocumentPattern::new(
            "KML",
            "Keyhole Markup Language geographic data",
            &["kml"],
            &["opengis.net/kml", "earth.google.com/kml"],
        ),
    ]
}
