use super::{
    DocBookHandler, DocumentHandler, FeedHandler, Findings, GenericHandler, Log4jHandler,
    MavenHandler, Probe, ScapHandler, SitemapHandler, SpringHandler,
};
use crate::schema::DocumentSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Result of running the selected handler on one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerReport {
    /// Name of the handler whose findings these are
    pub handler: String,
    pub confidence: f64,
    pub findings: Findings,
    /// Why the selected handler's findings were replaced by the generic ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

/// Ordered set of [`DocumentHandler`]s with a generic fallback
pub struct HandlerRegistry {
    fallback: GenericHandler,
    handlers: Vec<Box<dyn DocumentHandler>>,
}

impl HandlerRegistry {
    /// Registry with only the generic fallback
    pub fn new() -> Self {
        Self {
            fallback: GenericHandler,
            handlers: Vec::new(),
        }
    }

    /// Registry with every built-in handler
    pub fn with_builtin_handlers() -> Self {
        let mut registry = Self::new();
        registry.register(ScapHandler);
        registry.register(SitemapHandler);
        registry.register(MavenHandler);
        registry.register(FeedHandler);
        registry.register(Log4jHandler);
        registry.register(SpringHandler);
        registry.register(DocBookHandler);
        registry
    }

    /// Append a handler. It loses confidence ties against every earlier one.
    ///
    /// # Example
    /// ```ignore
    /// let mut registry = HandlerRegistry::new();
    /// registry.register(SitemapHandler);
    /// ```
    pub fn register(&mut self, handler: impl DocumentHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Pick the most confident applicable handler, or the fallback
    pub fn select(&self, schema: &DocumentSchema) -> (&dyn DocumentHandler, Probe) {
        let mut best: Option<(&dyn DocumentHandler, Probe)> = None;
        for handler in &self.handlers {
            let probe = handler.probe(schema);
            if !probe.applicable {
                continue;
            }
            if best
                .map(|(_, top)| probe.confidence > top.confidence)
                .unwrap_or(true)
            {
                best = Some((&**handler, probe));
            }
        }

        best.unwrap_or_else(|| (&self.fallback as &dyn DocumentHandler, self.fallback.probe(schema)))
    }

    /// Run the selected handler, falling back to generic findings on failure
    pub fn analyze(&self, schema: &DocumentSchema, path: &Path) -> HandlerReport {
        let (handler, probe) = self.select(schema);
        debug!(
            "Selected handler {} ({:.2}) for {}",
            handler.name(),
            probe.confidence,
            path.display()
        );

        match handler.analyze(schema, path) {
            Ok(findings) => HandlerReport {
                handler: handler.name().to_string(),
                confidence: probe.confidence,
                findings,
                fallback_reason: None,
            },
            Err(err) => {
                warn!(
                    "Handler {} failed on {}, using generic findings: {}",
                    handler.name(),
                    path.display(),
                    err
                );
                HandlerReport {
                    handler: self.fallback.name().to_string(),
                    confidence: self.fallback.probe(schema).confidence,
                    findings: self.fallback.findings(schema),
                    fallback_reason: Some(format!("{}: {}", handler.name(), err)),
                }
            }
        }
    }

    /// Number of registered handlers (excluding fallback)
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Registered handler names in registration order
    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_builtin_handlers()
    }
}
