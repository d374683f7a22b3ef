//! End-to-end processing of one document: profile, classify, chunk and hand
//! off to the best matching handler.

use crate::chunker::{ChunkStrategy, DocumentChunk, XmlChunker};
use crate::config::AnalyzerConfig;
use crate::describe::{processing_strategy, ProcessingStrategy};
use crate::detector::{Detection, DocumentTypeDetector};
use crate::error::AnalysisError;
use crate::handler::{HandlerRegistry, HandlerReport};
use crate::schema::{DocumentSchema, SchemaAccumulator};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything learned about one document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentAnalysis {
    pub path: PathBuf,
    pub detection: Detection,
    pub schema: DocumentSchema,
    pub chunk_strategy: ChunkStrategy,
    pub chunks: Vec<DocumentChunk>,
    pub handler_report: HandlerReport,
    pub processing_strategy: ProcessingStrategy,
}

/// Configured detector, chunker and handler registry
pub struct Analyzer {
    config: AnalyzerConfig,
    detector: DocumentTypeDetector,
    registry: HandlerRegistry,
}

impl Analyzer {
    /// Analyzer with the built-in patterns and handlers
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            detector: DocumentTypeDetector::new(),
            registry: HandlerRegistry::with_builtin_handlers(),
        }
    }

    /// Replace the document type detector
    pub fn detector(mut self, detector: DocumentTypeDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Replace the handler registry
    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Profile and classify a document
    pub fn analyze(&self, path: impl AsRef<Path>) -> Result<DocumentSchema, AnalysisError> {
        let path = path.as_ref();
        let schema = SchemaAccumulator::analyze_path(path, &self.config.schema)?;
        let (schema, detection) = self.detector.classify(schema);
        info!(
            "Analyzed {}: {} ({:.2}), {} elements",
            path.display(),
            detection.document_type,
            detection.confidence,
            schema.statistics.total_elements
        );
        Ok(schema)
    }

    /// Chunk a document previously profiled into `schema`
    pub fn chunk(
        &self,
        path: impl AsRef<Path>,
        schema: &DocumentSchema,
    ) -> Result<Vec<DocumentChunk>, AnalysisError> {
        XmlChunker::new(self.config.chunking.clone()).chunk_file(path, schema)
    }

    /// Profile, classify, chunk and run the selected handler
    pub fn process(&self, path: impl AsRef<Path>) -> Result<DocumentAnalysis, AnalysisError> {
        process_with(path.as_ref(), &self.config, &self.detector, &self.registry)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

/// Profile and classify a document with the built-in patterns
pub fn analyze_file(
    path: impl AsRef<Path>,
    config: &AnalyzerConfig,
) -> Result<DocumentSchema, AnalysisError> {
    Analyzer::new(config.clone()).analyze(path)
}

/// Chunk a document previously profiled into `schema`
pub fn chunk_file(
    path: impl AsRef<Path>,
    schema: &DocumentSchema,
    config: &AnalyzerConfig,
) -> Result<Vec<DocumentChunk>, AnalysisError> {
    XmlChunker::new(config.chunking.clone()).chunk_file(path, schema)
}

/// Run the whole pipeline with the built-in patterns and the given handlers
pub fn process_file(
    path: impl AsRef<Path>,
    config: &AnalyzerConfig,
    registry: &HandlerRegistry,
) -> Result<DocumentAnalysis, AnalysisError> {
    process_with(path.as_ref(), config, &DocumentTypeDetector::new(), registry)
}

fn process_with(
    path: &Path,
    config: &AnalyzerConfig,
    detector: &DocumentTypeDetector,
    registry: &HandlerRegistry,
) -> Result<DocumentAnalysis, AnalysisError> {
    let schema = SchemaAccumulator::analyze_path(path, &config.schema)?;
    let (schema, detection) = detector.classify(schema);

    let chunker = XmlChunker::new(config.chunking.clone());
    let chunk_strategy = chunker.strategy_for(&schema);
    let chunks = chunker.chunk_file(path, &schema)?;
    let handler_report = registry.analyze(&schema, path);

    info!(
        "Processed {}: {} with {} chunks, handler {}",
        path.display(),
        detection.document_type,
        chunks.len(),
        handler_report.handler
    );

    Ok(DocumentAnalysis {
        path: path.to_path_buf(),
        processing_strategy: processing_strategy(&schema),
        detection,
        schema,
        chunk_strategy,
        chunks,
        handler_report,
    })
}
