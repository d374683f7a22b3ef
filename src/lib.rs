// Public API exports
pub mod chunker;
pub mod config;
pub mod describe;
pub mod detector;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod reader;
pub mod schema;

// Re-export main types for convenience
pub use config::{AnalyzerConfig, ChunkingConfig, MajorElementThresholds, SchemaConfig};
pub use error::{AnalysisError, ConfigError, HandlerError};

pub use reader::{Attribute, EventReader, SpannedEvent, XmlEvent};

pub use schema::{
    DocumentSchema, ElementProfile, SchemaAccumulator, SchemaStatistics, StructureNode,
    GENERIC_DOCUMENT_TYPE,
};

pub use detector::{Detection, DocumentPattern, DocumentTypeDetector};

pub use chunker::{
    chunk_document, major_elements, ChunkStrategy, DocumentChunk, XmlChunker, SIZE_BASED_PATH,
};

pub use handler::{
    DocBookHandler, DocumentHandler, FeedHandler, Findings, GenericHandler, HandlerRegistry,
    HandlerReport, Log4jHandler, MavenHandler, Probe, ScapHandler, SitemapHandler, SpringHandler,
};

pub use describe::{processing_strategy, schema_description, ProcessingStrategy};

pub use pipeline::{analyze_file, chunk_file, process_file, Analyzer, DocumentAnalysis};
