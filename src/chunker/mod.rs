//! Boundary-safe partitioning of XML documents.
//!
//! Documents with recognisable section elements are split structurally at
//! those elements; everything else falls back to overlapping fixed-size
//! windows. Either way, dropping each chunk's overlap prefix and
//! concatenating the chunks reproduces the source exactly.

mod structural;
mod types;
mod window;


pub use types::{chunk_id, ChunkStrategy, DocumentChunk, SIZE_BASED_PATH};

use crate::config::{ChunkingConfig, MajorElementThresholds};
use crate::error::AnalysisError;
use crate::schema::DocumentSchema;
use std::collections::BTreeSet;
use std::path::Path;
use structural::StructuralSplitter;
use tracing::{debug, info};

/// Tags that count as section boundaries for structural chunking
pub fn major_elements(schema: &DocumentSchema, thresholds: &MajorElementThresholds) -> Vec<String> {
    schema
        .elements
        .values()
        .filter(|profile| {
            profile.occurrence_count < thresholds.max_occurrences
                && profile.child_tags.len() > thresholds.min_children
                && profile
                    .min_depth()
                    .map(|depth| depth <= thresholds.max_depth)
                    .unwrap_or(false)
        })
        .map(|profile| profile.tag.clone())
        .collect()
}

/// Splits documents into [`DocumentChunk`]s using a schema built from them
#[derive(Debug, Clone, Default)]
pub struct XmlChunker {
    config: ChunkingConfig,
}

impl XmlChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Strategy the chunker uses for documents with this schema
    pub fn strategy_for(&self, schema: &DocumentSchema) -> ChunkStrategy {
        if major_elements(schema, &self.config.major).is_empty() {
            ChunkStrategy::SizeBased
        } else {
            ChunkStrategy::Structural
        }
    }

    /// Read and chunk a file. The whole document is held in memory.
    pub fn chunk_file(
        &self,
        path: impl AsRef<Path>,
        schema: &DocumentSchema,
    ) -> Result<Vec<DocumentChunk>, AnalysisError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = String::from_utf8(bytes).map_err(|err| AnalysisError::Encoding {
            path: path.to_path_buf(),
            offset: err.utf8_error().valid_up_to() as u64,
        })?;
        self.chunk_source(&source, schema, path)
    }

    /// Chunk an in-memory document; `path` is only used in errors
    pub fn chunk_source(
        &self,
        source: &str,
        schema: &DocumentSchema,
        path: impl AsRef<Path>,
    ) -> Result<Vec<DocumentChunk>, AnalysisError> {
        let path = path.as_ref();
        let majors: BTreeSet<String> = major_elements(schema, &self.config.major)
            .into_iter()
            .collect();

        let chunks = if majors.is_empty() {
            debug!("No major elements in {}, using size-based chunking", path.display());
            window::split_windows(source, &self.config, path)?
        } else {
            debug!(
                "Chunking {} structurally at {:?}",
                path.display(),
                majors
            );
            StructuralSplitter::new(source, &self.config, &majors).split(path)?
        };

        info!("Split {} into {} chunks", path.display(), chunks.len());
        Ok(chunks)
    }
}

/// Chunk an in-memory document with the given geometry
pub fn chunk_document(
    source: &str,
    schema: &DocumentSchema,
    config: &ChunkingConfig,
    path: impl AsRef<Path>,
) -> Result<Vec<DocumentChunk>, AnalysisError> {
    XmlChunker::new(config.clone()).chunk_source(source, schema, path)
}
