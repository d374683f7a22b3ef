use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for schema accumulation and chunking.
///
/// Every field has a default, so a TOML file only needs to name the values
/// it overrides:
///
/// ```toml
/// [chunking]
/// max_chunk_size = 6000
///
/// [chunking.major]
/// max_occurrences = 50
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub schema: SchemaConfig,
    pub chunking: ChunkingConfig,
}

/// Sampling caps for the schema accumulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Max distinct values kept per attribute, and max text samples per tag
    pub max_samples_per_tag: usize,
    /// Text samples are truncated to this many characters
    pub max_sample_text_length: usize,
    /// Attribute value samples are truncated to this many characters
    pub max_attribute_value_length: usize,
    /// Max distinct root-to-node paths kept per tag
    pub max_paths_per_tag: usize,
    /// Max document-level sample paths (depth <= 3)
    pub max_sample_paths: usize,
    /// Node budget for the structure tree
    pub max_tree_nodes: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_samples_per_tag: 5,
            max_sample_text_length: 200,
            max_attribute_value_length: 50,
            max_paths_per_tag: 10,
            max_sample_paths: 20,
            max_tree_nodes: 10_000,
        }
    }
}

/// Chunk geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Nominal upper bound on chunk size in bytes
    pub max_chunk_size: usize,
    /// A major-element boundary only flushes a buffer larger than this
    pub min_chunk_size: usize,
    /// Bytes shared between consecutive size-based chunks
    pub overlap_size: usize,
    pub major: MajorElementThresholds,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 8000,
            min_chunk_size: 1000,
            overlap_size: 200,
            major: MajorElementThresholds::default(),
        }
    }
}

/// Heuristic thresholds deciding which tags count as section boundaries.
///
/// A tag is major when it is rare (`count < max_occurrences`), branching
/// (`children > min_children`) and shallow (`min depth <= max_depth`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MajorElementThresholds {
    pub max_occurrences: u64,
    pub min_children: usize,
    pub max_depth: usize,
}

impl Default for MajorElementThresholds {
    fn default() -> Self {
        Self {
            max_occurrences: 100,
            min_children: 3,
            max_depth: 3,
        }
    }
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a config from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AnalyzerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the nominal maximum chunk size in bytes
    pub fn max_chunk_size(mut self, size: usize) -> Self {
        self.chunking.max_chunk_size = size;
        self
    }

    /// Set the minimum buffer size flushed at a major-element boundary
    pub fn min_chunk_size(mut self, size: usize) -> Self {
        self.chunking.min_chunk_size = size;
        self
    }

    /// Set the overlap between size-based chunks
    pub fn overlap_size(mut self, size: usize) -> Self {
        self.chunking.overlap_size = size;
        self
    }

    /// Set the per-tag sample cap
    pub fn max_samples_per_tag(mut self, samples: usize) -> Self {
        self.schema.max_samples_per_tag = samples;
        self
    }

    /// Set the text sample truncation length
    pub fn max_sample_text_length(mut self, chars: usize) -> Self {
        self.schema.max_sample_text_length = chars;
        self
    }

    /// Replace the major-element thresholds
    pub fn major_thresholds(mut self, thresholds: MajorElementThresholds) -> Self {
        self.chunking.major = thresholds;
        self
    }

    /// Reject geometry the chunker cannot make progress with.
    ///
    /// `max_chunk_size` smaller than an individual element is not an error;
    /// the chunker emits that element as an oversized chunk instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.max_chunk_size == 0 {
            return Err(ConfigError::Invalid {
                field: "chunking.max_chunk_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.chunking.overlap_size >= self.chunking.max_chunk_size {
            return Err(ConfigError::Invalid {
                field: "chunking.overlap_size",
                reason: format!(
                    "{} must be smaller than max_chunk_size ({})",
                    self.chunking.overlap_size, self.chunking.max_chunk_size
                ),
            });
        }
        if self.schema.max_samples_per_tag == 0 {
            return Err(ConfigError::Invalid {
                field: "schema.max_samples_per_tag",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
