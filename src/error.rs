use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures while reading or profiling a document.
///
/// Any of these aborts the analysis of the current document; no partial
/// schema is ever returned alongside one.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed XML in {} at byte {offset} (line {line}): {message}", .path.display())]
    Parse {
        path: PathBuf,
        offset: u64,
        line: u64,
        message: String,
    },

    #[error("Invalid UTF-8 in {} at byte {offset}", .path.display())]
    Encoding { path: PathBuf, offset: u64 },

    #[error("Failed to build structure tree: {message}")]
    Structure { message: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Recoverable failures of a type-specific document handler.
///
/// The handler registry absorbs these by falling back to the generic
/// handler, so they never abort the analysis of a document.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("{handler} handler found no {what}")]
    MissingData { handler: String, what: String },
}
