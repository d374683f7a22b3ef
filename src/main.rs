use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;
use xmlscope::{
    schema_description, Analyzer, AnalyzerConfig, DocumentAnalysis, DocumentSchema,
};

/// Structural profiling and chunking of XML documents
#[derive(Debug, Parser)]
#[command(name = "xmlscope", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the nominal maximum chunk size in bytes
    #[arg(long, global = true)]
    max_chunk_size: Option<usize>,

    /// Override the buffer size flushed at a major-element boundary
    #[arg(long, global = true)]
    min_chunk_size: Option<usize>,

    /// Override the overlap between size-based chunks
    #[arg(long, global = true)]
    overlap: Option<usize>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Profile documents and describe their structure
    Analyze {
        /// XML files or directories to search for *.xml
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print the schemas as JSON
        #[arg(long)]
        json: bool,
    },

    /// Split one document into boundary-safe chunks
    Chunk {
        path: PathBuf,

        /// Print the chunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a full JSON analysis per document
    Report {
        /// XML files or directories to search for *.xml
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Directory receiving <stem>_analysis.json files
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct Report<'a> {
    generated_at: String,
    #[serde(flatten)]
    analysis: &'a DocumentAnalysis,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let analyzer = Analyzer::new(config);

    match &cli.command {
        Command::Analyze { paths, json } => analyze(&analyzer, paths, *json),
        Command::Chunk { path, json } => chunk(&analyzer, path, *json),
        Command::Report { paths, output } => report(&analyzer, paths, output),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<AnalyzerConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalyzerConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalyzerConfig::new(),
    };

    if let Some(size) = cli.max_chunk_size {
        config = config.max_chunk_size(size);
    }
    if let Some(size) = cli.min_chunk_size {
        config = config.min_chunk_size(size);
    }
    if let Some(size) = cli.overlap {
        config = config.overlap_size(size);
    }
    config.validate().context("Invalid chunking options")?;
    Ok(config)
}

/// Expand directories into the XML files below them, in name order
fn collect_documents(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for path in paths {
        if !path.is_dir() {
            documents.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
            let is_xml = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("xml"))
                .unwrap_or(false);
            if entry.file_type().is_file() && is_xml {
                documents.push(entry.into_path());
            }
        }
    }

    if documents.is_empty() {
        bail!("No XML documents found");
    }
    Ok(documents)
}

fn analyze(analyzer: &Analyzer, paths: &[PathBuf], json: bool) -> Result<()> {
    let documents = collect_documents(paths)?;
    let mut schemas: BTreeMap<String, DocumentSchema> = BTreeMap::new();
    let mut failed = 0;

    for path in &documents {
        match analyzer.analyze(path) {
            Ok(schema) if json => {
                schemas.insert(path.display().to_string(), schema);
            }
            Ok(schema) => {
                println!("=== {} ===", path.display());
                println!("{}", schema_description(&schema));
            }
            Err(err) => {
                error!("{}", err);
                failed += 1;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&schemas)?);
    }
    finish(failed, documents.len())
}

fn chunk(analyzer: &Analyzer, path: &Path, json: bool) -> Result<()> {
    let schema = analyzer
        .analyze(path)
        .with_context(|| format!("Failed to analyze {}", path.display()))?;
    let chunks = analyzer
        .chunk(path, &schema)
        .with_context(|| format!("Failed to chunk {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    for chunk in &chunks {
        println!(
            "#{:<4} {}  bytes {}..{}  lines {}-{}  {}  {}",
            chunk.index,
            chunk.id,
            chunk.byte_range.0,
            chunk.byte_range.1,
            chunk.line_range.0,
            chunk.line_range.1,
            chunk.element_path,
            chunk.summary
        );
    }
    Ok(())
}

fn report(analyzer: &Analyzer, paths: &[PathBuf], output: &Path) -> Result<()> {
    let documents = collect_documents(paths)?;
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut failed = 0;

    for path in &documents {
        let start = Instant::now();
        let analysis = match analyzer.process(path) {
            Ok(analysis) => analysis,
            Err(err) => {
                error!("{}", err);
                failed += 1;
                continue;
            }
        };

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let target = output.join(format!("{}_analysis.json", stem));
        let report = Report {
            generated_at: Utc::now().to_rfc3339(),
            analysis: &analysis,
        };
        let text = serde_json::to_string_pretty(&report)?;
        std::fs::write(&target, text)
            .with_context(|| format!("Failed to write {}", target.display()))?;

        info!(
            "Wrote {} [{:.2}s]",
            target.display(),
            start.elapsed().as_secs_f64()
        );
    }

    finish(failed, documents.len())
}

fn finish(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        bail!("{} of {} documents failed", failed, total);
    }
    Ok(())
}
