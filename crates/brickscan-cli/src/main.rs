//! brickscan - Extract part/color record arrays from brick-graph exports
//!
//! This tool scans raw `.uexp` blobs for the embedded array of
//! `(part id, color id)` records and writes it out as JSON or text.

mod descriptors;

use anyhow::{bail, Context, Result};
use brickscan_core::{ArrayStrategy, IdentifierDomain, Scanner, ScannerConfig};
use clap::{Args, Parser, ValueEnum};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Extract part/color record arrays from brick-graph .uexp exports
#[derive(Parser, Debug)]
#[command(name = "brickscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Directory of part descriptor exports (<id>.json)
    #[arg(short, long)]
    parts: PathBuf,

    /// Export entry type that carries the part aliases
    #[arg(long, default_value = "LegoPart")]
    descriptor_type: String,

    /// Output directory for extracted record files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Largest record count accepted from a length field
    #[arg(long, default_value = "10000")]
    max_records: u32,

    /// File extension of blobs picked up in directory mode
    #[arg(long, default_value = "uexp")]
    extension: String,

    /// Replace alias part ids by their primary id
    #[arg(long)]
    resolve_aliases: bool,

    /// Dry run - don't write files, just show what would be extracted
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing files without prompting
    #[arg(long)]
    force: bool,

    /// Only list found arrays without writing them
    #[arg(long)]
    list_only: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single .uexp blob
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of blobs to process
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Output format for extracted arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// JSON array of [part, color] pairs
    Json,
    /// One "part color" line per record
    Text,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }

    fn render(self, pairs: &[(u32, u32)]) -> Result<String> {
        match self {
            OutputFormat::Json => {
                serde_json::to_string(pairs).context("Failed to serialize records")
            }
            OutputFormat::Text => Ok(pairs
                .iter()
                .map(|(identifier, auxiliary)| format!("{} {}\n", identifier, auxiliary))
                .collect()),
        }
    }
}

/// Tracks extracted arrays so identical ones are written once
#[derive(Default)]
struct RecordRegistry {
    /// Maps content hash -> blob the array was first extracted from
    seen: HashMap<String, PathBuf>,
    /// Statistics
    stats: RegistryStats,
}

#[derive(Default)]
struct RegistryStats {
    total_found: usize,
    duplicates_skipped: usize,
    written: usize,
}

impl RecordRegistry {
    fn new() -> Self {
        Self::default()
    }

    /// Compute a short hash of the records (first 8 chars of blake3)
    fn content_hash(pairs: &[(u32, u32)]) -> String {
        let mut hasher = blake3::Hasher::new();
        for (identifier, auxiliary) in pairs {
            hasher.update(&identifier.to_le_bytes());
            hasher.update(&auxiliary.to_le_bytes());
        }
        hasher.finalize().to_hex()[..8].to_string()
    }

    /// Register an array; returns false if identical records were already seen
    fn register(&mut self, content_hash: &str, source: &Path) -> bool {
        self.stats.total_found += 1;

        if let Some(first) = self.seen.get(content_hash) {
            debug!(
                "Skipping duplicate: {} has the same records as {} (hash: {})",
                source.display(),
                first.display(),
                content_hash
            );
            self.stats.duplicates_skipped += 1;
            return false;
        }

        self.seen
            .insert(content_hash.to_string(), source.to_path_buf());
        true
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} found, {} duplicates skipped, {} written",
            self.stats.total_found, self.stats.duplicates_skipped, self.stats.written
        );
    }
}

/// Output file name: `<stem>_<count>_records.<ext>`
fn output_name(blob: &Path, count: usize, format: OutputFormat) -> String {
    let stem = blob
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("blob");
    format!("{}_{}_records.{}", stem, count, format.extension())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let domain = descriptors::load_domain(&cli.parts, &cli.descriptor_type)
        .with_context(|| format!("Failed to load part descriptors: {}", cli.parts.display()))?;

    // Dispatch based on input mode
    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, &domain, file)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, &domain, directory)
    } else {
        bail!("Either --file or --directory must be specified")
    }
}

fn scanner(cli: &Cli) -> Scanner {
    Scanner::with_config(ScannerConfig::new().max_records(cli.max_records))
}

/// Process a single blob
fn process_single_file(cli: &Cli, domain: &IdentifierDomain, file: &Path) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }
    if has_extension(file, "uasset") {
        bail!(
            "Input is a .uasset header: {} (the records live in the .uexp next to it)",
            file.display()
        );
    }
    if !has_extension(file, &cli.extension) {
        warn!(
            "Input does not have the .{} extension: {}",
            cli.extension,
            file.display()
        );
    }

    let scanner = scanner(cli);
    let mut registry = RecordRegistry::new();
    process_blob(cli, &scanner, domain, file, &mut registry)?;

    if !cli.list_only && !cli.dry_run {
        registry.print_summary();
    }

    Ok(())
}

/// Process a directory of blobs recursively
fn process_directory(cli: &Cli, domain: &IdentifierDomain, directory: &Path) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let scanner = scanner(cli);
    let mut registry = RecordRegistry::new();
    let mut blobs_processed = 0;
    let mut failures = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }

        if !has_extension(path, &cli.extension) {
            trace!("Skipping non-blob: {}", path.display());
            continue;
        }

        debug!("Processing blob: {}", path.display());
        if let Err(e) = process_blob(cli, &scanner, domain, path, &mut registry) {
            // Log error but continue with other files
            warn!("Error processing {}: {:#}", path.display(), e);
            failures += 1;
        }
        blobs_processed += 1;
    }

    info!("Processed {} blobs ({} failed)", blobs_processed, failures);

    if !cli.list_only && !cli.dry_run {
        registry.print_summary();
    }

    Ok(())
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Extract the record array of a single blob and write it out
fn process_blob(
    cli: &Cli,
    scanner: &Scanner,
    domain: &IdentifierDomain,
    blob_path: &Path,
    registry: &mut RecordRegistry,
) -> Result<()> {
    trace!("Reading {}", blob_path.display());
    let data = fs::read(blob_path)
        .with_context(|| format!("Failed to read input file: {}", blob_path.display()))?;

    trace!("Read {} bytes from {}", data.len(), blob_path.display());

    let extraction = scanner
        .extract(&data, domain)
        .with_context(|| format!("Failed to extract records: {}", blob_path.display()))?;

    let start = extraction.candidate.start();
    let pairs: Vec<(u32, u32)> = extraction
        .records()
        .iter()
        .map(|r| {
            let identifier = if cli.resolve_aliases {
                domain.resolve(r.identifier)
            } else {
                r.identifier
            };
            (identifier, r.auxiliary)
        })
        .collect();

    if cli.list_only {
        println!(
            "{}: {} records at {:#x}",
            blob_path.display(),
            pairs.len(),
            start
        );
        return Ok(());
    }

    let content_hash = RecordRegistry::content_hash(&pairs);
    if !registry.register(&content_hash, blob_path) {
        return Ok(());
    }

    let output_path = cli
        .output
        .join(output_name(blob_path, pairs.len(), cli.format));
    let content = cli.format.render(&pairs)?;

    if cli.dry_run {
        println!("Would write: {}", output_path.display());
        if cli.verbose > 0 {
            println!("---");
            println!("{}", content);
            println!("---");
        }
        return Ok(());
    }

    if let Err(e) = write_records_file(&output_path, &content, cli.force) {
        error!("Failed to write {}: {:#}", output_path.display(), e);
        return Err(e);
    }

    println!(
        "Successfully parsed {} records to {}",
        pairs.len(),
        output_path.display()
    );
    registry.stats.written += 1;

    Ok(())
}

/// Write a records file to disk
fn write_records_file(output_path: &Path, content: &str, force: bool) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if output_path.exists() && !force {
        bail!(
            "File already exists: {} (use --force to overwrite)",
            output_path.display()
        );
    }

    let mut file = fs::File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;

    Ok(())
}
