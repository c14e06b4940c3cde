//! Main entry point for the packzip CLI application.
//!
//! This binary packs files from disk into a store-only ZIP archive, or lists
//! and tests an existing one.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::collections::HashSet;
use std::path::{Component, Path};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use packzip::io::{read_source, write_archive};
use packzip::{ArchiveFile, Cli, LocalFileReader, ReadAt, ZipExtractor, pack};

/// Application entry point.
///
/// Parses command-line arguments, installs logging and dispatches to the
/// pack or inspect handler.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.is_inspect() {
        let reader = Arc::new(LocalFileReader::new(Path::new(&cli.archive))?);
        inspect_archive(reader, &cli).await
    } else {
        create_archive(&cli).await
    }
}

/// Pack the files named on the command line into `cli.archive`.
///
/// Sources are read up front, packed off the async worker threads, and the
/// finished archive is written in one go. Nothing is written if any step
/// fails.
async fn create_archive(cli: &Cli) -> Result<()> {
    if cli.files.is_empty() {
        bail!("nothing to pack: give at least one file after {}", cli.archive);
    }

    let mut seen = HashSet::new();
    let mut files = Vec::with_capacity(cli.files.len());

    for path in &cli.files {
        let name = archive_name(path, cli.junk_paths)?;
        if !seen.insert(name.clone()) {
            warn!(entry = %name, "duplicate entry name, both copies will be stored");
        }

        let content = read_source(Path::new(path)).await?;
        if !cli.is_quiet() {
            println!("  adding: {} ({})", name, format_size(content.len() as u64));
        }
        files.push(ArchiveFile::new(name, content));
    }

    let archive = tokio::task::spawn_blocking(move || pack(&files))
        .await
        .context("packing task panicked")??;

    let written = write_archive(Path::new(&cli.archive), archive.as_bytes(), cli.overwrite).await?;
    info!(archive = %cli.archive, entries = archive.entry_count(), size = written, "archive created");

    if !cli.is_quiet() {
        println!(
            "{}: {} files, {}",
            cli.archive,
            archive.entry_count(),
            format_size(written)
        );
    }

    Ok(())
}

/// Map a source path to the name stored in the archive.
///
/// Leading `/` and `./` are dropped and `\` becomes `/`. With `junk_paths`
/// only the final component is kept. Paths containing `..` are refused.
fn archive_name(path: &str, junk_paths: bool) -> Result<String> {
    let normalized = path.replace('\\', "/");

    let mut parts = Vec::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => bail!("refusing to store {}: path contains '..'", path),
        }
    }

    let name = if junk_paths {
        parts.pop().unwrap_or_default()
    } else {
        parts.join("/")
    };

    if name.is_empty() {
        bail!("cannot derive an archive name from {:?}", path);
    }
    Ok(name)
}

/// List or test an existing archive.
async fn inspect_archive<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli) -> Result<()> {
    let extractor = ZipExtractor::new(reader);

    if cli.list || cli.verbose {
        list_files(&extractor, cli.verbose).await?;
    }

    if cli.test {
        test_archive(&extractor, cli).await?;
    }

    Ok(())
}

/// List files in the ZIP archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just file names, one per line
/// - Verbose format (`-v`): Table with sizes, compression ratio and timestamps
async fn list_files<R: ReadAt + 'static>(extractor: &ZipExtractor<R>, verbose: bool) -> Result<()> {
    let entries = extractor.list_files().await?;

    if !verbose {
        for entry in &entries {
            println!("{}", entry.file_name);
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );

        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {}  {:>21}  {} files",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        file_count
    );

    Ok(())
}

/// Check every entry's CRC-32 and size, failing if any entry is damaged.
async fn test_archive<R: ReadAt + 'static>(extractor: &ZipExtractor<R>, cli: &Cli) -> Result<()> {
    let checks = extractor.verify().await?;

    for check in &checks {
        if !cli.is_quiet() {
            let status = if check.is_ok() { "OK" } else { "FAILED" };
            println!("    testing: {:<50} {}", check.file_name, status);
        }
    }

    let failed = checks.iter().filter(|c| !c.is_ok()).count();
    if failed > 0 {
        bail!(
            "{} of {} entries in {} failed the integrity check",
            failed,
            checks.len(),
            cli.archive
        );
    }

    if !cli.is_very_quiet() {
        println!("No errors detected in {}", cli.archive);
    }

    Ok(())
}

/// Percentage saved by compression, as shown in the verbose listing.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 {
        format!(
            "{:>4}%",
            100u64.saturating_sub(compressed * 100 / uncompressed)
        )
    } else {
        "  0%".to_string()
    }
}

/// Format a byte size into a human-readable string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
