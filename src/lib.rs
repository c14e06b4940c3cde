//! # packzip
//!
//! Deterministic, uncompressed ZIP packaging for small in-memory files.
//!
//! The core is [`pack`]: it turns an ordered list of `(name, bytes)` pairs,
//! typically a generated report PDF and its CSV export, into one ZIP archive
//! that any standard tool can open. The transformation is pure: no I/O, no
//! timestamps, no shared state, so identical input always produces identical
//! bytes and calls can run concurrently on any thread.
//!
//! ## Features
//!
//! - STORED (method 0) entries with real CRC-32 checksums
//! - UTF-8 flag (bit 11) declared for non-ASCII names
//! - Hard failure instead of silent truncation when an archive would need
//!   ZIP64 (anything over 4 GiB or 65535 entries)
//! - Read-back of the same format subset for listing and integrity checks
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use packzip::{ArchiveFile, MemoryReader, ZipExtractor, pack};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let archive = pack(&[
//!         ArchiveFile::new("a.txt", "hello"),
//!         ArchiveFile::new("b.txt", "world"),
//!     ])?;
//!
//!     let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(archive.into_bytes())));
//!     for entry in extractor.list_files().await? {
//!         let data = extractor.extract_to_memory(&entry).await?;
//!         println!("{}: {} bytes", entry.file_name, data.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use error::PackError;
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use zip::{Archive, ArchiveAssembler, ArchiveFile, ZipExtractor, ZipFileEntry, pack};
