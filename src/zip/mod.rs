//! ZIP archive packaging and read-back.
//!
//! ## Architecture
//!
//! Writing is a pure, synchronous pipeline:
//!
//! - [`entry`]: local file header + name + raw content for one file
//! - [`central`]: central directory records and the EOCD record
//! - [`assembler`]: drives both, tracks offsets, returns the finished archive
//!
//! Reading is async over [`ReadAt`](crate::io::ReadAt) sources:
//!
//! - [`structures`]: fixed-layout records shared by both directions
//! - [`parser`]: EOCD lookup and central directory parsing
//! - [`extractor`]: entry extraction and integrity checks
//!
//! ## Layout produced
//!
//! 1. Local file header and stored data for each file, in input order
//! 2. Central Directory with one record per file, same order
//! 3. End of Central Directory (EOCD) record, the final 22 bytes
//!
//! ## Limits
//!
//! - STORED (method 0) only; no compression
//! - No ZIP64: every entry, the central directory and the archive itself stay
//!   below 4 GiB, and an archive holds at most 65535 entries
//! - No encryption, no multi-disk archives
//! - Timestamps are always zero so output is reproducible

mod assembler;
mod central;
mod entry;
mod extractor;
mod parser;
mod structures;

pub use assembler::{Archive, ArchiveAssembler, ArchiveFile, pack};
pub use central::{build_central_directory, write_end_of_central_directory};
pub use entry::{EncodedEntry, encode_entry, validate_name};
pub use extractor::{EntryCheck, ZipExtractor};
pub use parser::ZipParser;
pub use structures::*;
