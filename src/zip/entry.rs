//! Local file header encoding.
//!
//! Each entry is written as a 30-byte [`LocalFileHeader`], the UTF-8 file
//! name and the raw content. Nothing is compressed (method 0), no extra
//! field is emitted and timestamps are left at zero so the same input always
//! yields the same bytes.

use tracing::trace;

use crate::error::{PackError, Result, fit_u32};

use super::structures::{EntryRecord, LocalFileHeader, name_flags};

/// One encoded entry: its bytes and the metadata the central directory needs.
#[derive(Debug, Clone)]
pub struct EncodedEntry {
    pub bytes: Vec<u8>,
    pub record: EntryRecord,
}

/// Check that `name` can be stored verbatim in a ZIP header.
///
/// Path policy (separators, `..`, absolute paths) is left to whoever picks
/// the names.
pub fn validate_name(name: &str) -> Result<u16> {
    if name.is_empty() {
        return Err(PackError::Input("entry name is empty".to_string()));
    }

    if name.contains('\0') {
        return Err(PackError::Encoding(format!(
            "entry name {:?} contains a NUL character",
            name
        )));
    }

    u16::try_from(name.len()).map_err(|_| {
        PackError::Encoding(format!(
            "entry name is {} bytes long, the header allows at most {}",
            name.len(),
            u16::MAX
        ))
    })
}

/// Encode a single entry whose local header will start at `offset`.
pub fn encode_entry(name: &str, content: &[u8], offset: u64) -> Result<EncodedEntry> {
    let file_name_length = validate_name(name)?;
    let size = fit_u32("entry size", content.len() as u64)?;
    let local_header_offset = fit_u32("local header offset", offset)?;

    let crc32 = crc32fast::hash(content);
    let flags = name_flags(name);

    let header = LocalFileHeader {
        flags,
        crc32,
        compressed_size: size,
        uncompressed_size: size,
        file_name_length,
        extra_field_length: 0,
    };

    let mut bytes = Vec::with_capacity(LocalFileHeader::SIZE + name.len() + content.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(name.as_bytes());
    bytes.extend_from_slice(content);

    trace!(entry = name, offset, size, crc32 = %format!("{crc32:08x}"), "encoded entry");

    Ok(EncodedEntry {
        bytes,
        record: EntryRecord {
            name: name.to_string(),
            flags,
            local_header_offset,
            crc32,
            compressed_size: size,
            uncompressed_size: size,
        },
    })
}
