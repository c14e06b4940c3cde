//! Low-level ZIP archive parser.
//!
//! This module reads back the format subset the assembler writes (single
//! disk, no ZIP64) from any source implementing [`ReadAt`]. It follows the
//! usual strategy of starting from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. Read the Central Directory to get metadata for all files
//! 3. For extraction, read each file's Local File Header to locate its data

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Parser over a random-access archive source.
///
/// Typically used through [`ZipExtractor`](super::ZipExtractor).
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Archives written by this crate keep the EOCD in the last 22 bytes;
    /// archives from other tools may carry a trailing comment, in which case
    /// the signature is searched for backwards.
    ///
    /// Returns the record and its offset in the archive.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let eocd_size = EndOfCentralDirectory::SIZE as u64;
        if self.size < eocd_size {
            bail!("Not a valid ZIP file: {} bytes is too short", self.size);
        }

        let offset = self.size - eocd_size;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.reader.read_exact_at(offset, &mut buf).await?;

        if let Ok(eocd) = EndOfCentralDirectory::from_bytes(&buf) {
            if eocd.comment_len == 0 {
                return Ok((eocd, offset));
            }
        }

        let search_size = (MAX_COMMENT_SIZE + eocd_size).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        let signature = EndOfCentralDirectory::SIGNATURE.to_le_bytes();
        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if buf[i..i + 4] != signature {
                continue;
            }
            // The comment must run exactly to the end of the file.
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd = EndOfCentralDirectory::from_bytes(&buf[i..])?;
                return Ok((eocd, search_start + i as u64));
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// Whether a ZIP64 EOCD locator sits immediately before the EOCD.
    async fn has_zip64_locator(&self, eocd_offset: u64) -> Result<bool> {
        let Some(locator_offset) = eocd_offset.checked_sub(ZIP64_LOCATOR_SIZE as u64) else {
            return Ok(false);
        };

        let mut signature = [0u8; 4];
        self.reader
            .read_exact_at(locator_offset, &mut signature)
            .await?;
        Ok(LittleEndian::read_u32(&signature) == ZIP64_LOCATOR_SIGNATURE)
    }

    /// List all entries from the Central Directory.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        if eocd.has_saturated_fields() && self.has_zip64_locator(eocd_offset).await? {
            bail!("ZIP64 archives are not supported");
        }
        if eocd.is_multi_disk() {
            bail!("Multi-disk archives are not supported");
        }

        let cd_offset = eocd.cd_offset as u64;
        let cd_size = eocd.cd_size as u64;
        if cd_offset + cd_size > eocd_offset {
            bail!(
                "Central Directory ({} bytes at {}) overlaps the EOCD at {}",
                cd_size,
                cd_offset,
                eocd_offset
            );
        }

        // One read for the whole directory
        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(eocd.total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for _ in 0..eocd.total_entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        if cursor.position() != cd_size {
            bail!(
                "Central Directory holds {} bytes after {} entries",
                cd_size - cursor.position(),
                eocd.total_entries
            );
        }

        Ok(entries)
    }

    /// Offset where an entry's data begins, read from its Local File Header.
    ///
    /// The local header's name and extra field lengths may differ from the
    /// central directory copy, so they are taken from the local header.
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LocalFileHeader::SIZE];
        self.reader
            .read_exact_at(entry.lfh_offset, &mut lfh_buf)
            .await?;

        let lfh = LocalFileHeader::from_bytes(&lfh_buf)?;

        Ok(entry.lfh_offset
            + LocalFileHeader::SIZE as u64
            + lfh.file_name_length as u64
            + lfh.extra_field_length as u64)
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}

/// Parse one Central Directory File Header from the cursor.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
    let signature = cursor.read_u32::<LittleEndian>()?;
    if signature != CentralDirectoryRecord::SIGNATURE {
        bail!(
            "Invalid Central Directory File Header at offset {}",
            cursor.position() - 4
        );
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let compressed_size = cursor.read_u32::<LittleEndian>()?;
    let uncompressed_size = cursor.read_u32::<LittleEndian>()?;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let lfh_offset = cursor.read_u32::<LittleEndian>()?;

    if compressed_size == 0xFFFFFFFF || uncompressed_size == 0xFFFFFFFF || lfh_offset == 0xFFFFFFFF
    {
        bail!("ZIP64 entries are not supported");
    }

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    // Names without the UTF-8 flag are usually still ASCII; anything else
    // is shown lossily rather than rejected.
    let file_name = match String::from_utf8(file_name_bytes) {
        Ok(name) => name,
        Err(e) if flags & FLAG_UTF8 != 0 => bail!("Entry name is not valid UTF-8: {}", e),
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };

    let is_directory = file_name.ends_with('/');

    // Extra field and comment are not used
    let skip = extra_field_length as u64 + file_comment_length as u64;
    let next = cursor.position() + skip;
    if next > cursor.get_ref().len() as u64 {
        bail!("Central Directory entry for {} is truncated", file_name);
    }
    cursor.set_position(next);

    Ok(ZipFileEntry {
        file_name,
        flags,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size: compressed_size as u64,
        uncompressed_size: uncompressed_size as u64,
        crc32,
        lfh_offset: lfh_offset as u64,
        last_mod_time,
        last_mod_date,
        is_directory,
    })
}
