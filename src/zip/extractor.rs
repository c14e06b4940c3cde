use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Outcome of checking one entry against its recorded CRC-32 and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCheck {
    pub file_name: String,
    pub expected_crc32: u32,
    pub actual_crc32: u32,
    pub size_matches: bool,
}

impl EntryCheck {
    pub fn is_ok(&self) -> bool {
        self.size_matches && self.expected_crc32 == self.actual_crc32
    }
}

/// ZIP file reader for stored archives
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Read an entry's raw bytes without checking them
    async fn read_stored(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.compression_method != CompressionMethod::Stored {
            bail!(
                "Unsupported compression method {} for {} (only STORED is supported)",
                entry.compression_method.as_u16(),
                entry.file_name
            );
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        let archive_size = self.parser.reader().size();
        if data_offset
            .checked_add(entry.compressed_size)
            .is_none_or(|end| end > archive_size)
        {
            bail!(
                "{}: data ({} bytes at {}) runs past the end of the archive ({} bytes)",
                entry.file_name,
                entry.compressed_size,
                data_offset,
                archive_size
            );
        }

        let mut buf = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut buf)
            .await?;

        Ok(buf)
    }

    /// Extract file data to memory, rejecting data that fails its CRC-32
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let data = self.read_stored(entry).await?;
        let check = check_entry(entry, &data);
        if !check.is_ok() {
            bail!(
                "{}: bad CRC or size (expected crc {:08x}, got {:08x})",
                entry.file_name,
                check.expected_crc32,
                check.actual_crc32
            );
        }
        Ok(data)
    }

    /// Extract file to disk, creating parent directories as needed
    pub async fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let data = self.extract_to_memory(entry).await?;

        let mut file = fs::File::create(output_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        Ok(())
    }

    /// Check every entry's data against the central directory.
    ///
    /// Structural errors (bad signatures, unsupported methods) fail the
    /// whole call; content mismatches are reported per entry.
    pub async fn verify(&self) -> Result<Vec<EntryCheck>> {
        let entries = self.list_files().await?;
        let mut checks = Vec::with_capacity(entries.len());

        for entry in &entries {
            let data = self.read_stored(entry).await?;
            let check = check_entry(entry, &data);
            if check.is_ok() {
                debug!(entry = %entry.file_name, "entry ok");
            } else {
                warn!(
                    entry = %entry.file_name,
                    expected = %format!("{:08x}", check.expected_crc32),
                    actual = %format!("{:08x}", check.actual_crc32),
                    "entry failed integrity check"
                );
            }
            checks.push(check);
        }

        Ok(checks)
    }
}

fn check_entry(entry: &ZipFileEntry, data: &[u8]) -> EntryCheck {
    EntryCheck {
        file_name: entry.file_name.clone(),
        expected_crc32: entry.crc32,
        actual_crc32: crc32fast::hash(data),
        size_matches: data.len() as u64 == entry.uncompressed_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::zip::{ArchiveFile, pack};

    fn extractor_for(bytes: Vec<u8>) -> ZipExtractor<MemoryReader> {
        ZipExtractor::new(Arc::new(MemoryReader::new(bytes)))
    }

    #[tokio::test]
    async fn test_verify_clean_archive() {
        let archive = pack(&[
            ArchiveFile::new("a.txt", "hello"),
            ArchiveFile::new("empty.txt", ""),
        ])
        .unwrap();
        let checks = extractor_for(archive.into_bytes()).verify().await.unwrap();

        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(EntryCheck::is_ok));
    }

    #[tokio::test]
    async fn test_corrupted_content_is_detected() {
        let archive = pack(&[ArchiveFile::new("a.txt", "hello")]).unwrap();
        let mut bytes = archive.into_bytes();
        // flip the first content byte: 30-byte header + 5-byte name
        bytes[35] ^= 0x20;

        let extractor = extractor_for(bytes);
        let checks = extractor.verify().await.unwrap();
        assert!(!checks[0].is_ok());
        assert_eq!(checks[0].expected_crc32, 0x3610A686);

        let entries = extractor.list_files().await.unwrap();
        assert!(extractor.extract_to_memory(&entries[0]).await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_entry_is_rejected_before_reading() {
        let archive = pack(&[ArchiveFile::new("a.txt", "hello")]).unwrap();
        let mut bytes = archive.into_bytes();
        // compressed size of the first directory record, which starts at 40
        bytes[60..64].copy_from_slice(&0x7FFF_FFFFu32.to_le_bytes());

        let extractor = extractor_for(bytes);
        let entries = extractor.list_files().await.unwrap();
        assert_eq!(entries[0].compressed_size, 0x7FFF_FFFF);

        let err = extractor.extract_to_memory(&entries[0]).await.unwrap_err();
        assert!(err.to_string().contains("runs past the end of the archive"));

        let err = extractor.verify().await.unwrap_err();
        assert!(err.to_string().contains("runs past the end of the archive"));
    }

    #[tokio::test]
    async fn test_extract_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let archive = pack(&[ArchiveFile::new("reports/2024.csv", "a;b\n1;2\n")]).unwrap();
        let extractor = extractor_for(archive.into_bytes());
        let entries = extractor.list_files().await.unwrap();

        let out = dir.path().join(&entries[0].file_name);
        extractor.extract_to_file(&entries[0], &out).await.unwrap();
        assert_eq!(std::fs::read(out).unwrap(), b"a;b\n1;2\n");
    }
}
