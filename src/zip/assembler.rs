//! Archive assembly.
//!
//! The assembler appends encoded entries to a single buffer while tracking
//! where each local header starts, then closes the archive with the central
//! directory and the EOCD record. The output only depends on the ordered
//! input, so packing the same files twice gives identical bytes.

use tracing::debug;

use crate::error::{PackError, Result, fit_u32};

use super::central::{build_central_directory, write_end_of_central_directory};
use super::entry::encode_entry;
use super::structures::{
    CentralDirectoryRecord, EndOfCentralDirectory, EntryRecord, LocalFileHeader, MAX_ENTRIES,
};

/// A file to be placed in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    /// Archive-relative path, stored as UTF-8
    pub name: String,
    pub content: Vec<u8>,
}

impl ArchiveFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A complete, valid archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    bytes: Vec<u8>,
    entry_count: usize,
}

impl Archive {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for Archive {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Incremental archive builder.
///
/// A rejected [`push`](Self::push) leaves the assembler untouched, and the
/// buffer is only handed out by [`finish`](Self::finish), so callers never
/// observe a partially written archive.
#[derive(Debug, Default)]
pub struct ArchiveAssembler {
    buffer: Vec<u8>,
    entries: Vec<EntryRecord>,
}

impl ArchiveAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assembler whose buffer already has room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            entries: Vec::new(),
        }
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one entry after the ones already pushed.
    pub fn push(&mut self, name: &str, content: &[u8]) -> Result<()> {
        let count = self.entries.len() as u64 + 1;
        if count > MAX_ENTRIES {
            return Err(PackError::SizeOverflow {
                field: "entry count",
                value: count,
                limit: MAX_ENTRIES,
            });
        }

        let offset = self.buffer.len() as u64;
        let entry = encode_entry(name, content, offset)?;
        fit_u32("archive size", offset + entry.bytes.len() as u64)?;

        self.buffer.extend_from_slice(&entry.bytes);
        self.entries.push(entry.record);
        Ok(())
    }

    /// Close the archive with its central directory and EOCD record.
    pub fn finish(self) -> Result<Archive> {
        let Self {
            mut buffer,
            entries,
        } = self;

        if entries.is_empty() {
            return Err(PackError::Input("no files to pack".to_string()));
        }

        let cd_offset = buffer.len() as u64;
        let central_directory = build_central_directory(&entries)?;
        let cd_size = central_directory.len() as u64;
        let eocd = write_end_of_central_directory(entries.len(), cd_size, cd_offset)?;
        fit_u32(
            "archive size",
            cd_offset + cd_size + EndOfCentralDirectory::SIZE as u64,
        )?;

        buffer.extend_from_slice(&central_directory);
        buffer.extend_from_slice(&eocd);

        debug!(
            entries = entries.len(),
            cd_offset,
            cd_size,
            size = buffer.len(),
            "assembled archive"
        );

        Ok(Archive {
            bytes: buffer,
            entry_count: entries.len(),
        })
    }
}

/// Exact encoded size of an archive holding `files`.
fn archive_size(files: &[ArchiveFile]) -> u64 {
    let per_entry: u64 = files
        .iter()
        .map(|f| {
            let name = f.name.len() as u64;
            (LocalFileHeader::SIZE + CentralDirectoryRecord::SIZE) as u64
                + 2 * name
                + f.content.len() as u64
        })
        .sum();
    per_entry + EndOfCentralDirectory::SIZE as u64
}

/// Pack `files`, in order, into a single store-only ZIP archive.
///
/// # Errors
///
/// - [`PackError::Input`] if `files` is empty or a name is empty
/// - [`PackError::Encoding`] if a name cannot be stored in a header
/// - [`PackError::SizeOverflow`] if the archive needs ZIP64 (an entry, the
///   central directory or the whole archive over 4 GiB, or more than 65535
///   entries)
pub fn pack(files: &[ArchiveFile]) -> Result<Archive> {
    if files.is_empty() {
        return Err(PackError::Input("no files to pack".to_string()));
    }

    let expected = archive_size(files);
    fit_u32("archive size", expected)?;

    let mut assembler = ArchiveAssembler::with_capacity(expected as usize);
    for file in files {
        assembler.push(&file.name, &file.content)?;
    }
    assembler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn read_u16(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes(bytes[at..at + 2].try_into().unwrap())
    }

    #[test]
    fn test_two_file_layout() {
        let archive = pack(&[
            ArchiveFile::new("a.txt", "hello"),
            ArchiveFile::new("b.txt", "world"),
        ])
        .unwrap();
        let bytes = archive.as_bytes();

        // two local entries of 30 + 5 + 5, two directory records of 46 + 5
        assert_eq!(archive.len(), 2 * 40 + 2 * 51 + 22);
        assert_eq!(archive.entry_count(), 2);

        assert_eq!(&bytes[0..4], b"PK\x03\x04");
        assert_eq!(&bytes[40..44], b"PK\x03\x04");
        assert_eq!(&bytes[80..84], b"PK\x01\x02");
        assert_eq!(read_u32(bytes, 80 + 42), 0);
        assert_eq!(read_u32(bytes, 131 + 42), 40);

        let eocd = &bytes[bytes.len() - 22..];
        assert_eq!(&eocd[0..4], b"PK\x05\x06");
        assert_eq!(read_u16(eocd, 10), 2);
        assert_eq!(read_u32(eocd, 12), 102);
        assert_eq!(read_u32(eocd, 16), 80);
    }

    #[test]
    fn test_reserved_size_matches_output() {
        let files = vec![
            ArchiveFile::new("report.pdf", vec![7u8; 1000]),
            ArchiveFile::new("données.csv", "date;montant\n"),
        ];
        let archive = pack(&files).unwrap();
        assert_eq!(archive.len() as u64, archive_size(&files));
    }

    #[test]
    fn test_pack_empty_list() {
        assert!(matches!(pack(&[]), Err(PackError::Input(_))));
    }

    #[test]
    fn test_finish_without_entries() {
        assert!(matches!(
            ArchiveAssembler::new().finish(),
            Err(PackError::Input(_))
        ));
    }

    #[test]
    fn test_rejected_push_leaves_assembler_unchanged() {
        let mut assembler = ArchiveAssembler::new();
        assembler.push("a.txt", b"hello").unwrap();
        assert!(assembler.push("", b"oops").is_err());
        assert_eq!(assembler.len(), 1);

        let archive = assembler.finish().unwrap();
        let direct = pack(&[ArchiveFile::new("a.txt", "hello")]).unwrap();
        assert_eq!(archive, direct);
    }

    #[test]
    fn test_invalid_name_fails_whole_pack() {
        let result = pack(&[
            ArchiveFile::new("ok.txt", "fine"),
            ArchiveFile::new("", "nameless"),
        ]);
        assert!(matches!(result, Err(PackError::Input(_))));
    }
}
