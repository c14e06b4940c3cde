//! Archives read back by an independent ZIP implementation.

use std::io::{Cursor, Read};

use packzip::{ArchiveFile, pack};

#[test]
fn zip_crate_reads_packed_archive() {
    let files = vec![
        ArchiveFile::new("rapport-mars.pdf", b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n".to_vec()),
        ArchiveFile::new("données/mars.csv", "date,libellé,montant\n2024-03-01,Loyer,-850.00\n"),
        ArchiveFile::new("notes/empty.txt", ""),
    ];
    let archive = pack(&files).unwrap();

    let mut reader = zip::ZipArchive::new(Cursor::new(archive.into_bytes())).unwrap();
    assert_eq!(reader.len(), files.len());

    for (i, expected) in files.iter().enumerate() {
        let mut entry = reader.by_index(i).unwrap();
        assert_eq!(entry.name(), expected.name);
        assert_eq!(entry.compression(), zip::CompressionMethod::Stored);
        assert_eq!(entry.size(), expected.content.len() as u64);

        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, expected.content);
    }

    let empty = reader.by_name("notes/empty.txt").unwrap();
    assert_eq!(empty.size(), 0);
    assert_eq!(empty.compressed_size(), 0);
}

#[test]
fn zip_crate_reads_single_entry_archive() {
    let archive = pack(&[ArchiveFile::new("a.txt", "hello")]).unwrap();

    let mut reader = zip::ZipArchive::new(Cursor::new(archive.as_bytes())).unwrap();
    let mut entry = reader.by_index(0).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();

    assert_eq!(entry.name(), "a.txt");
    assert_eq!(entry.crc32(), 0x3610A686);
    assert_eq!(content, "hello");
}
