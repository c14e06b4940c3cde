use std::sync::Arc;

use packzip::io::{read_source, write_archive};
use packzip::{ArchiveFile, LocalFileReader, ZipExtractor, pack};

#[tokio::test]
async fn pack_write_and_read_back_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("report.pdf");
    let csv = dir.path().join("report.csv");
    std::fs::write(&pdf, b"%PDF-1.7 fake report").unwrap();
    std::fs::write(&csv, b"date,amount\n2024-01-31,12.50\n").unwrap();

    let files = vec![
        ArchiveFile::new("report.pdf", read_source(&pdf).await.unwrap()),
        ArchiveFile::new("report.csv", read_source(&csv).await.unwrap()),
    ];
    let archive = tokio::task::spawn_blocking(move || pack(&files))
        .await
        .unwrap()
        .unwrap();

    let out = dir.path().join("share/bundle.zip");
    let written = write_archive(&out, archive.as_bytes(), false).await.unwrap();
    assert_eq!(written, archive.len() as u64);

    let extractor = ZipExtractor::new(Arc::new(LocalFileReader::new(&out).unwrap()));
    let checks = extractor.verify().await.unwrap();
    assert_eq!(checks.len(), 2);
    assert!(checks.iter().all(|c| c.is_ok()));

    let entries = extractor.list_files().await.unwrap();
    assert_eq!(
        extractor.extract_to_memory(&entries[1]).await.unwrap(),
        b"date,amount\n2024-01-31,12.50\n"
    );
}

#[tokio::test]
async fn independent_archives_pack_concurrently() {
    let tasks: Vec<_> = (0..8)
        .map(|i| {
            tokio::task::spawn_blocking(move || {
                let files = vec![ArchiveFile::new(format!("export-{i}.csv"), vec![i as u8; 1000])];
                pack(&files).map(|a| a.into_bytes())
            })
        })
        .collect();

    let mut outputs = Vec::new();
    for task in tasks {
        outputs.push(task.await.unwrap().unwrap());
    }

    let again = pack(&[ArchiveFile::new("export-3.csv", vec![3u8; 1000])])
        .unwrap()
        .into_bytes();
    assert_eq!(outputs[3], again);
}
