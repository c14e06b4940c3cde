use super::ReadAt;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Local file reader with random access support
pub struct LocalFileReader {
    file: std::fs::File,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            Ok(self.file.read_at(buf, offset)?)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            Ok(self.file.seek_read(buf, offset)?)
        }

        #[cfg(not(any(unix, windows)))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let mut file = &self.file;
            file.seek(SeekFrom::Start(offset))?;
            Ok(file.read(buf)?)
        }
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// Read a source file to be packed.
pub async fn read_source(path: &Path) -> Result<Vec<u8>> {
    fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))
}

/// Sibling path used while the archive is being written.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

/// Persist a finished archive at `path`.
///
/// Missing parent directories are created. An existing file is only
/// replaced when `overwrite` is set. The bytes go to a sibling `.partial`
/// file first and are renamed into place, so `path` never holds a truncated
/// archive. Returns the size found on disk after the write.
pub async fn write_archive(path: &Path, data: &[u8], overwrite: bool) -> Result<u64> {
    if fs::try_exists(path).await? && !overwrite {
        bail!("{} already exists (use -o to overwrite)", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
    }

    let partial = partial_path(path);
    if let Err(e) = write_fully(&partial, data).await {
        let _ = fs::remove_file(&partial).await;
        return Err(e);
    }
    fs::rename(&partial, path)
        .await
        .with_context(|| format!("cannot move archive into {}", path.display()))?;

    let written = fs::metadata(path)
        .await
        .with_context(|| format!("{} missing after write", path.display()))?
        .len();
    if written != data.len() as u64 {
        bail!(
            "{} holds {} bytes after write, expected {}",
            path.display(),
            written,
            data.len()
        );
    }

    debug!(path = %path.display(), size = written, "archive written");
    Ok(written)
}

async fn write_fully(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path)
        .await
        .with_context(|| format!("cannot create {}", path.display()))?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_parents_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports/2024/bundle.zip");

        let size = write_archive(&path, b"PK\x05\x06", false).await.unwrap();
        assert_eq!(size, 4);
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x05\x06");
        assert!(!partial_path(&path).exists());
    }

    #[tokio::test]
    async fn test_overwrite_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        std::fs::write(&path, b"old").unwrap();

        let err = write_archive(&path, b"new archive", false).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(std::fs::read(&path).unwrap(), b"old");

        write_archive(&path, b"new archive", true).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new archive");
    }

    #[tokio::test]
    async fn test_local_reader_reads_at_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let reader = LocalFileReader::new(&path).unwrap();
        assert_eq!(reader.size(), 10);

        let mut buf = [0u8; 3];
        reader.read_exact_at(4, &mut buf).await.unwrap();
        assert_eq!(&buf, b"456");
    }

    #[tokio::test]
    async fn test_read_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_source(&dir.path().join("nope.pdf")).await.unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
