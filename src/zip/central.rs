//! Central directory and end-of-central-directory encoding.

use crate::error::{Result, fit_u16, fit_u32};

use super::entry::validate_name;
use super::structures::{CentralDirectoryRecord, EndOfCentralDirectory, EntryRecord};

/// Encode one central directory record per entry, in entry order.
///
/// Readers that walk the directory and readers that scan local headers then
/// encounter the entries in the same sequence. Names are checked the same
/// way as in [`encode_entry`](super::encode_entry), since records may be
/// built by hand.
pub fn build_central_directory(entries: &[EntryRecord]) -> Result<Vec<u8>> {
    let records = entries
        .iter()
        .map(|entry| {
            validate_name(&entry.name)?;
            Ok(CentralDirectoryRecord::from(entry))
        })
        .collect::<Result<Vec<_>>>()?;

    let total: usize = records.iter().map(|r| r.encoded_len()).sum();
    let mut out = Vec::with_capacity(total);
    for record in &records {
        record.write_into(&mut out);
    }
    Ok(out)
}

/// Encode the trailing EOCD record for a single-disk archive without comment.
pub fn write_end_of_central_directory(
    entry_count: usize,
    cd_size: u64,
    cd_offset: u64,
) -> Result<[u8; EndOfCentralDirectory::SIZE]> {
    let count = fit_u16("entry count", entry_count as u64)?;

    let eocd = EndOfCentralDirectory {
        disk_number: 0,
        disk_with_cd: 0,
        disk_entries: count,
        total_entries: count,
        cd_size: fit_u32("central directory size", cd_size)?,
        cd_offset: fit_u32("central directory offset", cd_offset)?,
        comment_len: 0,
    };

    Ok(eocd.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PackError;

    fn record(name: &str, offset: u32) -> EntryRecord {
        EntryRecord {
            name: name.to_string(),
            flags: 0,
            local_header_offset: offset,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
        }
    }

    #[test]
    fn test_directory_keeps_entry_order() {
        let entries = vec![record("first.pdf", 0), record("second.csv", 39)];
        let cd = build_central_directory(&entries).unwrap();

        assert_eq!(cd.len(), 46 + 9 + 46 + 10);
        assert_eq!(&cd[46..55], b"first.pdf");
        assert_eq!(&cd[55..59], b"PK\x01\x02");
        assert_eq!(&cd[55 + 42..55 + 46], &39u32.to_le_bytes());
        assert_eq!(&cd[55 + 46..], b"second.csv");
    }

    #[test]
    fn test_empty_directory() {
        assert!(build_central_directory(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_overlong_record_name_is_rejected() {
        let entries = vec![record("ok.csv", 0), record(&"n".repeat(65536), 36)];
        assert!(matches!(
            build_central_directory(&entries),
            Err(PackError::Encoding(_))
        ));
    }

    #[test]
    fn test_eocd_fields() {
        let eocd = write_end_of_central_directory(2, 102, 80).unwrap();

        assert_eq!(&eocd[0..4], &[0x50, 0x4B, 0x05, 0x06]);
        assert_eq!(&eocd[4..8], &[0, 0, 0, 0]);
        assert_eq!(&eocd[8..12], &[2, 0, 2, 0]);
        assert_eq!(&eocd[12..16], &102u32.to_le_bytes());
        assert_eq!(&eocd[16..20], &80u32.to_le_bytes());
        assert_eq!(&eocd[20..22], &[0, 0]);
    }

    #[test]
    fn test_eocd_rejects_too_many_entries() {
        assert!(matches!(
            write_end_of_central_directory(65536, 0, 0),
            Err(PackError::SizeOverflow { field: "entry count", .. })
        ));
    }

    #[test]
    fn test_eocd_rejects_large_directory() {
        assert!(matches!(
            write_end_of_central_directory(1, 1 << 32, 0),
            Err(PackError::SizeOverflow { field: "central directory size", .. })
        ));
        assert!(matches!(
            write_end_of_central_directory(1, 0, 1 << 32),
            Err(PackError::SizeOverflow { field: "central directory offset", .. })
        ));
    }
}
