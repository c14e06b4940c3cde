use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::Cursor;

use anyhow::{Result, bail};

/// Version needed to extract (and made by): 2.0
pub const VERSION: u16 = 20;

/// General purpose flag bit 11: file name is UTF-8
pub const FLAG_UTF8: u16 = 0x0800;

/// Largest entry count the 16-bit EOCD fields can carry
pub const MAX_ENTRIES: u64 = u16::MAX as u64;

/// ZIP64 End of Central Directory Locator, 20 bytes right before the EOCD
pub const ZIP64_LOCATOR_SIGNATURE: u32 = 0x07064B50;
pub const ZIP64_LOCATOR_SIZE: usize = 20;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// General purpose flags for an entry name: bit 11 for non-ASCII names only.
pub fn name_flags(name: &str) -> u16 {
    if name.is_ascii() { 0 } else { FLAG_UTF8 }
}

/// Local File Header (LFH) - 30 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub flags: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    pub const SIGNATURE: u32 = 0x04034B50;
    pub const SIZE: usize = 30;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        LittleEndian::write_u32(&mut buf[0..4], Self::SIGNATURE);
        LittleEndian::write_u16(&mut buf[4..6], VERSION);
        LittleEndian::write_u16(&mut buf[6..8], self.flags);
        LittleEndian::write_u16(&mut buf[8..10], CompressionMethod::Stored.as_u16());
        // 10..14: last-mod time and date stay zero
        LittleEndian::write_u32(&mut buf[14..18], self.crc32);
        LittleEndian::write_u32(&mut buf[18..22], self.compressed_size);
        LittleEndian::write_u32(&mut buf[22..26], self.uncompressed_size);
        LittleEndian::write_u16(&mut buf[26..28], self.file_name_length);
        LittleEndian::write_u16(&mut buf[28..30], self.extra_field_length);
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || LittleEndian::read_u32(&data[0..4]) != Self::SIGNATURE {
            bail!("Invalid Local File Header");
        }

        let mut cursor = Cursor::new(&data[6..]);
        let flags = cursor.read_u16::<LittleEndian>()?;
        cursor.set_position(8);

        Ok(Self {
            flags,
            crc32: cursor.read_u32::<LittleEndian>()?,
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>()?,
            file_name_length: cursor.read_u16::<LittleEndian>()?,
            extra_field_length: cursor.read_u16::<LittleEndian>()?,
        })
    }
}

/// Metadata of one packed entry, recorded while its local header is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub name: String,
    pub flags: u16,
    /// Offset of the local file header from the start of the archive
    pub local_header_offset: u32,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

/// Central Directory File Header (CDFH) - 46 bytes + file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryRecord<'a> {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name: &'a str,
    pub local_header_offset: u32,
}

impl<'a> From<&'a EntryRecord> for CentralDirectoryRecord<'a> {
    fn from(entry: &'a EntryRecord) -> Self {
        Self {
            version_made_by: VERSION,
            version_needed: VERSION,
            flags: entry.flags,
            compression_method: CompressionMethod::Stored,
            last_mod_time: 0,
            last_mod_date: 0,
            crc32: entry.crc32,
            compressed_size: entry.compressed_size,
            uncompressed_size: entry.uncompressed_size,
            file_name: &entry.name,
            local_header_offset: entry.local_header_offset,
        }
    }
}

impl CentralDirectoryRecord<'_> {
    pub const SIGNATURE: u32 = 0x02014B50;
    pub const SIZE: usize = 46;

    /// Encoded length including the file name.
    pub fn encoded_len(&self) -> usize {
        Self::SIZE + self.file_name.len()
    }

    /// Append the record to `out`.
    ///
    /// The file name length must already fit in 16 bits (see
    /// [`validate_name`](super::validate_name)); the extra field, comment,
    /// disk number and attributes are always zero.
    pub(crate) fn write_into(&self, out: &mut Vec<u8>) {
        debug_assert!(self.file_name.len() <= u16::MAX as usize);

        let mut buf = [0u8; Self::SIZE];
        LittleEndian::write_u32(&mut buf[0..4], Self::SIGNATURE);
        LittleEndian::write_u16(&mut buf[4..6], self.version_made_by);
        LittleEndian::write_u16(&mut buf[6..8], self.version_needed);
        LittleEndian::write_u16(&mut buf[8..10], self.flags);
        LittleEndian::write_u16(&mut buf[10..12], self.compression_method.as_u16());
        LittleEndian::write_u16(&mut buf[12..14], self.last_mod_time);
        LittleEndian::write_u16(&mut buf[14..16], self.last_mod_date);
        LittleEndian::write_u32(&mut buf[16..20], self.crc32);
        LittleEndian::write_u32(&mut buf[20..24], self.compressed_size);
        LittleEndian::write_u32(&mut buf[24..28], self.uncompressed_size);
        LittleEndian::write_u16(&mut buf[28..30], self.file_name.len() as u16);
        // 30..42: extra length, comment length, disk start, internal and
        // external attributes are all zero
        LittleEndian::write_u32(&mut buf[42..46], self.local_header_offset);

        out.extend_from_slice(&buf);
        out.extend_from_slice(self.file_name.as_bytes());
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: u32 = 0x06054B50;
    pub const SIZE: usize = 22;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        LittleEndian::write_u32(&mut buf[0..4], Self::SIGNATURE);
        LittleEndian::write_u16(&mut buf[4..6], self.disk_number);
        LittleEndian::write_u16(&mut buf[6..8], self.disk_with_cd);
        LittleEndian::write_u16(&mut buf[8..10], self.disk_entries);
        LittleEndian::write_u16(&mut buf[10..12], self.total_entries);
        LittleEndian::write_u32(&mut buf[12..16], self.cd_size);
        LittleEndian::write_u32(&mut buf[16..20], self.cd_offset);
        LittleEndian::write_u16(&mut buf[20..22], self.comment_len);
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || LittleEndian::read_u32(&data[0..4]) != Self::SIGNATURE {
            bail!("Invalid End of Central Directory");
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// Whether any field holds its maximum value.
    ///
    /// A saturated field only means ZIP64 when a [`ZIP64_LOCATOR_SIGNATURE`]
    /// record precedes the EOCD; 65535 is otherwise a real entry count.
    pub fn has_saturated_fields(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }

    pub fn is_multi_disk(&self) -> bool {
        self.disk_number != 0 || self.disk_with_cd != 0 || self.disk_entries != self.total_entries
    }
}

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub is_directory: bool,
}

impl ZipFileEntry {
    /// Whether the name was declared UTF-8 (general purpose bit 11)
    pub fn is_utf8(&self) -> bool {
        self.flags & FLAG_UTF8 != 0
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}
