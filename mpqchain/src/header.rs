//! MPQ archive header parsing

use crate::{is_power_of_two, signatures, Error, FormatVersion, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

/// Size of the version 0 header
pub const MPQ_HEADER_SIZE_V1: u32 = 0x20;

/// Size of the version 1 header
pub const MPQ_HEADER_SIZE_V2: u32 = 0x2C;

/// Largest sector size exponent accepted (512 << 23 = 4 GiB)
pub const MAX_SECTOR_SIZE_SHIFT: u16 = 23;

/// MPQ archive header
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MpqHeader {
    /// MPQ header signature, must be MPQ\x1A
    pub signature: u32,

    /// Size of the header in bytes
    pub header_size: u32,

    /// Size of the archive in bytes
    pub archive_size: u32,

    /// MPQ format version
    pub format_version: u16,

    /// Sector size as a power of 2 multiple of 512
    pub sector_size_shift: u16,

    /// Offset to the hash table from the beginning of the archive
    pub hash_table_offset: u32,

    /// Offset to the block table from the beginning of the archive
    pub block_table_offset: u32,

    /// Number of entries in the hash table
    pub hash_table_entries: u32,

    /// Number of entries in the block table
    pub block_table_entries: u32,

    // Fields below are present from format version 1
    /// Offset of the hi-block table, zero when absent
    pub hi_block_table_offset: Option<i64>,

    /// High 16 bits of the hash table offset
    pub hash_table_offset_high: Option<u16>,

    /// High 16 bits of the block table offset
    pub block_table_offset_high: Option<u16>,
}

impl MpqHeader {
    /// Read an MPQ header from a reader positioned at the archive start
    ///
    /// Checks the signature and the format version; table sizes are checked
    /// by [`MpqHeader::validate`].
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let signature = reader.read_u32::<LittleEndian>()?;
        match signature {
            signatures::MPQ_ARCHIVE => {}
            signatures::MPQ_USERDATA => {
                return Err(Error::invalid_format(
                    "archives behind a user data header are not supported",
                ));
            }
            other => {
                return Err(Error::invalid_format(format!(
                    "bad signature 0x{other:08X}"
                )));
            }
        }

        let header_size = reader.read_u32::<LittleEndian>()?;
        let archive_size = reader.read_u32::<LittleEndian>()?;
        let format_version = reader.read_u16::<LittleEndian>()?;
        let sector_size_shift = reader.read_u16::<LittleEndian>()?;
        let hash_table_offset = reader.read_u32::<LittleEndian>()?;
        let block_table_offset = reader.read_u32::<LittleEndian>()?;
        let hash_table_entries = reader.read_u32::<LittleEndian>()?;
        let block_table_entries = reader.read_u32::<LittleEndian>()?;

        let version =
            FormatVersion::from_raw(format_version).ok_or(Error::UnsupportedVersion(format_version))?;

        let mut header = MpqHeader {
            signature,
            header_size,
            archive_size,
            format_version,
            sector_size_shift,
            hash_table_offset,
            block_table_offset,
            hash_table_entries,
            block_table_entries,
            hi_block_table_offset: None,
            hash_table_offset_high: None,
            block_table_offset_high: None,
        };

        if version >= FormatVersion::V2 {
            if header_size < MPQ_HEADER_SIZE_V2 {
                return Err(Error::invalid_format(format!(
                    "header size {header_size} too small for format version {format_version}"
                )));
            }
            header.hi_block_table_offset = Some(reader.read_i64::<LittleEndian>()?);
            header.hash_table_offset_high = Some(reader.read_u16::<LittleEndian>()?);
            header.block_table_offset_high = Some(reader.read_u16::<LittleEndian>()?);
        }

        log::debug!(
            "MPQ header: version {}, sector shift {}, {} hash entries, {} block entries",
            format_version,
            sector_size_shift,
            hash_table_entries,
            block_table_entries
        );

        Ok(header)
    }

    /// Check table sizes and the sector size
    ///
    /// The hash table must hold a power-of-two number of entries. The block
    /// table must too unless `strict_block_table` is false.
    pub fn validate(&self, strict_block_table: bool) -> Result<()> {
        if !is_power_of_two(self.hash_table_entries) {
            return Err(Error::invalid_format(format!(
                "hash table size {} is not a power of two",
                self.hash_table_entries
            )));
        }

        if strict_block_table && !is_power_of_two(self.block_table_entries) {
            return Err(Error::invalid_format(format!(
                "block table size {} is not a power of two",
                self.block_table_entries
            )));
        }

        if self.sector_size_shift > MAX_SECTOR_SIZE_SHIFT {
            return Err(Error::invalid_format(format!(
                "sector size shift {} out of range",
                self.sector_size_shift
            )));
        }

        Ok(())
    }

    /// Parsed format version
    pub fn version(&self) -> FormatVersion {
        FormatVersion::from_raw(self.format_version).unwrap_or(FormatVersion::V1)
    }

    /// Sector size in bytes
    pub fn sector_size(&self) -> usize {
        crate::calculate_sector_size(self.sector_size_shift)
    }

    /// Full hash table offset, including the high bits of version 1 headers
    pub fn hash_table_pos(&self) -> u64 {
        let high = self.hash_table_offset_high.unwrap_or(0) as u64;
        (high << 32) | self.hash_table_offset as u64
    }

    /// Full block table offset, including the high bits of version 1 headers
    pub fn block_table_pos(&self) -> u64 {
        let high = self.block_table_offset_high.unwrap_or(0) as u64;
        (high << 32) | self.block_table_offset as u64
    }

    /// Offset of the hi-block table, if the archive has one
    pub fn hi_block_table_pos(&self) -> Option<u64> {
        match self.hi_block_table_offset {
            Some(offset) if offset > 0 => Some(offset as u64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    fn raw_header(version: u16, hash_entries: u32, block_entries: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        let size = if version == 0 {
            MPQ_HEADER_SIZE_V1
        } else {
            MPQ_HEADER_SIZE_V2
        };
        buf.write_u32::<LittleEndian>(signatures::MPQ_ARCHIVE).unwrap();
        buf.write_u32::<LittleEndian>(size).unwrap();
        buf.write_u32::<LittleEndian>(0x1000).unwrap();
        buf.write_u16::<LittleEndian>(version).unwrap();
        buf.write_u16::<LittleEndian>(3).unwrap();
        buf.write_u32::<LittleEndian>(0x200).unwrap();
        buf.write_u32::<LittleEndian>(0x300).unwrap();
        buf.write_u32::<LittleEndian>(hash_entries).unwrap();
        buf.write_u32::<LittleEndian>(block_entries).unwrap();
        if version == 1 {
            buf.write_i64::<LittleEndian>(0x4000).unwrap();
            buf.write_u16::<LittleEndian>(1).unwrap();
            buf.write_u16::<LittleEndian>(2).unwrap();
        }
        buf
    }

    #[test]
    fn test_read_v0_header() {
        let header = MpqHeader::read(&mut Cursor::new(raw_header(0, 16, 8))).unwrap();
        assert_eq!(header.format_version, 0);
        assert_eq!(header.version(), FormatVersion::V1);
        assert_eq!(header.sector_size(), 4096);
        assert_eq!(header.hash_table_pos(), 0x200);
        assert_eq!(header.block_table_pos(), 0x300);
        assert_eq!(header.hi_block_table_pos(), None);
        header.validate(true).unwrap();
    }

    #[test]
    fn test_read_v1_extension() {
        let header = MpqHeader::read(&mut Cursor::new(raw_header(1, 16, 8))).unwrap();
        assert_eq!(header.version(), FormatVersion::V2);
        assert_eq!(header.hi_block_table_offset, Some(0x4000));
        assert_eq!(header.hi_block_table_pos(), Some(0x4000));
        assert_eq!(header.hash_table_pos(), 0x1_0000_0200);
        assert_eq!(header.block_table_pos(), 0x2_0000_0300);
    }

    #[test]
    fn test_invalid_signature() {
        let mut raw = raw_header(0, 16, 8);
        raw[0] = 0xFF;
        let err = MpqHeader::read(&mut Cursor::new(raw)).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_user_data_shunt_rejected() {
        let mut raw = raw_header(0, 16, 8);
        raw[3] = 0x1B;
        let err = MpqHeader::read(&mut Cursor::new(raw)).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_unsupported_version() {
        let mut raw = raw_header(0, 16, 8);
        raw[12] = 2;
        let err = MpqHeader::read(&mut Cursor::new(raw)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(2)));
    }

    #[test]
    fn test_truncated_header_is_io_error() {
        let raw = raw_header(0, 16, 8);
        let err = MpqHeader::read(&mut Cursor::new(&raw[..20])).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_table_sizes_must_be_powers_of_two() {
        let header = MpqHeader::read(&mut Cursor::new(raw_header(0, 12, 8))).unwrap();
        assert!(header.validate(true).is_err());

        let header = MpqHeader::read(&mut Cursor::new(raw_header(0, 16, 3))).unwrap();
        assert!(header.validate(true).is_err());
        header.validate(false).unwrap();
    }
}
