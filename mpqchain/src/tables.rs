//! MPQ table structures (hash, block, hi-block)

use crate::crypto::{decrypt_bytes, BLOCK_TABLE_KEY, HASH_TABLE_KEY};
use crate::hash::compute_file_hashes;
use crate::{Error, Result};
use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};

/// Size of one hash or block table entry on disk
pub const TABLE_ENTRY_SIZE: usize = 16;

/// Hash table entry (16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HashEntry {
    /// The hash of the full file name (part A)
    pub name_1: u32,
    /// The hash of the full file name (part B)
    pub name_2: u32,
    /// The language of the file (Windows LANGID)
    pub locale: u16,
    /// The platform the file is used for
    pub platform: u16,
    /// Block table index or special value
    pub block_index: u32,
}

impl HashEntry {
    /// Value indicating the hash entry has never been used
    pub const EMPTY_NEVER_USED: u32 = 0xFFFFFFFF;
    /// Value indicating the hash entry was deleted
    pub const EMPTY_DELETED: u32 = 0xFFFFFFFE;

    /// Create an empty hash entry
    pub fn empty() -> Self {
        Self {
            name_1: 0,
            name_2: 0,
            locale: 0,
            platform: 0,
            block_index: Self::EMPTY_NEVER_USED,
        }
    }

    /// Check if this entry has never been used
    pub fn is_empty(&self) -> bool {
        self.block_index == Self::EMPTY_NEVER_USED
    }

    /// Check if this entry was deleted
    pub fn is_deleted(&self) -> bool {
        self.block_index == Self::EMPTY_DELETED
    }

    /// Check if this entry points at a block
    pub fn is_valid(&self) -> bool {
        self.block_index < Self::EMPTY_DELETED
    }

    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            name_1: reader.read_u32::<LittleEndian>()?,
            name_2: reader.read_u32::<LittleEndian>()?,
            locale: reader.read_u16::<LittleEndian>()?,
            platform: reader.read_u16::<LittleEndian>()?,
            block_index: reader.read_u32::<LittleEndian>()?,
        })
    }
}

bitflags! {
    /// Flags of a block table entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize))]
    pub struct BlockFlags: u32 {
        /// File is compressed with PKWare DCL, without a codec byte
        const IMPLODED = 0x0000_0100;
        /// Each sector starts with a codec byte
        const COMPRESSED = 0x0000_0200;
        /// File is encrypted
        const ENCRYPTED = 0x0001_0000;
        /// Encryption key is adjusted by block position and size
        const ADJUSTED_KEY = 0x0002_0000;
        /// File is stored as one unit instead of sectors
        const SINGLE_UNIT = 0x0100_0000;
        /// File is a deletion marker for a patched archive
        const DELETE_MARKER = 0x0200_0000;
        /// File exists in the archive
        const EXISTS = 0x8000_0000;
    }
}

/// Block table entry (16 bytes, plus the hi-block word when present)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BlockEntry {
    /// Offset of the file data, relative to the beginning of the archive
    pub file_pos: u32,
    /// Compressed file size
    pub compressed_size: u32,
    /// Size of uncompressed file
    pub file_size: u32,
    /// Flags for the file
    pub flags: BlockFlags,
    /// High 16 bits of the file offset, from the hi-block table
    pub file_pos_high: u16,
}

impl BlockEntry {
    /// Check if the file is compressed by any method
    pub fn is_compressed(&self) -> bool {
        self.flags
            .intersects(BlockFlags::COMPRESSED | BlockFlags::IMPLODED)
    }

    /// Check if the file is compressed with PKWare DCL only
    pub fn is_imploded(&self) -> bool {
        self.flags.contains(BlockFlags::IMPLODED)
    }

    /// Check if the file is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.flags.contains(BlockFlags::ENCRYPTED)
    }

    /// Check if the file uses an adjusted key
    pub fn has_adjusted_key(&self) -> bool {
        self.flags.contains(BlockFlags::ADJUSTED_KEY)
    }

    /// Check if the file is stored as a single unit
    pub fn is_single_unit(&self) -> bool {
        self.flags.contains(BlockFlags::SINGLE_UNIT)
    }

    /// Check if the file exists and is not a deletion marker
    pub fn exists(&self) -> bool {
        self.flags.contains(BlockFlags::EXISTS) && !self.flags.contains(BlockFlags::DELETE_MARKER)
    }

    /// Full 48-bit offset of the file data
    pub fn file_offset(&self) -> u64 {
        ((self.file_pos_high as u64) << 32) | self.file_pos as u64
    }

    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            file_pos: reader.read_u32::<LittleEndian>()?,
            compressed_size: reader.read_u32::<LittleEndian>()?,
            file_size: reader.read_u32::<LittleEndian>()?,
            flags: BlockFlags::from_bits_retain(reader.read_u32::<LittleEndian>()?),
            file_pos_high: 0,
        })
    }
}

/// Read `count` encrypted 16-byte entries at `offset`
fn read_encrypted_table<R: Read + Seek + ?Sized>(
    reader: &mut R,
    offset: u64,
    count: u32,
    key: u32,
) -> Result<Vec<u8>> {
    let byte_size = (count as usize)
        .checked_mul(TABLE_ENTRY_SIZE)
        .ok_or_else(|| Error::invalid_format(format!("table of {count} entries is too large")))?;

    reader.seek(SeekFrom::Start(offset))?;
    let mut raw = vec![0u8; byte_size];
    reader.read_exact(&mut raw)?;

    decrypt_bytes(&mut raw, key);
    Ok(raw)
}

/// Hash table
#[derive(Debug, Clone)]
pub struct HashTable {
    entries: Vec<HashEntry>,
}

impl HashTable {
    /// Build a hash table from already decrypted entries
    pub fn from_entries(entries: Vec<HashEntry>) -> Result<Self> {
        if !crate::is_power_of_two(entries.len() as u32) {
            return Err(Error::invalid_format(format!(
                "hash table size {} is not a power of two",
                entries.len()
            )));
        }
        Ok(Self { entries })
    }

    /// Read and decrypt a hash table from the archive
    pub fn read<R: Read + Seek + ?Sized>(reader: &mut R, offset: u64, size: u32) -> Result<Self> {
        let raw = read_encrypted_table(reader, offset, size, HASH_TABLE_KEY)?;

        let mut cursor = Cursor::new(raw);
        let entries = (0..size)
            .map(|_| HashEntry::read(&mut cursor))
            .collect::<Result<Vec<_>>>()?;

        Self::from_entries(entries)
    }

    /// Get all entries
    pub fn entries(&self) -> &[HashEntry] {
        &self.entries
    }

    /// Get a specific entry
    pub fn get(&self, index: usize) -> Option<&HashEntry> {
        self.entries.get(index)
    }

    /// Get the size of the hash table
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Find a file in the hash table
    ///
    /// Probes linearly from the table-offset hash, skipping deleted slots and
    /// stopping at the first never-used slot or after visiting every slot.
    /// With a requested locale an exact locale match wins, then a neutral
    /// entry; otherwise the first match in probe order is returned.
    pub fn find_file(&self, filename: &str, locale: Option<u16>) -> Option<(usize, &HashEntry)> {
        let (offset, name_a, name_b) = compute_file_hashes(filename);
        self.find_by_hash(offset, name_a, name_b, locale)
    }

    /// Find an entry from precomputed hashes
    pub fn find_by_hash(
        &self,
        offset_hash: u32,
        name_a: u32,
        name_b: u32,
        locale: Option<u16>,
    ) -> Option<(usize, &HashEntry)> {
        let size = self.entries.len();
        if size == 0 {
            return None;
        }
        let mask = size - 1;
        let start = offset_hash as usize & mask;

        let mut first = None;
        let mut neutral = None;

        for step in 0..size {
            let index = (start + step) & mask;
            let entry = &self.entries[index];

            if entry.is_empty() {
                break;
            }
            if entry.is_deleted() || entry.name_1 != name_a || entry.name_2 != name_b {
                continue;
            }

            log::trace!("hash match at slot {index} (locale 0x{:04X})", entry.locale);

            match locale {
                None => return Some((index, entry)),
                Some(wanted) if entry.locale == wanted => return Some((index, entry)),
                Some(_) => {
                    if entry.locale == 0 && neutral.is_none() {
                        neutral = Some((index, entry));
                    }
                    if first.is_none() {
                        first = Some((index, entry));
                    }
                }
            }
        }

        neutral.or(first)
    }
}

/// Block table
#[derive(Debug, Clone)]
pub struct BlockTable {
    entries: Vec<BlockEntry>,
}

impl BlockTable {
    /// Build a block table from already decrypted entries
    pub fn from_entries(entries: Vec<BlockEntry>) -> Self {
        Self { entries }
    }

    /// Read and decrypt a block table from the archive
    pub fn read<R: Read + Seek + ?Sized>(reader: &mut R, offset: u64, size: u32) -> Result<Self> {
        let raw = read_encrypted_table(reader, offset, size, BLOCK_TABLE_KEY)?;

        let mut cursor = Cursor::new(raw);
        let entries = (0..size)
            .map(|_| BlockEntry::read(&mut cursor))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Merge the high offset words of a hi-block table into the entries
    pub fn apply_hi_block_table(&mut self, high: &[u16]) -> Result<()> {
        if high.len() != self.entries.len() {
            return Err(Error::invalid_format(format!(
                "hi-block table has {} entries, block table has {}",
                high.len(),
                self.entries.len()
            )));
        }
        for (entry, &word) in self.entries.iter_mut().zip(high) {
            entry.file_pos_high = word;
        }
        Ok(())
    }

    /// Get all entries
    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    /// Get a specific entry
    pub fn get(&self, index: usize) -> Option<&BlockEntry> {
        self.entries.get(index)
    }

    /// Get the size of the block table
    pub fn size(&self) -> usize {
        self.entries.len()
    }
}

/// Read the unencrypted hi-block table (one u16 per block)
pub fn read_hi_block_table<R: Read + Seek + ?Sized>(
    reader: &mut R,
    offset: u64,
    count: u32,
) -> Result<Vec<u16>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut high = vec![0u16; count as usize];
    reader.read_u16_into::<LittleEndian>(&mut high)?;
    Ok(high)
}
