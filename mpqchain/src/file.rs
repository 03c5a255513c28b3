//! Reading and decoding stored files

use crate::compression;
use crate::crypto::{decrypt_bytes, file_key};
use crate::io::ByteSource;
use crate::tables::{BlockEntry, BlockFlags, HashEntry};
use crate::{Error, Result};

/// A file resolved through the hash and block tables
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FileInfo {
    /// Name the file was looked up by
    pub name: String,
    /// Slot of the matching hash table entry
    pub hash_index: usize,
    /// Index into the block table
    pub block_index: usize,
    /// Offset of the file data, relative to the archive start
    pub file_pos: u64,
    /// Stored size
    pub compressed_size: u32,
    /// Decoded size
    pub file_size: u32,
    /// Block flags
    pub flags: BlockFlags,
    /// Locale of the matching hash entry
    pub locale: u16,
    /// Platform of the matching hash entry
    pub platform: u16,
}

impl FileInfo {
    /// Combine a name with its hash and block entries
    pub fn new(name: &str, hash_index: usize, hash: &HashEntry, block: &BlockEntry) -> Self {
        Self {
            name: name.to_string(),
            hash_index,
            block_index: hash.block_index as usize,
            file_pos: block.file_offset(),
            compressed_size: block.compressed_size,
            file_size: block.file_size,
            flags: block.flags,
            locale: hash.locale,
            platform: hash.platform,
        }
    }

    /// Check if the file is compressed by any method
    pub fn is_compressed(&self) -> bool {
        self.flags
            .intersects(BlockFlags::COMPRESSED | BlockFlags::IMPLODED)
    }

    /// Check if the file is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.flags.contains(BlockFlags::ENCRYPTED)
    }

    /// Check if the file is stored as a single unit
    pub fn is_single_unit(&self) -> bool {
        self.flags.contains(BlockFlags::SINGLE_UNIT)
    }

    /// Decryption key of the file, if it is encrypted
    pub fn encryption_key(&self) -> Option<u32> {
        self.is_encrypted().then(|| {
            file_key(
                &self.name,
                self.file_pos as u32,
                self.file_size,
                self.flags.contains(BlockFlags::ADJUSTED_KEY),
            )
        })
    }

    /// Number of sectors the file is split into
    pub fn sector_count(&self, sector_size: usize) -> usize {
        if self.is_single_unit() {
            1
        } else {
            (self.file_size as usize).div_ceil(sector_size)
        }
    }
}

/// Read and fully decode a file
///
/// The result always holds exactly `file_size` bytes; anything else is a
/// [`Error::Decode`].
pub(crate) fn read_file_data(
    source: &ByteSource,
    info: &FileInfo,
    sector_size: usize,
) -> Result<Vec<u8>> {
    let size = info.file_size as usize;
    if size == 0 {
        return Ok(Vec::new());
    }

    let key = info.encryption_key();

    log::trace!(
        "reading {:?}: pos=0x{:X} csize={} size={} flags={:?}",
        info.name,
        info.file_pos,
        info.compressed_size,
        info.file_size,
        info.flags
    );

    let data = if info.is_single_unit() {
        let mut raw = read_block(source, info, info.compressed_size as usize)?;
        if let Some(key) = key {
            decrypt_bytes(&mut raw, key);
        }
        decode_sector(raw, size, info.flags)?
    } else if info.is_compressed() {
        read_compressed_sectors(source, info, sector_size, key)?
    } else {
        let mut raw = read_block(source, info, size)?;
        if let Some(key) = key {
            for (index, sector) in raw.chunks_mut(sector_size).enumerate() {
                decrypt_bytes(sector, key.wrapping_add(index as u32));
            }
        }
        raw
    };

    if data.len() != size {
        return Err(Error::decode(format!(
            "{} decoded to {} bytes, expected {}",
            info.name,
            data.len(),
            size
        )));
    }

    Ok(data)
}

/// Read `len` bytes of the file's block, checking it lies inside the archive
fn read_block(source: &ByteSource, info: &FileInfo, len: usize) -> Result<Vec<u8>> {
    let end = info.file_pos.checked_add(len as u64);
    match end {
        Some(end) if end <= source.len() => source.read_at(info.file_pos, len),
        _ => Err(Error::decode(format!(
            "{}: block at 0x{:X} of {} bytes extends past the end of the archive",
            info.name, info.file_pos, len
        ))),
    }
}

fn read_compressed_sectors(
    source: &ByteSource,
    info: &FileInfo,
    sector_size: usize,
    key: Option<u32>,
) -> Result<Vec<u8>> {
    let size = info.file_size as usize;
    let sector_count = size.div_ceil(sector_size);
    let table_len = (sector_count + 1) * 4;

    let block = read_block(source, info, info.compressed_size as usize)?;
    if block.len() < table_len {
        return Err(Error::decode(format!(
            "{}: sector offset table does not fit in {} bytes",
            info.name,
            block.len()
        )));
    }

    let mut table = block[..table_len].to_vec();
    if let Some(key) = key {
        decrypt_bytes(&mut table, key.wrapping_sub(1));
    }
    let offsets: Vec<usize> = table
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize)
        .collect();

    let plausible = offsets[0] >= table_len
        && offsets.windows(2).all(|pair| pair[0] <= pair[1])
        && offsets[sector_count] <= block.len();
    if !plausible {
        return Err(Error::decode(format!(
            "{}: implausible sector offset table (first {}, last {}, block {})",
            info.name,
            offsets[0],
            offsets[sector_count],
            block.len()
        )));
    }

    log::debug!(
        "{}: {} sectors of {} bytes",
        info.name,
        sector_count,
        sector_size
    );

    let mut output = Vec::with_capacity(size);
    for index in 0..sector_count {
        let mut raw = block[offsets[index]..offsets[index + 1]].to_vec();
        if let Some(key) = key {
            decrypt_bytes(&mut raw, key.wrapping_add(index as u32));
        }

        let expected = sector_size.min(size - index * sector_size);
        let sector = decode_sector(raw, expected, info.flags)?;
        if sector.len() != expected {
            return Err(Error::decode(format!(
                "{}: sector {} decoded to {} bytes, expected {}",
                info.name,
                index,
                sector.len(),
                expected
            )));
        }
        output.extend_from_slice(&sector);
    }

    Ok(output)
}

/// Undo compression of one sector
///
/// A sector stored at its full length is raw; a shorter one is compressed.
fn decode_sector(raw: Vec<u8>, expected: usize, flags: BlockFlags) -> Result<Vec<u8>> {
    let compressed = flags.intersects(BlockFlags::COMPRESSED | BlockFlags::IMPLODED);
    if !compressed || raw.len() == expected {
        return Ok(raw);
    }
    if raw.len() > expected {
        return Err(Error::decode(format!(
            "compressed sector of {} bytes is longer than its {} decoded bytes",
            raw.len(),
            expected
        )));
    }

    if flags.contains(BlockFlags::IMPLODED) {
        compression::explode(&raw, expected)
    } else {
        compression::decompress(&raw, expected)
    }
}
