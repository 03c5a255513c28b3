//! In-memory MPQ writer for tests
//!
//! Produces archives the way the game's packers lay them out: header, file
//! data, then the encrypted hash and block tables.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use mpqchain::compression::flags;
use mpqchain::crypto::{encrypt_block, encrypt_bytes, file_key, BLOCK_TABLE_KEY, HASH_TABLE_KEY};
use mpqchain::hash::{hash_string, hash_type};
use mpqchain::{signatures, Archive, BlockFlags, HashEntry};
use std::io::{Cursor, Write};
use std::path::PathBuf;

/// A file to store in a test archive
#[derive(Debug, Clone)]
pub struct TestFile {
    name: String,
    content: Vec<u8>,
    locale: u16,
    flags: BlockFlags,
    method: u8,
    payload: Option<Vec<u8>>,
}

impl TestFile {
    /// Uncompressed, unencrypted, split into sectors
    pub fn new(name: &str, content: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            content: content.to_vec(),
            locale: 0,
            flags: BlockFlags::EXISTS,
            method: 0,
            payload: None,
        }
    }

    /// Store the file as one unit
    pub fn single_unit(mut self) -> Self {
        self.flags |= BlockFlags::SINGLE_UNIT;
        self
    }

    /// Compress every sector with `method`
    pub fn compressed(mut self, method: u8) -> Self {
        self.flags |= BlockFlags::COMPRESSED;
        self.method = method;
        self
    }

    /// Encrypt the stored data
    pub fn encrypted(mut self) -> Self {
        self.flags |= BlockFlags::ENCRYPTED;
        self
    }

    /// Encrypt with the position-adjusted key
    pub fn adjusted_key(mut self) -> Self {
        self.flags |= BlockFlags::ENCRYPTED | BlockFlags::ADJUSTED_KEY;
        self
    }

    /// Mark the block as a deletion marker
    pub fn delete_marker(mut self) -> Self {
        self.flags |= BlockFlags::DELETE_MARKER;
        self
    }

    /// Locale of the hash entry
    pub fn locale(mut self, locale: u16) -> Self {
        self.locale = locale;
        self
    }

    /// Store `payload` verbatim with the given flags
    ///
    /// `content` stays the decoded form the test expects.
    pub fn payload(mut self, payload: &[u8], flags: BlockFlags) -> Self {
        self.flags = flags | BlockFlags::EXISTS;
        self.payload = Some(payload.to_vec());
        self
    }

    /// Decoded content
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    fn encode(&self, file_pos: u32, sector_size: usize) -> Vec<u8> {
        if let Some(payload) = &self.payload {
            return payload.clone();
        }
        if self.content.is_empty() {
            return Vec::new();
        }

        let key = self.flags.contains(BlockFlags::ENCRYPTED).then(|| {
            file_key(
                &self.name,
                file_pos,
                self.content.len() as u32,
                self.flags.contains(BlockFlags::ADJUSTED_KEY),
            )
        });
        let compressed = self.flags.contains(BlockFlags::COMPRESSED);

        if self.flags.contains(BlockFlags::SINGLE_UNIT) {
            let mut data = if compressed {
                compress_sector(&self.content, self.method)
            } else {
                self.content.clone()
            };
            if let Some(key) = key {
                encrypt_bytes(&mut data, key);
            }
            return data;
        }

        if !compressed {
            let mut data = self.content.clone();
            if let Some(key) = key {
                for (i, sector) in data.chunks_mut(sector_size).enumerate() {
                    encrypt_bytes(sector, key.wrapping_add(i as u32));
                }
            }
            return data;
        }

        let sectors: Vec<Vec<u8>> = self
            .content
            .chunks(sector_size)
            .enumerate()
            .map(|(i, chunk)| {
                let mut sector = compress_sector(chunk, self.method);
                if let Some(key) = key {
                    encrypt_bytes(&mut sector, key.wrapping_add(i as u32));
                }
                sector
            })
            .collect();

        let mut table = Vec::new();
        let mut offset = ((sectors.len() + 1) * 4) as u32;
        table.write_u32::<LittleEndian>(offset).unwrap();
        for sector in &sectors {
            offset += sector.len() as u32;
            table.write_u32::<LittleEndian>(offset).unwrap();
        }
        if let Some(key) = key {
            encrypt_bytes(&mut table, key.wrapping_sub(1));
        }

        let mut data = table;
        for sector in sectors {
            data.extend_from_slice(&sector);
        }
        data
    }
}

/// Builds an MPQ archive in memory
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    format_version: u16,
    sector_shift: u16,
    hash_table_size: u32,
    pad_block_table: bool,
    listfile: bool,
    tombstones: Vec<String>,
    files: Vec<TestFile>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self {
            format_version: 0,
            sector_shift: 3,
            hash_table_size: 16,
            pad_block_table: true,
            listfile: false,
            tombstones: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Write a version 1 header with a hi-block table
    pub fn version(mut self, version: u16) -> Self {
        self.format_version = version;
        self
    }

    pub fn sector_shift(mut self, shift: u16) -> Self {
        self.sector_shift = shift;
        self
    }

    pub fn hash_table_size(mut self, size: u32) -> Self {
        self.hash_table_size = size;
        self
    }

    /// Pad the block table to a power of two (the default)
    pub fn pad_block_table(mut self, pad: bool) -> Self {
        self.pad_block_table = pad;
        self
    }

    /// Add a (listfile) naming every other file
    pub fn with_listfile(mut self) -> Self {
        self.listfile = true;
        self
    }

    /// Put a deleted hash entry in the first slot `name` probes
    pub fn tombstone(mut self, name: &str) -> Self {
        self.tombstones.push(name.to_string());
        self
    }

    pub fn file(mut self, file: TestFile) -> Self {
        self.files.push(file);
        self
    }

    /// Shorthand for an uncompressed file
    pub fn add(self, name: &str, content: &[u8]) -> Self {
        self.file(TestFile::new(name, content))
    }

    pub fn build(&self) -> Vec<u8> {
        let header_size: usize = if self.format_version >= 1 { 0x2C } else { 0x20 };
        let sector_size = 512usize << self.sector_shift;

        let mut files = self.files.clone();
        if self.listfile {
            let names: Vec<&str> = self.files.iter().map(|f| f.name.as_str()).collect();
            let listing = names.join("\r\n");
            files.push(TestFile::new("(listfile)", listing.as_bytes()).compressed(flags::ZLIB));
        }

        let mut out = vec![0u8; header_size];
        let mut blocks = Vec::new();
        for file in &files {
            let pos = out.len() as u32;
            let stored = file.encode(pos, sector_size);
            blocks.push((pos, stored.len() as u32, file.content.len() as u32, file.flags));
            out.extend_from_slice(&stored);
        }

        let mut hash_entries = vec![HashEntry::empty(); self.hash_table_size as usize];
        for entry in hash_entries.iter_mut() {
            entry.name_1 = 0xFFFF_FFFF;
            entry.name_2 = 0xFFFF_FFFF;
            entry.locale = 0xFFFF;
            entry.platform = 0xFFFF;
        }
        for name in &self.tombstones {
            let slot = self.free_slot(&hash_entries, name);
            hash_entries[slot].block_index = HashEntry::EMPTY_DELETED;
        }
        for (index, file) in files.iter().enumerate() {
            let slot = self.free_slot(&hash_entries, &file.name);
            hash_entries[slot] = HashEntry {
                name_1: hash_string(&file.name, hash_type::NAME_A),
                name_2: hash_string(&file.name, hash_type::NAME_B),
                locale: file.locale,
                platform: 0,
                block_index: index as u32,
            };
        }

        let block_count = if self.pad_block_table {
            blocks.len().max(1).next_power_of_two()
        } else {
            blocks.len()
        };
        blocks.resize(block_count, (0, 0, 0, BlockFlags::empty()));

        let hash_pos = out.len() as u32;
        let mut words: Vec<u32> = hash_entries
            .iter()
            .flat_map(|e| {
                [
                    e.name_1,
                    e.name_2,
                    e.locale as u32 | (e.platform as u32) << 16,
                    e.block_index,
                ]
            })
            .collect();
        encrypt_block(&mut words, HASH_TABLE_KEY);
        write_words(&mut out, &words);

        let block_pos = out.len() as u32;
        let mut words: Vec<u32> = blocks
            .iter()
            .flat_map(|&(pos, csize, size, flags)| [pos, csize, size, flags.bits()])
            .collect();
        encrypt_block(&mut words, BLOCK_TABLE_KEY);
        write_words(&mut out, &words);

        let hi_block_pos = out.len() as i64;
        if self.format_version >= 1 {
            for _ in 0..block_count {
                out.write_u16::<LittleEndian>(0).unwrap();
            }
        }

        let archive_size = out.len() as u32;
        let mut header = Cursor::new(&mut out[..header_size]);
        header.write_u32::<LittleEndian>(signatures::MPQ_ARCHIVE).unwrap();
        header.write_u32::<LittleEndian>(header_size as u32).unwrap();
        header.write_u32::<LittleEndian>(archive_size).unwrap();
        header.write_u16::<LittleEndian>(self.format_version).unwrap();
        header.write_u16::<LittleEndian>(self.sector_shift).unwrap();
        header.write_u32::<LittleEndian>(hash_pos).unwrap();
        header.write_u32::<LittleEndian>(block_pos).unwrap();
        header.write_u32::<LittleEndian>(self.hash_table_size).unwrap();
        header.write_u32::<LittleEndian>(block_count as u32).unwrap();
        if self.format_version >= 1 {
            header.write_i64::<LittleEndian>(hi_block_pos).unwrap();
            header.write_u16::<LittleEndian>(0).unwrap();
            header.write_u16::<LittleEndian>(0).unwrap();
        }

        out
    }

    /// Build and open the archive under `name`
    pub fn open(&self, name: &str) -> Archive {
        Archive::from_reader(Cursor::new(self.build()), Some(PathBuf::from(name)))
            .expect("test archive should open")
    }

    fn free_slot(&self, entries: &[HashEntry], name: &str) -> usize {
        let mask = entries.len() - 1;
        let start = hash_string(name, hash_type::TABLE_OFFSET) as usize & mask;
        (0..entries.len())
            .map(|step| (start + step) & mask)
            .find(|&slot| entries[slot].is_empty())
            .expect("hash table full")
    }
}

fn write_words(out: &mut Vec<u8>, words: &[u32]) {
    for &word in words {
        out.write_u32::<LittleEndian>(word).unwrap();
    }
}

/// Compress one sector; keeps the raw bytes when compression does not help
pub fn compress_sector(data: &[u8], method: u8) -> Vec<u8> {
    let mut payload = data.to_vec();
    if method == flags::LZMA {
        payload = lzma(&payload);
    } else {
        if method & flags::SPARSE != 0 {
            payload = sparse(&payload);
        }
        if method & flags::ZLIB != 0 {
            payload = zlib(&payload);
        }
        if method & flags::BZIP2 != 0 {
            payload = bzip2(&payload);
        }
    }

    if payload.len() + 1 >= data.len() {
        return data.to_vec();
    }
    let mut sector = vec![method];
    sector.extend_from_slice(&payload);
    sector
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::best());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn bzip2(data: &[u8]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::best());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn lzma(data: &[u8]) -> Vec<u8> {
    let options = lzma_rs::compress::Options {
        unpacked_size: lzma_rs::compress::UnpackedSize::SkipWritingToHeader,
    };
    let mut out = vec![0u8];
    lzma_rs::lzma_compress_with_options(&mut Cursor::new(data), &mut out, &options).unwrap();
    out
}

/// Zero runs of three or more become run codes, everything else literals
pub fn sparse(data: &[u8]) -> Vec<u8> {
    let mut out = (data.len() as u32).to_be_bytes().to_vec();
    let mut i = 0;
    while i < data.len() {
        let zeros = data[i..].iter().take(130).take_while(|&&b| b == 0).count();
        if zeros >= 3 {
            out.push((zeros - 3) as u8);
            i += zeros;
            continue;
        }

        let start = i;
        while i < data.len() && i - start < 128 && !data[i..].starts_with(&[0, 0, 0]) {
            i += 1;
        }
        out.push(0x80 | (i - start - 1) as u8);
        out.extend_from_slice(&data[start..i]);
    }
    out
}

/// Text that compresses well and spans several 4 KiB sectors
pub fn sample_text(len: usize) -> Vec<u8> {
    b"Sector data for the archive reader tests. "
        .iter()
        .cycle()
        .take(len)
        .copied()
        .collect()
}
