//! MPQ archive handling

use crate::file::{read_file_data, FileInfo};
use crate::header::MpqHeader;
use crate::io::{ByteSource, ReadSeek};
use crate::special_files::{parse_listfile, LISTFILE};
use crate::tables::{read_hi_block_table, BlockTable, HashEntry, HashTable, TABLE_ENTRY_SIZE};
use crate::{Error, Result};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Options for opening MPQ archives
#[derive(Debug, Clone)]
pub struct OpenOptions {
    strict_block_table: bool,
    map: bool,
    locale: Option<u16>,
}

impl OpenOptions {
    /// Create new default options
    ///
    /// Defaults: block table size must be a power of two, buffered file
    /// reads, first-match locale resolution.
    pub fn new() -> Self {
        Self {
            strict_block_table: true,
            map: false,
            locale: None,
        }
    }

    /// Require the block table size to be a power of two
    ///
    /// Many archives in the wild break this rule; pass `false` to read them.
    pub fn strict_block_table(mut self, strict: bool) -> Self {
        self.strict_block_table = strict;
        self
    }

    /// Read archive files through a memory map
    #[cfg(feature = "mmap")]
    #[cfg_attr(docsrs, doc(cfg(feature = "mmap")))]
    pub fn map(mut self, map: bool) -> Self {
        self.map = map;
        self
    }

    /// Locale preferred by [`Archive::read_file`] and [`Archive::file_exists`]
    pub fn locale(mut self, locale: Option<u16>) -> Self {
        self.locale = locale;
        self
    }

    /// Open an archive file
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Archive> {
        let path = path.as_ref();
        let source = if self.map {
            #[cfg(feature = "mmap")]
            {
                ByteSource::map_file(path)?
            }
            #[cfg(not(feature = "mmap"))]
            {
                ByteSource::open_file(path)?
            }
        } else {
            ByteSource::open_file(path)?
        };
        Archive::load(source, Some(path.to_path_buf()), self)
    }

    /// Open an archive from any seekable reader
    ///
    /// `path` only names the archive (for chain priorities and messages).
    pub fn open_reader<R: ReadSeek + 'static>(
        &self,
        reader: R,
        path: Option<PathBuf>,
    ) -> Result<Archive> {
        Archive::load(ByteSource::new(reader)?, path, self)
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// An MPQ archive
///
/// Tables are parsed once at open time and never change; each read decodes
/// the requested file from the byte source again.
#[derive(Debug)]
pub struct Archive {
    /// Path or name of the archive
    path: Option<PathBuf>,
    /// Archive byte source
    source: ByteSource,
    /// MPQ header
    header: MpqHeader,
    /// Decrypted hash table
    hash_table: HashTable,
    /// Decrypted block table
    block_table: BlockTable,
    /// Preferred locale
    locale: Option<u16>,
}

impl Archive {
    /// Open an existing MPQ archive
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        OpenOptions::new().open(path)
    }

    /// Open an archive from any seekable reader
    pub fn from_reader<R: ReadSeek + 'static>(reader: R, path: Option<PathBuf>) -> Result<Self> {
        OpenOptions::new().open_reader(reader, path)
    }

    fn load(source: ByteSource, path: Option<PathBuf>, options: &OpenOptions) -> Result<Self> {
        let archive_len = source.len();

        let (header, hash_table, block_table) = source.with_reader(|reader| {
            reader.seek(SeekFrom::Start(0))?;
            let header = MpqHeader::read(reader)?;
            header.validate(options.strict_block_table)?;

            check_table_bounds("hash", header.hash_table_pos(), header.hash_table_entries, archive_len)?;
            check_table_bounds("block", header.block_table_pos(), header.block_table_entries, archive_len)?;

            let hash_table =
                HashTable::read(reader, header.hash_table_pos(), header.hash_table_entries)?;
            let mut block_table =
                BlockTable::read(reader, header.block_table_pos(), header.block_table_entries)?;

            if let Some(pos) = header.hi_block_table_pos() {
                let high = read_hi_block_table(reader, pos, header.block_table_entries)?;
                block_table.apply_hi_block_table(&high)?;
            }

            Ok((header, hash_table, block_table))
        })?;

        log::debug!(
            "Opened MPQ archive {:?}: {} hash entries, {} block entries, sector size {}",
            path,
            hash_table.size(),
            block_table.size(),
            header.sector_size()
        );

        Ok(Archive {
            path,
            source,
            header,
            hash_table,
            block_table,
            locale: options.locale,
        })
    }

    /// Get the archive header
    pub fn header(&self) -> &MpqHeader {
        &self.header
    }

    /// Get the decrypted hash table
    pub fn hash_table(&self) -> &HashTable {
        &self.hash_table
    }

    /// Get the decrypted block table
    pub fn block_table(&self) -> &BlockTable {
        &self.block_table
    }

    /// Get the path the archive was opened from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File name of the archive, if it has a path
    pub fn name(&self) -> Option<&str> {
        self.path.as_deref()?.file_name()?.to_str()
    }

    /// Sector size in bytes
    pub fn sector_size(&self) -> usize {
        self.header.sector_size()
    }

    /// Resolve a path to its hash and block entries
    ///
    /// Returns `Ok(None)` when the path is absent or its block does not
    /// exist, and a table corruption error when the hash entry points past
    /// the block table.
    pub fn file_info_locale(&self, name: &str, locale: Option<u16>) -> Result<Option<FileInfo>> {
        let Some((hash_index, entry)) = self.hash_table.find_file(name, locale) else {
            return Ok(None);
        };

        let block = self
            .block_table
            .get(entry.block_index as usize)
            .ok_or_else(|| {
                Error::table_corruption(format!(
                    "hash entry {} for {:?} references block {} of {}",
                    hash_index,
                    name,
                    entry.block_index,
                    self.block_table.size()
                ))
            })?;

        if !block.exists() {
            return Ok(None);
        }

        Ok(Some(FileInfo::new(name, hash_index, entry, block)))
    }

    /// Resolve a path using the archive's preferred locale
    pub fn file_info(&self, name: &str) -> Result<Option<FileInfo>> {
        self.file_info_locale(name, self.locale)
    }

    /// Get the hash table entry a path resolves to, for diagnostics
    pub fn hash_table_entry(&self, name: &str) -> Option<&HashEntry> {
        self.hash_table
            .find_file(name, self.locale)
            .map(|(_, entry)| entry)
    }

    /// Check whether a file exists in a given locale
    pub fn file_exists_locale(&self, name: &str, locale: Option<u16>) -> bool {
        match self.file_info_locale(name, locale) {
            Ok(info) => info.is_some(),
            Err(e) => {
                log::warn!("lookup of {name:?} failed: {e}");
                false
            }
        }
    }

    /// Check whether a file exists
    pub fn file_exists(&self, name: &str) -> bool {
        self.file_exists_locale(name, self.locale)
    }

    /// Read a file in a given locale
    pub fn read_file_locale(&self, name: &str, locale: Option<u16>) -> Result<Option<Vec<u8>>> {
        match self.file_info_locale(name, locale)? {
            Some(info) => read_file_data(&self.source, &info, self.sector_size()).map(Some),
            None => Ok(None),
        }
    }

    /// Read a file, returning `None` if it is not in the archive
    pub fn read_file(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.read_file_locale(name, self.locale)
    }

    /// List the names recorded in the archive's (listfile)
    ///
    /// Hashes cannot be reversed, so an archive without a (listfile) yields
    /// an empty list; callers then have to probe candidate names.
    pub fn list_files(&self) -> Result<Vec<String>> {
        match self.read_file(LISTFILE)? {
            Some(data) => Ok(parse_listfile(&data)),
            None => {
                log::debug!("{:?} has no (listfile)", self.path);
                Ok(Vec::new())
            }
        }
    }
}

fn check_table_bounds(kind: &str, pos: u64, entries: u32, archive_len: u64) -> Result<()> {
    let end = pos.saturating_add(entries as u64 * TABLE_ENTRY_SIZE as u64);
    if end > archive_len {
        return Err(Error::invalid_format(format!(
            "{kind} table at 0x{pos:X} with {entries} entries extends past the end of the archive"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_open_options_defaults() {
        let options = OpenOptions::default();
        assert!(options.strict_block_table);
        assert!(!options.map);
        assert_eq!(options.locale, None);
    }

    #[test]
    fn test_not_an_archive() {
        let err = Archive::from_reader(Cursor::new(vec![0u8; 64]), None).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_empty_source() {
        let err = Archive::from_reader(Cursor::new(Vec::new()), None).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_table_bounds() {
        assert!(check_table_bounds("hash", 0x20, 4, 0x60).is_ok());
        assert!(check_table_bounds("hash", 0x20, 4, 0x5F).is_err());
        assert!(check_table_bounds("block", u64::MAX, 1, 0x100).is_err());
    }
}
