//! I/O abstractions for MPQ archives

use crate::Result;
use parking_lot::Mutex;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Random-access byte source an archive can be read from
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Exclusively owned byte source shared by all reads of one archive
///
/// Each read is a seek followed by a read under one lock, so an archive can
/// be read from several threads without external synchronization.
pub struct ByteSource {
    inner: Mutex<Box<dyn ReadSeek>>,
    len: u64,
}

impl ByteSource {
    /// Wrap any seekable reader, measuring its length
    pub fn new<R: ReadSeek + 'static>(mut reader: R) -> Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self {
            inner: Mutex::new(Box::new(reader)),
            len,
        })
    }

    /// Open a file with buffered reads
    pub fn open_file(path: &Path) -> Result<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }

    /// Open a file through a read-only memory map
    #[cfg(feature = "mmap")]
    #[cfg_attr(docsrs, doc(cfg(feature = "mmap")))]
    pub fn map_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the map is read-only; the archive file must not be truncated
        // by another process while it is open.
        let map = unsafe { memmap2::Mmap::map(&file)? };
        Self::new(std::io::Cursor::new(map))
    }

    /// Total length of the source in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the source is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read exactly `len` bytes at `offset`
    pub fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut reader = self.inner.lock();
        reader.seek(SeekFrom::Start(offset))?;
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Run `f` with the locked reader
    pub fn with_reader<T>(&self, f: impl FnOnce(&mut dyn ReadSeek) -> Result<T>) -> Result<T> {
        let mut reader = self.inner.lock();
        f(reader.as_mut())
    }
}

impl fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteSource").field("len", &self.len).finish()
    }
}
