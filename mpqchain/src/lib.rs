//! # mpqchain - MPQ Archive Engine
//!
//! A safe, read-only Rust implementation of the MPQ (Mo'PaQ) archive format
//! used by Blizzard Entertainment games, together with an archive chain that
//! layers several archives into one namespace the way the game client
//! applies its patches.
//!
//! ## Features
//!
//! - MPQ format versions 0 and 1 (including the hi-block table)
//! - Encrypted hash, block and file data, including adjusted keys
//! - zlib, bzip2, LZMA, sparse and PKWare DCL decompression
//! - Priority-ordered archive chains driven by glob patterns
//! - Memory-mapped I/O support
//!
//! ## Example
//!
//! ```no_run
//! use mpqchain::{Archive, ArchiveChain};
//!
//! # fn main() -> Result<(), mpqchain::Error> {
//! let base = Archive::open("Data/common.MPQ")?;
//! let patch = Archive::open("Data/patch-2.MPQ")?;
//!
//! let mut chain = ArchiveChain::new();
//! chain.add_archive(&base)?;
//! chain.add_archive(&patch)?;
//!
//! // patch-2 wins over common for files present in both
//! if let Some(data) = chain.read_file("DBFilesClient\\Map.dbc")? {
//!     println!("{} bytes", data.len());
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod archive;
pub mod chain;
pub mod compression;
pub mod crypto;
pub mod error;
pub mod file;
pub mod hash;
pub mod header;
pub mod io;
pub mod special_files;
pub mod tables;

// Re-export commonly used types
pub use archive::{Archive, OpenOptions};
pub use chain::{ArchiveChain, FileSource, WOW_ARCHIVE_PRIORITIES};
pub use error::{Error, Result};
pub use file::FileInfo;
pub use header::MpqHeader;
pub use tables::{BlockEntry, BlockFlags, BlockTable, HashEntry, HashTable};

/// MPQ format version constants
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FormatVersion {
    /// Original MPQ format (32-byte header)
    V1 = 0,
    /// The Burning Crusade format (44-byte header)
    V2 = 1,
}

impl FormatVersion {
    /// Map a raw header version to a supported format
    pub fn from_raw(version: u16) -> Option<Self> {
        match version {
            0 => Some(FormatVersion::V1),
            1 => Some(FormatVersion::V2),
            _ => None,
        }
    }

    /// Size of the header for this format
    pub fn header_size(self) -> u32 {
        match self {
            FormatVersion::V1 => 0x20,
            FormatVersion::V2 => 0x2C,
        }
    }
}

/// MPQ signature constants
pub mod signatures {
    /// Standard MPQ archive signature ('MPQ\x1A')
    pub const MPQ_ARCHIVE: u32 = 0x1A51504D;

    /// MPQ user data signature ('MPQ\x1B')
    pub const MPQ_USERDATA: u32 = 0x1B51504D;
}

/// Block size calculation
#[inline]
pub fn calculate_sector_size(block_size_shift: u16) -> usize {
    512 << block_size_shift
}

/// Check if a value is a power of two
#[inline]
pub fn is_power_of_two(value: u32) -> bool {
    value != 0 && (value & (value - 1)) == 0
}
