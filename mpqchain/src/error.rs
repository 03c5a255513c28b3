//! Error types for MPQ archive and chain operations

use std::io;
use thiserror::Error;

/// Errors raised while opening archives, locating files or decoding their contents
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error from the backing byte source
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive header or table layout is not a readable MPQ archive
    #[error("Invalid MPQ format: {0}")]
    InvalidFormat(String),

    /// The header declares a format version this crate does not read
    #[error("Unsupported MPQ format version: {0}")]
    UnsupportedVersion(u16),

    /// A table lookup hit an inconsistent entry
    #[error("Table corruption: {0}")]
    TableCorruption(String),

    /// A sector names a compression method that cannot be decoded
    #[error("Unsupported compression method: 0x{0:02X}")]
    UnsupportedCodec(u8),

    /// Decryption or decompression produced data that violates the block description
    #[error("Decode error: {0}")]
    Decode(String),

    /// An archive name matched none of the configured priority patterns
    #[error("Could not find a suitable priority for archive: {0}")]
    NoMatchingPriority(String),

    /// A priority pattern is not valid glob syntax
    #[error("Invalid priority pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),
}

impl Error {
    /// Create an invalid format error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Error::InvalidFormat(msg.into())
    }

    /// Create a table corruption error
    pub fn table_corruption<S: Into<String>>(msg: S) -> Self {
        Error::TableCorruption(msg.into())
    }

    /// Create a decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Error::Decode(msg.into())
    }

    /// Returns true for errors that make an archive unusable at open time
    pub fn is_format_error(&self) -> bool {
        matches!(self, Error::InvalidFormat(_) | Error::UnsupportedVersion(_))
    }
}

/// Result type alias for MPQ operations
pub type Result<T> = std::result::Result<T, Error>;
