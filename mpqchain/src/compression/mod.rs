//! Decompression of MPQ sectors
//!
//! A sector of a `COMPRESSED` file starts with one byte naming the codecs
//! that were applied to it; [`decompress`] strips that byte and undoes each
//! codec in turn. Sectors of `IMPLODED` files carry no such byte and go
//! straight to [`explode`].

mod algorithms;
mod decompress;

pub use decompress::{decompress, explode};

use crate::{Error, Result};

/// Compression method flags
pub mod flags {
    /// Huffman coding (WAVE files)
    pub const HUFFMAN: u8 = 0x01;
    /// zlib deflate
    pub const ZLIB: u8 = 0x02;
    /// PKWare DCL implode
    pub const PKWARE: u8 = 0x08;
    /// bzip2
    pub const BZIP2: u8 = 0x10;
    /// Sparse zero-run encoding
    pub const SPARSE: u8 = 0x20;
    /// IMA ADPCM, mono
    pub const ADPCM_MONO: u8 = 0x40;
    /// IMA ADPCM, stereo
    pub const ADPCM_STEREO: u8 = 0x80;
    /// LZMA; only valid as the whole method byte
    pub const LZMA: u8 = 0x12;
}

/// One codec of a sector's compression chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Huffman coding
    Huffman,
    /// zlib deflate
    Zlib,
    /// PKWare DCL implode
    PKWare,
    /// bzip2
    BZip2,
    /// LZMA
    Lzma,
    /// Sparse zero-run encoding
    Sparse,
    /// IMA ADPCM, mono
    AdpcmMono,
    /// IMA ADPCM, stereo
    AdpcmStereo,
}

/// Codecs in the order they are undone when combined in one method byte
const UNDO_ORDER: [Codec; 7] = [
    Codec::BZip2,
    Codec::PKWare,
    Codec::Zlib,
    Codec::Huffman,
    Codec::AdpcmStereo,
    Codec::AdpcmMono,
    Codec::Sparse,
];

impl Codec {
    /// The bit (or, for LZMA, the byte) naming this codec
    pub const fn mask(self) -> u8 {
        match self {
            Codec::Huffman => flags::HUFFMAN,
            Codec::Zlib => flags::ZLIB,
            Codec::PKWare => flags::PKWARE,
            Codec::BZip2 => flags::BZIP2,
            Codec::Lzma => flags::LZMA,
            Codec::Sparse => flags::SPARSE,
            Codec::AdpcmMono => flags::ADPCM_MONO,
            Codec::AdpcmStereo => flags::ADPCM_STEREO,
        }
    }

    /// Whether this crate can undo the codec
    pub const fn is_supported(self) -> bool {
        !matches!(
            self,
            Codec::Huffman | Codec::AdpcmMono | Codec::AdpcmStereo
        )
    }

    /// Resolve a method byte into the codecs to undo, in decoding order
    ///
    /// Entropy coders are undone from the highest bit down (bzip2, PKWare,
    /// zlib); sparse is undone last because it is always the first stage
    /// applied. Unknown or unsupported bits are an
    /// [`Error::UnsupportedCodec`].
    pub fn chain(method: u8) -> Result<Vec<Codec>> {
        if method == flags::LZMA {
            return Ok(vec![Codec::Lzma]);
        }

        let known = UNDO_ORDER.iter().fold(0u8, |acc, codec| acc | codec.mask());
        let unknown = method & !known;
        if unknown != 0 {
            return Err(Error::UnsupportedCodec(unknown));
        }

        let mut chain = Vec::new();
        for codec in UNDO_ORDER {
            if method & codec.mask() == 0 {
                continue;
            }
            if !codec.is_supported() {
                return Err(Error::UnsupportedCodec(codec.mask()));
            }
            chain.push(codec);
        }
        Ok(chain)
    }
}
