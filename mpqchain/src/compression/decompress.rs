//! Main decompression logic and multi-compression handling

use super::{algorithms, Codec};
use crate::{Error, Result};

/// Decompress a sector that starts with a method byte
///
/// `decompressed_size` is the size the sector must have once decoded; it
/// bounds every stage so corrupt input cannot inflate without limit. The
/// caller compares the final length against the block description.
pub fn decompress(data: &[u8], decompressed_size: usize) -> Result<Vec<u8>> {
    let (&method, payload) = data
        .split_first()
        .ok_or_else(|| Error::decode("empty compressed sector"))?;

    let chain = Codec::chain(method)?;

    log::debug!(
        "Decompressing {} bytes to {} bytes with method 0x{:02X} ({:?})",
        payload.len(),
        decompressed_size,
        method,
        chain
    );

    let mut buffer = payload.to_vec();
    for codec in chain {
        buffer = decode_stage(codec, &buffer, decompressed_size)?;
    }

    Ok(buffer)
}

/// Decompress a sector of an `IMPLODED` file (raw PKWare DCL, no method byte)
pub fn explode(data: &[u8], decompressed_size: usize) -> Result<Vec<u8>> {
    log::debug!(
        "Exploding {} bytes to {} bytes",
        data.len(),
        decompressed_size
    );
    algorithms::pkware::explode(data, decompressed_size)
}

fn decode_stage(codec: Codec, data: &[u8], limit: usize) -> Result<Vec<u8>> {
    match codec {
        Codec::Zlib => algorithms::zlib::decompress(data, limit),
        Codec::BZip2 => algorithms::bzip2::decompress(data, limit),
        Codec::Lzma => algorithms::lzma::decompress(data, limit),
        Codec::Sparse => algorithms::sparse::decompress(data, limit),
        Codec::PKWare => algorithms::pkware::explode(data, limit),
        Codec::Huffman | Codec::AdpcmMono | Codec::AdpcmStereo => {
            log::error!("{:?} decompression requested but not supported", codec);
            Err(Error::UnsupportedCodec(codec.mask()))
        }
    }
}
