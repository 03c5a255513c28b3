//! LZMA decompression
//!
//! MPQ LZMA sectors hold a filter byte (always zero), the five LZMA property
//! bytes and the raw stream. The uncompressed size is not stored.

use crate::{Error, Result};
use lzma_rs::decompress::{Options, UnpackedSize};
use std::io::Cursor;

/// Decompress an MPQ LZMA payload of exactly `size` bytes
pub(crate) fn decompress(data: &[u8], size: usize) -> Result<Vec<u8>> {
    let (&filter, stream) = data
        .split_first()
        .ok_or_else(|| Error::decode("lzma: empty payload"))?;
    if filter != 0 {
        return Err(Error::decode(format!("lzma: unknown filter 0x{filter:02X}")));
    }

    let options = Options {
        unpacked_size: UnpackedSize::UseProvided(Some(size as u64)),
        ..Default::default()
    };

    let mut decompressed = Vec::with_capacity(size);
    lzma_rs::lzma_decompress_with_options(&mut Cursor::new(stream), &mut decompressed, &options)
        .map_err(|e| Error::decode(format!("lzma: {e}")))?;
    Ok(decompressed)
}
