//! zlib decompression

use crate::{Error, Result};
use flate2::read::ZlibDecoder;
use std::io::Read;

/// Inflate a zlib stream, reading at most one byte past `limit`
pub(crate) fn decompress(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut decompressed = Vec::with_capacity(limit);
    ZlibDecoder::new(data)
        .take(limit as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::decode(format!("zlib: {e}")))?;
    Ok(decompressed)
}
