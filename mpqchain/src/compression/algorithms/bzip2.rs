//! bzip2 decompression

use crate::{Error, Result};
use bzip2::read::BzDecoder;
use std::io::Read;

/// Decompress a bzip2 stream, reading at most one byte past `limit`
pub(crate) fn decompress(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut decompressed = Vec::with_capacity(limit);
    BzDecoder::new(data)
        .take(limit as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::decode(format!("bzip2: {e}")))?;
    Ok(decompressed)
}
