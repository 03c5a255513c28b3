//! Sparse (zero-run) decompression
//!
//! Layout: a big-endian u32 with the decoded size, then control bytes. A
//! control byte with the high bit set is followed by `(b & 0x7F) + 1`
//! literal bytes; otherwise it stands for `(b & 0x7F) + 3` zero bytes.
//! Zeros at the end of the data may be left implicit.

use crate::{Error, Result};

/// Decompress sparse data, never producing more than `limit` bytes
pub(crate) fn decompress(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    if data.len() < 4 {
        return Err(Error::decode("sparse: missing size header"));
    }

    let declared = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if declared > limit {
        return Err(Error::decode(format!(
            "sparse: declared size {declared} exceeds expected {limit}"
        )));
    }

    let mut output = Vec::with_capacity(declared);
    let mut pos = 4;

    while pos < data.len() && output.len() < declared {
        let control = data[pos];
        pos += 1;

        if control & 0x80 != 0 {
            let count = (control & 0x7F) as usize + 1;
            let literals = data.get(pos..pos + count).ok_or_else(|| {
                Error::decode("sparse: literal run past end of data")
            })?;
            let room = declared - output.len();
            output.extend_from_slice(&literals[..count.min(room)]);
            pos += count;
        } else {
            let count = (control & 0x7F) as usize + 3;
            let room = declared - output.len();
            output.resize(output.len() + count.min(room), 0);
        }
    }

    output.resize(declared, 0);
    Ok(output)
}
