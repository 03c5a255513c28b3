//! PKWare Data Compression Library "explode"
//!
//! The stream opens with two bytes: literal mode (0 = raw 8-bit literals,
//! 1 = Huffman-coded literals) and the dictionary size exponent (4..=6).
//! Bits are read least-significant first; Huffman codes are stored
//! bit-inverted. Decoding stops at the end code (length 519) or once
//! `limit` bytes have been produced.

use crate::{Error, Result};

const MAX_BITS: usize = 13;

/// Length of the end-of-stream code
const END_OF_STREAM: usize = 519;

// Code lengths, run-length encoded: low nibble is the length, high nibble
// plus one is the repeat count.
const LITERAL_LENGTHS: [u8; 98] = [
    11, 124, 8, 7, 28, 7, 188, 13, 76, 4, 10, 8, 12, 10, 12, 10, 8, 23, 8, 9, 7, 6, 7, 8, 7, 6,
    55, 8, 23, 24, 12, 11, 7, 9, 11, 12, 6, 7, 22, 5, 7, 24, 6, 11, 9, 6, 7, 22, 7, 11, 38, 7, 9,
    8, 25, 11, 8, 11, 9, 12, 8, 12, 5, 38, 5, 38, 5, 11, 7, 5, 6, 21, 6, 10, 53, 8, 7, 24, 10, 27,
    44, 253, 253, 253, 252, 252, 252, 13, 12, 45, 12, 45, 12, 61, 12, 45, 44, 173,
];
const LENGTH_LENGTHS: [u8; 6] = [2, 35, 36, 53, 38, 23];
const DISTANCE_LENGTHS: [u8; 7] = [2, 20, 53, 230, 247, 151, 248];

const LENGTH_BASE: [u16; 16] = [3, 2, 4, 5, 6, 7, 8, 9, 10, 12, 16, 24, 40, 72, 136, 264];
const LENGTH_EXTRA: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8];

/// Canonical Huffman decoding table
struct Huffman {
    count: [u16; MAX_BITS + 1],
    symbol: Vec<u16>,
}

impl Huffman {
    fn new(compact: &[u8], symbols: usize) -> Self {
        let mut lengths = Vec::with_capacity(symbols);
        for &byte in compact {
            let length = byte & 0x0F;
            for _ in 0..=(byte >> 4) {
                lengths.push(length);
            }
        }

        let mut count = [0u16; MAX_BITS + 1];
        for &length in &lengths {
            count[length as usize] += 1;
        }

        let mut offsets = [0u16; MAX_BITS + 1];
        for len in 1..MAX_BITS {
            offsets[len + 1] = offsets[len] + count[len];
        }

        let mut symbol = vec![0u16; lengths.len()];
        for (value, &length) in lengths.iter().enumerate() {
            if length != 0 {
                symbol[offsets[length as usize] as usize] = value as u16;
                offsets[length as usize] += 1;
            }
        }

        Self { count, symbol }
    }
}

struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    buffer: u32,
    available: u32,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            buffer: 0,
            available: 0,
        }
    }

    fn bits(&mut self, need: u32) -> Result<u32> {
        while self.available < need {
            let byte = *self
                .data
                .get(self.pos)
                .ok_or_else(|| Error::decode("pkware: unexpected end of data"))?;
            self.pos += 1;
            self.buffer |= (byte as u32) << self.available;
            self.available += 8;
        }

        let value = self.buffer & ((1u32 << need) - 1);
        self.buffer >>= need;
        self.available -= need;
        Ok(value)
    }

    fn decode(&mut self, table: &Huffman) -> Result<usize> {
        let mut code: i32 = 0;
        let mut first: i32 = 0;
        let mut index: i32 = 0;

        for len in 1..=MAX_BITS {
            code |= (self.bits(1)? ^ 1) as i32;
            let count = table.count[len] as i32;
            if code < first + count {
                return Ok(table.symbol[(index + code - first) as usize] as usize);
            }
            index += count;
            first += count;
            first <<= 1;
            code <<= 1;
        }

        Err(Error::decode("pkware: invalid Huffman code"))
    }
}

/// Explode a PKWare DCL stream into at most `limit` bytes
pub(crate) fn explode(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut input = BitReader::new(data);

    let coded_literals = match input.bits(8)? {
        0 => false,
        1 => true,
        other => {
            return Err(Error::decode(format!(
                "pkware: invalid literal mode {other}"
            )))
        }
    };
    let dict_bits = input.bits(8)?;
    if !(4..=6).contains(&dict_bits) {
        return Err(Error::decode(format!(
            "pkware: invalid dictionary size {dict_bits}"
        )));
    }

    let literal_code = Huffman::new(&LITERAL_LENGTHS, 256);
    let length_code = Huffman::new(&LENGTH_LENGTHS, 16);
    let distance_code = Huffman::new(&DISTANCE_LENGTHS, 64);

    let mut output = Vec::with_capacity(limit);

    while output.len() < limit {
        if input.bits(1)? == 1 {
            let symbol = input.decode(&length_code)?;
            let length = LENGTH_BASE[symbol] as usize
                + input.bits(LENGTH_EXTRA[symbol] as u32)? as usize;
            if length == END_OF_STREAM {
                break;
            }

            let shift = if length == 2 { 2 } else { dict_bits };
            let distance =
                ((input.decode(&distance_code)? << shift) | input.bits(shift)? as usize) + 1;
            if distance > output.len() {
                return Err(Error::decode(format!(
                    "pkware: distance {distance} reaches before start of output"
                )));
            }

            let start = output.len() - distance;
            for i in 0..length.min(limit - output.len()) {
                let byte = output[start + i];
                output.push(byte);
            }
        } else {
            let literal = if coded_literals {
                input.decode(&literal_code)? as u8
            } else {
                input.bits(8)? as u8
            };
            output.push(literal);
        }
    }

    Ok(output)
}
