//! Hash algorithms for MPQ file name hashing

use crate::crypto::CRYPT_TABLE;

/// Hash types for MPQ operations
pub mod hash_type {
    /// Start index of the hash table probe
    pub const TABLE_OFFSET: u32 = 0;
    /// First name verification hash
    pub const NAME_A: u32 = 1;
    /// Second name verification hash
    pub const NAME_B: u32 = 2;
    /// Base key for file decryption
    pub const FILE_KEY: u32 = 3;
}

/// ASCII uppercase conversion table with `/` folded into `\`
pub const ASCII_TO_UPPER: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = i as u8;
        i += 1;
    }
    let mut c = b'a';
    while c <= b'z' {
        table[c as usize] = c - 32;
        c += 1;
    }
    table[b'/' as usize] = b'\\';
    table
};

/// Hash a file name using the MPQ hash algorithm
///
/// `hash_type` is one of the `hash_type` constants; only its low two bits are used.
///
/// The name is normalized first: ASCII letters are uppercased and `/`
/// separators become `\`, so `"a/b.txt"` and `"A\\B.TXT"` hash alike.
pub fn hash_string(filename: &str, hash_type: u32) -> u32 {
    let mut seed1: u32 = 0x7FED_7FED;
    let mut seed2: u32 = 0xEEEE_EEEE;
    let row = (hash_type as usize & 0x03) << 8;

    for &byte in filename.as_bytes() {
        let ch = ASCII_TO_UPPER[byte as usize] as u32;

        seed1 = CRYPT_TABLE[row + ch as usize] ^ seed1.wrapping_add(seed2);
        seed2 = ch
            .wrapping_add(seed1)
            .wrapping_add(seed2)
            .wrapping_add(seed2 << 5)
            .wrapping_add(3);
    }

    seed1
}

/// Compute the three lookup hashes of a path: (table offset, name A, name B)
pub fn compute_file_hashes(filename: &str) -> (u32, u32, u32) {
    (
        hash_string(filename, hash_type::TABLE_OFFSET),
        hash_string(filename, hash_type::NAME_A),
        hash_string(filename, hash_type::NAME_B),
    )
}

/// Hash the base name of a path with [`hash_type::FILE_KEY`]
pub fn hash_file_key(path: &str) -> u32 {
    hash_string(base_name(path), hash_type::FILE_KEY)
}

/// The portion of a path after its last `\` or `/`
pub fn base_name(path: &str) -> &str {
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}
