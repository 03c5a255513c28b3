//! Encryption key derivation

use crate::hash::hash_file_key;

/// Key of the encrypted hash table, `hash("(hash table)", FILE_KEY)`
pub const HASH_TABLE_KEY: u32 = 0xC3AF_3770;

/// Key of the encrypted block table, `hash("(block table)", FILE_KEY)`
pub const BLOCK_TABLE_KEY: u32 = 0xEC83_B3A3;

/// Derive the decryption key of a stored file
///
/// The base key hashes the file's base name only. When `adjusted` is set the
/// key is mixed with the block's position and size:
/// `(base + file_pos) ^ file_size`.
pub fn file_key(path: &str, file_pos: u32, file_size: u32, adjusted: bool) -> u32 {
    let base = hash_file_key(path);
    if adjusted {
        base.wrapping_add(file_pos) ^ file_size
    } else {
        base
    }
}
