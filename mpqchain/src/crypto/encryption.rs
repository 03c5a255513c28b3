//! The MPQ stream cipher

use super::table::CRYPT_TABLE;

const SEED_INIT: u32 = 0xEEEE_EEEE;

#[inline]
fn next_key(key: u32) -> u32 {
    ((!key << 0x15).wrapping_add(0x1111_1111)) | (key >> 0x0B)
}

#[inline]
fn next_seed(seed: u32, plain: u32) -> u32 {
    plain
        .wrapping_add(seed)
        .wrapping_add(seed << 5)
        .wrapping_add(3)
}

/// Decrypt a block of words in place
pub fn decrypt_block(data: &mut [u32], mut key: u32) {
    let mut seed = SEED_INIT;

    for value in data.iter_mut() {
        seed = seed.wrapping_add(CRYPT_TABLE[0x400 + (key & 0xFF) as usize]);
        let plain = *value ^ key.wrapping_add(seed);
        *value = plain;

        key = next_key(key);
        seed = next_seed(seed, plain);
    }
}

/// Encrypt a block of words in place
pub fn encrypt_block(data: &mut [u32], mut key: u32) {
    let mut seed = SEED_INIT;

    for value in data.iter_mut() {
        seed = seed.wrapping_add(CRYPT_TABLE[0x400 + (key & 0xFF) as usize]);
        let plain = *value;
        *value = plain ^ key.wrapping_add(seed);

        key = next_key(key);
        seed = next_seed(seed, plain);
    }
}

/// Decrypt a single word as the first word of a block
pub fn decrypt_dword(value: u32, key: u32) -> u32 {
    let seed = SEED_INIT.wrapping_add(CRYPT_TABLE[0x400 + (key & 0xFF) as usize]);
    value ^ key.wrapping_add(seed)
}

/// Decrypt a byte buffer as little-endian words
///
/// Trailing bytes that do not fill a whole word are left as they are.
pub fn decrypt_bytes(data: &mut [u8], key: u32) {
    apply_to_bytes(data, key, decrypt_block);
}

/// Encrypt a byte buffer as little-endian words
///
/// Trailing bytes that do not fill a whole word are left as they are.
pub fn encrypt_bytes(data: &mut [u8], key: u32) {
    apply_to_bytes(data, key, encrypt_block);
}

fn apply_to_bytes(data: &mut [u8], key: u32, cipher: fn(&mut [u32], u32)) {
    let mut words: Vec<u32> = data
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    cipher(&mut words, key);

    for (chunk, word) in data.chunks_exact_mut(4).zip(&words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: [u32; 8] = [
        0x12345678, 0x9ABCDEF0, 0x13579BDF, 0x2468ACE0, 0xFEDCBA98, 0x76543210, 0xF0DEBC9A,
        0xE1C3A597,
    ];

    const CIPHER: [u32; 8] = [
        0x533922C0, 0x415526FA, 0xAEEEFA1F, 0xCAA77B16, 0x5EEAE319, 0xED3330F8, 0xE09B97EC,
        0x42315C85,
    ];

    const KEY: u32 = 0xC1EB1CEF;

    #[test]
    fn test_known_encryption() {
        let mut data = PLAIN;
        encrypt_block(&mut data, KEY);
        assert_eq!(data, CIPHER);
    }

    #[test]
    fn test_known_decryption() {
        let mut data = CIPHER;
        decrypt_block(&mut data, KEY);
        assert_eq!(data, PLAIN);
    }

    #[test]
    fn test_decrypt_single_dword() {
        assert_eq!(decrypt_dword(CIPHER[0], KEY), PLAIN[0]);
    }

    #[test]
    fn test_zero_key_still_encrypts() {
        let mut data = PLAIN;
        encrypt_block(&mut data, 0);
        assert_ne!(data, PLAIN);
        decrypt_block(&mut data, 0);
        assert_eq!(data, PLAIN);
    }

    #[test]
    fn test_bytes_leave_partial_word_untouched() {
        let original: Vec<u8> = (0u8..11).collect();
        let mut data = original.clone();

        encrypt_bytes(&mut data, KEY);
        assert_ne!(&data[..8], &original[..8]);
        assert_eq!(&data[8..], &original[8..]);

        decrypt_bytes(&mut data, KEY);
        assert_eq!(data, original);
    }

    #[test]
    fn test_bytes_match_word_cipher() {
        let mut bytes: Vec<u8> = PLAIN.iter().flat_map(|w| w.to_le_bytes()).collect();
        encrypt_bytes(&mut bytes, KEY);
        let expected: Vec<u8> = CIPHER.iter().flat_map(|w| w.to_le_bytes()).collect();
        assert_eq!(bytes, expected);
    }
}
