//! Encryption, decryption and key derivation for MPQ archives
//!
//! Hashing and the stream cipher both draw on the same 1280-entry table
//! (`CRYPT_TABLE`); the hash functions themselves live in [`crate::hash`].

mod encryption;
mod keys;
mod table;

pub use encryption::{decrypt_block, decrypt_bytes, decrypt_dword, encrypt_block, encrypt_bytes};
pub use keys::{file_key, BLOCK_TABLE_KEY, HASH_TABLE_KEY};
pub use table::CRYPT_TABLE;
