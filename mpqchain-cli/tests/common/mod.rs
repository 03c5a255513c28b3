//! Minimal archive writer for command tests
//!
//! Files are stored uncompressed as single units; tables are encrypted.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use mpqchain::crypto::{encrypt_block, BLOCK_TABLE_KEY, HASH_TABLE_KEY};
use mpqchain::hash::{hash_string, hash_type};
use mpqchain::signatures;
use std::path::Path;

const HASH_TABLE_SIZE: usize = 16;

pub fn build_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = vec![0u8; 0x20];
    let mut blocks = Vec::new();
    for (_, content) in files {
        blocks.push([out.len() as u32, content.len() as u32, content.len() as u32, 0x8100_0000]);
        out.extend_from_slice(content);
    }
    blocks.resize(blocks.len().max(1).next_power_of_two(), [0; 4]);

    let mut hash = vec![[u32::MAX; 4]; HASH_TABLE_SIZE];
    for (index, (name, _)) in files.iter().enumerate() {
        let mut slot = hash_string(name, hash_type::TABLE_OFFSET) as usize % HASH_TABLE_SIZE;
        while hash[slot][3] != u32::MAX {
            slot = (slot + 1) % HASH_TABLE_SIZE;
        }
        hash[slot] = [
            hash_string(name, hash_type::NAME_A),
            hash_string(name, hash_type::NAME_B),
            0,
            index as u32,
        ];
    }

    let hash_pos = out.len() as u32;
    let mut words: Vec<u32> = hash.concat();
    encrypt_block(&mut words, HASH_TABLE_KEY);
    for word in words {
        out.write_u32::<LittleEndian>(word).unwrap();
    }

    let block_pos = out.len() as u32;
    let mut words: Vec<u32> = blocks.concat();
    encrypt_block(&mut words, BLOCK_TABLE_KEY);
    for word in words {
        out.write_u32::<LittleEndian>(word).unwrap();
    }

    let mut header = Vec::new();
    header.write_u32::<LittleEndian>(signatures::MPQ_ARCHIVE).unwrap();
    header.write_u32::<LittleEndian>(0x20).unwrap();
    header.write_u32::<LittleEndian>(out.len() as u32).unwrap();
    header.write_u16::<LittleEndian>(0).unwrap();
    header.write_u16::<LittleEndian>(3).unwrap();
    header.write_u32::<LittleEndian>(hash_pos).unwrap();
    header.write_u32::<LittleEndian>(block_pos).unwrap();
    header.write_u32::<LittleEndian>(HASH_TABLE_SIZE as u32).unwrap();
    header.write_u32::<LittleEndian>(blocks.len() as u32).unwrap();
    out[..0x20].copy_from_slice(&header);
    out
}

/// Write an archive whose (listfile) names every file
pub fn write_archive(path: &Path, files: &[(&str, &[u8])]) {
    let listing = files.iter().map(|(name, _)| *name).collect::<Vec<_>>().join("\r\n");
    let mut all = files.to_vec();
    all.push(("(listfile)", listing.as_bytes()));
    std::fs::write(path, build_archive(&all)).unwrap();
}
