//! Sector decompression through the public codec API

mod common;

use common::{bzip2, lzma, sparse, zlib};
use mpqchain::compression::{decompress, explode, flags, Codec};
use mpqchain::Error;

fn sector(method: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut data = vec![method];
    data.extend(payload);
    data
}

#[test]
fn test_each_codec() {
    let test_cases = vec![
        b"Hello, World!".repeat(40),
        b"A".repeat(1000),                        // Highly compressible
        (0u8..=255).cycle().take(2048).collect(), // All byte values
    ];

    for original in test_cases {
        let size = original.len();
        assert_eq!(decompress(&sector(flags::ZLIB, zlib(&original)), size).unwrap(), original);
        assert_eq!(decompress(&sector(flags::BZIP2, bzip2(&original)), size).unwrap(), original);
        assert_eq!(decompress(&sector(flags::LZMA, lzma(&original)), size).unwrap(), original);
        assert_eq!(decompress(&sector(flags::SPARSE, sparse(&original)), size).unwrap(), original);
    }
}

#[test]
fn test_sparse_then_entropy_coder() {
    let mut original = vec![0u8; 3000];
    original[100..110].copy_from_slice(b"not zeroes");
    original[2990] = 7;

    let zlib_sector = sector(flags::SPARSE | flags::ZLIB, zlib(&sparse(&original)));
    assert_eq!(decompress(&zlib_sector, original.len()).unwrap(), original);

    let bzip2_sector = sector(flags::SPARSE | flags::BZIP2, bzip2(&sparse(&original)));
    assert_eq!(decompress(&bzip2_sector, original.len()).unwrap(), original);
}

#[test]
fn test_bzip2_over_zlib() {
    let original = b"stacked codecs ".repeat(64);
    let data = sector(flags::ZLIB | flags::BZIP2, bzip2(&zlib(&original)));
    assert_eq!(decompress(&data, original.len()).unwrap(), original);
}

#[test]
fn test_pkware_vector() {
    let aia = [0x00, 0x04, 0x82, 0x24, 0x25, 0x8F, 0x80, 0x7F];
    assert_eq!(explode(&aia, 13).unwrap(), b"AIAIAIAIAIAIA");
    assert_eq!(decompress(&sector(flags::PKWARE, aia.to_vec()), 13).unwrap(), b"AIAIAIAIAIAIA");

}

#[test]
fn test_invalid_compressed_data() {
    let garbage = b"This is not compressed data!".to_vec();

    for method in [flags::ZLIB, flags::BZIP2, flags::LZMA] {
        let result = decompress(&sector(method, garbage.clone()), 100);
        assert!(matches!(result, Err(Error::Decode(_))), "method 0x{method:02X}");
    }
}

#[test]
fn test_unsupported_methods() {
    for method in [flags::HUFFMAN, flags::ADPCM_MONO | flags::HUFFMAN, flags::ADPCM_STEREO] {
        let result = decompress(&[method, 1, 2, 3, 4], 64);
        assert!(matches!(result, Err(Error::UnsupportedCodec(_))), "method 0x{method:02X}");
    }
    assert!(matches!(
        Codec::chain(0x04),
        Err(Error::UnsupportedCodec(0x04))
    ));
}
