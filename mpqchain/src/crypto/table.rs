//! The shared MPQ crypt table

/// Lookup table backing both name hashing and the file cipher
///
/// Rows of 0x100 entries: rows 0-3 serve the four hash kinds, row 4
/// (0x400..0x500) feeds the cipher's seed schedule. Computed at compile time.
pub static CRYPT_TABLE: [u32; 0x500] = generate_crypt_table();

const fn generate_crypt_table() -> [u32; 0x500] {
    let mut table = [0u32; 0x500];
    let mut seed: u32 = 0x0010_0001;

    let mut i = 0;
    while i < 0x100 {
        let mut index = i;
        let mut pass = 0;
        while pass < 5 {
            // seed stays below 0x2AAAAB, so seed * 125 never overflows u32
            seed = (seed * 125 + 3) % 0x002A_AAAB;
            let high = (seed & 0xFFFF) << 0x10;
            seed = (seed * 125 + 3) % 0x002A_AAAB;
            let low = seed & 0xFFFF;

            table[index] = high | low;

            index += 0x100;
            pass += 1;
        }
        i += 1;
    }

    table
}
