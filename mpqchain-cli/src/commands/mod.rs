//! Command implementations

pub mod chain;
pub mod exists;
pub mod extract;
pub mod hash;
pub mod info;
pub mod list;
pub mod tables;

use anyhow::{Context, Result};
use mpqchain::Archive;

/// Open an archive with the configured options
pub fn open_archive(path: &str) -> Result<Archive> {
    crate::opts()
        .config
        .open_options()
        .open(path)
        .with_context(|| format!("Failed to open archive: {}", path))
}

/// Human readable byte count
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
