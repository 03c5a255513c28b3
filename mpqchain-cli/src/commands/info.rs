//! Archive information

use super::{format_size, open_archive};
use crate::{opts, output, OutputFormat};
use anyhow::Result;
use mpqchain::MpqHeader;
use serde::Serialize;

#[derive(Serialize)]
struct ArchiveInfo<'a> {
    path: &'a str,
    header: &'a MpqHeader,
    sector_size: usize,
    hash_table_pos: u64,
    block_table_pos: u64,
    hi_block_table_pos: Option<u64>,
    hash_entries_used: usize,
    hash_entries_deleted: usize,
    files: usize,
    listed_files: usize,
}

/// Display header fields and table statistics
pub fn info(archive_path: &str) -> Result<()> {
    let opts = opts();
    let archive = open_archive(archive_path)?;
    let header = archive.header();

    let hash_entries = archive.hash_table().entries();
    let listed_files = match archive.list_files() {
        Ok(names) => names.len(),
        Err(e) => {
            log::warn!("Unreadable (listfile): {}", e);
            0
        }
    };

    let info = ArchiveInfo {
        path: archive_path,
        header,
        sector_size: archive.sector_size(),
        hash_table_pos: header.hash_table_pos(),
        block_table_pos: header.block_table_pos(),
        hi_block_table_pos: header.hi_block_table_pos(),
        hash_entries_used: hash_entries.iter().filter(|e| e.is_valid()).count(),
        hash_entries_deleted: hash_entries.iter().filter(|e| e.is_deleted()).count(),
        files: archive
            .block_table()
            .entries()
            .iter()
            .filter(|b| b.exists())
            .count(),
        listed_files,
    };

    if opts.output != OutputFormat::Text {
        output::print_output(&info)?;
        return Ok(());
    }
    if opts.quiet {
        return Ok(());
    }

    output::heading("MPQ Archive Information");
    output::field("File", info.path);
    output::field(
        "Archive size",
        format!("{} ({} bytes)", format_size(header.archive_size as u64), header.archive_size),
    );
    output::field(
        "Format version",
        format!("{} ({:?})", header.format_version, header.version()),
    );
    output::field("Header size", format!("{} bytes", header.header_size));
    output::field(
        "Sector size",
        format!("{} bytes (shift {})", info.sector_size, header.sector_size_shift),
    );

    println!();
    output::heading("Tables");
    output::field("Hash table offset", format!("0x{:08X}", info.hash_table_pos));
    output::field(
        "Hash table entries",
        format!(
            "{} ({} used, {} deleted)",
            header.hash_table_entries, info.hash_entries_used, info.hash_entries_deleted
        ),
    );
    output::field("Block table offset", format!("0x{:08X}", info.block_table_pos));
    output::field("Block table entries", header.block_table_entries);
    if let Some(pos) = info.hi_block_table_pos {
        output::field("Hi-block table offset", format!("0x{:08X}", pos));
    }

    println!();
    output::heading("Contents");
    output::field("Files", info.files);
    output::field("Listed in (listfile)", info.listed_files);

    Ok(())
}
