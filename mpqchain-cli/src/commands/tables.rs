//! Hash and block table dumps

use super::open_archive;
use crate::{opts, output, OutputFormat, TableType};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct HashRow {
    index: usize,
    name_1: String,
    name_2: String,
    locale: u16,
    platform: u16,
    block_index: String,
}

#[derive(Serialize)]
struct BlockRow {
    index: usize,
    offset: u64,
    compressed_size: u32,
    file_size: u32,
    flags: String,
}

/// Display table contents
///
/// Empty hash slots are skipped unless `-v` is given.
pub fn show(archive_path: &str, table_type: TableType, limit: usize) -> Result<()> {
    let opts = opts();
    let archive = open_archive(archive_path)?;

    match table_type {
        TableType::Hash => {
            let rows: Vec<HashRow> = archive
                .hash_table()
                .entries()
                .iter()
                .enumerate()
                .filter(|(_, e)| opts.verbose > 0 || !e.is_empty())
                .take(limit)
                .map(|(index, e)| HashRow {
                    index,
                    name_1: format!("0x{:08X}", e.name_1),
                    name_2: format!("0x{:08X}", e.name_2),
                    locale: e.locale,
                    platform: e.platform,
                    block_index: if e.is_empty() {
                        "empty".to_string()
                    } else if e.is_deleted() {
                        "deleted".to_string()
                    } else {
                        e.block_index.to_string()
                    },
                })
                .collect();

            if opts.output != OutputFormat::Text {
                output::print_output(&rows)?;
            } else if !opts.quiet {
                output::heading(&format!(
                    "Hash table ({} entries)",
                    archive.hash_table().size()
                ));
                println!(
                    "{:>6}  {:<10}  {:<10}  {:>6}  {:>8}  {}",
                    "Index", "Name A", "Name B", "Locale", "Platform", "Block"
                );
                for row in &rows {
                    println!(
                        "{:>6}  {:<10}  {:<10}  {:>6}  {:>8}  {}",
                        row.index,
                        row.name_1,
                        row.name_2,
                        format!("{:04X}", row.locale),
                        row.platform,
                        row.block_index
                    );
                }
            }
        }
        TableType::Block => {
            let rows: Vec<BlockRow> = archive
                .block_table()
                .entries()
                .iter()
                .enumerate()
                .take(limit)
                .map(|(index, b)| BlockRow {
                    index,
                    offset: b.file_offset(),
                    compressed_size: b.compressed_size,
                    file_size: b.file_size,
                    flags: format!("{:?}", b.flags),
                })
                .collect();

            if opts.output != OutputFormat::Text {
                output::print_output(&rows)?;
            } else if !opts.quiet {
                output::heading(&format!(
                    "Block table ({} entries)",
                    archive.block_table().size()
                ));
                println!(
                    "{:>6}  {:>10}  {:>10}  {:>10}  {}",
                    "Index", "Offset", "Stored", "Size", "Flags"
                );
                for row in &rows {
                    println!(
                        "{:>6}  {:>10}  {:>10}  {:>10}  {}",
                        row.index,
                        format!("0x{:08X}", row.offset),
                        row.compressed_size,
                        row.file_size,
                        row.flags.dimmed()
                    );
                }
            }
        }
    }

    Ok(())
}
