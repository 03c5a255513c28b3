//! List command implementation

use super::{format_size, open_archive};
use crate::{opts, output, OutputFormat};
use anyhow::Result;
use colored::*;
use mpqchain::Archive;
use serde::Serialize;

#[derive(Serialize)]
struct FileListEntry {
    filename: String,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compressed_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<String>,
}

/// List the files named by an archive's (listfile)
pub fn list(archive_path: &str) -> Result<()> {
    let opts = opts();
    let archive = open_archive(archive_path)?;
    let names = archive.list_files()?;
    let entries = collect_entries(&archive, &names);

    if opts.output != OutputFormat::Text {
        output::print_output(&entries)?;
        return Ok(());
    }
    if opts.quiet {
        return Ok(());
    }

    if output::use_color() {
        println!("{}: {}", "Archive".bold(), archive_path.cyan());
    } else {
        println!("Archive: {}", archive_path);
    }

    if names.is_empty() {
        println!(
            "{}",
            "No (listfile) found in archive; file names cannot be recovered from hashes".yellow()
        );
        return Ok(());
    }

    for entry in &entries {
        match (entry.size, entry.compressed_size, &entry.flags) {
            (Some(size), Some(compressed), Some(flags)) if opts.verbose > 0 => {
                println!(
                    "{:>12} {:>12}  {:<40} {}",
                    format_size(size as u64),
                    format_size(compressed as u64),
                    entry.filename,
                    flags.dimmed()
                );
            }
            _ if !entry.exists => {
                println!("{} {}", entry.filename, "(missing)".red());
            }
            _ => println!("{}", entry.filename),
        }
    }

    println!();
    println!("{} files", entries.len());
    Ok(())
}

fn collect_entries(archive: &Archive, names: &[String]) -> Vec<FileListEntry> {
    names
        .iter()
        .map(|name| {
            let info = archive.file_info(name).unwrap_or_else(|e| {
                log::warn!("{}: {}", name, e);
                None
            });
            FileListEntry {
                filename: name.clone(),
                exists: info.is_some(),
                size: info.as_ref().map(|i| i.file_size),
                compressed_size: info.as_ref().map(|i| i.compressed_size),
                flags: info.as_ref().map(|i| format!("{:?}", i.flags)),
            }
        })
        .collect()
}
