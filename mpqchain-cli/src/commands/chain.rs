//! Resolve a file across every archive of a game directory

use super::format_size;
use crate::{opts, output, OutputFormat};
use anyhow::{bail, Context, Result};
use colored::*;
use glob::{MatchOptions, Pattern};
use mpqchain::{Archive, Error};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Serialize)]
struct ChainEntry {
    path: String,
    rank: usize,
    contains: bool,
}

#[derive(Serialize)]
struct ChainResult {
    file: String,
    resolved: Option<String>,
    size: Option<usize>,
    archives: Vec<ChainEntry>,
}

/// Find every `*.mpq` below `dir`, case-insensitively, sorted by path
fn find_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new("*.mpq")?;
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| pattern.matches_with(name, options));
        if matches {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Build a chain from the archives in `dir` and report which one serves `file`
///
/// An archive that fails to open aborts the command unless `skip_broken` is
/// set, in which case it is left out of the chain with a warning.
pub fn resolve(dir: &Path, file: &str, extract: Option<&Path>, skip_broken: bool) -> Result<()> {
    let opts = opts();
    let config = &opts.config;

    let paths = find_archives(dir)?;
    if paths.is_empty() {
        bail!("No MPQ archives found in {}", dir.display());
    }

    let mut archives = Vec::with_capacity(paths.len());
    for path in &paths {
        match config.open_options().open(path) {
            Ok(archive) => archives.push(archive),
            Err(e) if skip_broken => log::warn!("Skipping {}: {}", path.display(), e),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to load MPQ archive: {}", path.display()))
            }
        }
    }

    let mut chain = config.chain()?;
    for archive in &archives {
        match chain.add_archive(archive) {
            Ok(rank) => output::verbose_println(
                2,
                &format!("{} has rank {}", display_path(archive), rank),
            ),
            Err(Error::NoMatchingPriority(name)) => {
                log::warn!("Skipping {}: no priority pattern matches", name)
            }
            Err(e) => return Err(e.into()),
        }
    }

    let winner = chain.archive_for(file);
    let data = chain
        .read_file(file)
        .with_context(|| format!("Failed to read {}", file))?;

    if let (Some(target), Some(data)) = (extract, &data) {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, data)
            .with_context(|| format!("Failed to write {}", target.display()))?;
    }

    let result = ChainResult {
        file: file.to_string(),
        resolved: winner.map(display_path),
        size: data.as_ref().map(Vec::len),
        archives: chain
            .archives()
            .map(|(rank, archive)| ChainEntry {
                path: display_path(archive),
                rank,
                contains: archive.file_exists(file),
            })
            .collect(),
    };

    if opts.output != OutputFormat::Text {
        output::print_output(&result)?;
    } else if !opts.quiet {
        print_text(&result, extract);
    }

    if result.resolved.is_none() {
        bail!("{} is not in any archive", file);
    }
    Ok(())
}

fn print_text(result: &ChainResult, extract: Option<&Path>) {
    if opts().verbose > 0 {
        output::heading("Archives in lookup order");
        for entry in &result.archives {
            let marker = if entry.contains { "*" } else { " " };
            println!("  {} {:>3}  {}", marker, entry.rank, entry.path);
        }
        println!();
    }

    match (&result.resolved, result.size) {
        (Some(archive), Some(size)) => {
            println!(
                "{} {} ({}) is served by {}",
                "✓".green(),
                result.file.cyan(),
                format_size(size as u64),
                archive.bold()
            );
            if let Some(target) = extract {
                println!("  written to {}", target.display());
            }
        }
        _ => println!("{} {} is not in any archive", "✗".red(), result.file),
    }
}

fn display_path(archive: &Archive) -> String {
    archive
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}
