//! Extract command implementation

use super::{format_size, open_archive};
use crate::{opts, output, OutputFormat};
use anyhow::{bail, Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use mpqchain::Archive;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Serialize)]
struct ExtractResult {
    archive: String,
    output_dir: String,
    total_files: usize,
    extracted: usize,
    failed: usize,
    files: Vec<FileExtractResult>,
}

#[derive(Serialize)]
struct FileExtractResult {
    filename: String,
    output_path: String,
    size: u64,
    status: String, // "success", "missing" or "failed"
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Extract files from an MPQ archive
///
/// With no explicit files every name in the (listfile) is extracted.
pub fn extract(archive_path: &str, output_dir: &str, files: &[String]) -> Result<()> {
    let opts = opts();
    let archive = open_archive(archive_path)?;

    let names = if files.is_empty() {
        let names = archive.list_files()?;
        if names.is_empty() {
            bail!("{} has no (listfile); name the files to extract with -f", archive_path);
        }
        names
    } else {
        files.to_vec()
    };

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir))?;

    let show_progress = !opts.quiet && opts.output == OutputFormat::Text && names.len() > 1;
    let progress = if show_progress {
        let bar = ProgressBar::new(names.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut results = Vec::with_capacity(names.len());
    for name in &names {
        progress.set_message(name.clone());
        let output_path = build_output_path(output_dir, name);
        let result = match extract_file(&archive, name, &output_path) {
            Ok(Some(size)) => FileExtractResult {
                filename: name.clone(),
                output_path: output_path.display().to_string(),
                size: size as u64,
                status: "success".to_string(),
                error: None,
            },
            Ok(None) => FileExtractResult {
                filename: name.clone(),
                output_path: output_path.display().to_string(),
                size: 0,
                status: "missing".to_string(),
                error: None,
            },
            Err(e) => {
                log::warn!("Failed to extract {}: {:#}", name, e);
                FileExtractResult {
                    filename: name.clone(),
                    output_path: output_path.display().to_string(),
                    size: 0,
                    status: "failed".to_string(),
                    error: Some(format!("{:#}", e)),
                }
            }
        };
        output::verbose_println(1, &format!("{} -> {}", name, result.status));
        results.push(result);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let extracted = results.iter().filter(|r| r.status == "success").count();
    let failed = results.len() - extracted;
    let summary = ExtractResult {
        archive: archive_path.to_string(),
        output_dir: output_dir.to_string(),
        total_files: results.len(),
        extracted,
        failed,
        files: results,
    };

    if opts.output != OutputFormat::Text {
        output::print_output(&summary)?;
    } else if !opts.quiet {
        for file in summary.files.iter().filter(|f| f.status != "success") {
            let detail = file.error.as_deref().unwrap_or("not in archive");
            println!("{} {}: {}", "✗".red(), file.filename, detail);
        }
        let total: u64 = summary.files.iter().map(|f| f.size).sum();
        println!(
            "{} Extracted {} of {} files ({}) to {}",
            if failed == 0 { "✓".green() } else { "!".yellow() },
            extracted,
            summary.total_files,
            format_size(total),
            output_dir
        );
    }

    if failed > 0 && extracted == 0 {
        bail!("No files extracted");
    }
    Ok(())
}

/// Read one file and write it below the output directory
fn extract_file(archive: &Archive, name: &str, output_path: &Path) -> Result<Option<usize>> {
    let Some(data) = archive.read_file(name)? else {
        return Ok(None);
    };

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(output_path, &data)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    Ok(Some(data.len()))
}

/// Map an archive path onto the output directory
///
/// Backslash separators become directories; root, prefix and `..`
/// components are dropped so nothing lands outside `output_dir`.
fn build_output_path(output_dir: &str, archive_name: &str) -> PathBuf {
    let relative = archive_name.replace('\\', "/");
    let mut path = PathBuf::from(output_dir);
    for component in Path::new(&relative).components() {
        if let Component::Normal(part) = component {
            path.push(part);
        }
    }
    path
}
