//! Existence check

use super::open_archive;
use crate::{opts, output, OutputFormat};
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct ExistsResult<'a> {
    archive: &'a str,
    file: &'a str,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u32>,
}

/// Print whether `file` is in the archive and return the answer
pub fn exists(archive_path: &str, file: &str) -> Result<bool> {
    let opts = opts();
    let archive = open_archive(archive_path)?;

    let found = archive.file_exists(file);
    let size = if found {
        archive.file_info(file)?.map(|info| info.file_size)
    } else {
        None
    };

    if opts.output != OutputFormat::Text {
        output::print_output(&ExistsResult {
            archive: archive_path,
            file,
            exists: found,
            size,
        })?;
    } else if !opts.quiet {
        println!("{}", found);
        if let Some(size) = size {
            output::verbose_println(1, &format!("{} is {} bytes", file, size));
        }
    }

    Ok(found)
}
