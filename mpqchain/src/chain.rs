//! Layering several archives into one namespace
//!
//! Archives are ranked by the first priority pattern their file stem
//! matches. A lookup walks the archives in ascending rank and stops at the
//! first archive that contains the path, so patch archives shadow the base
//! content they override.

use crate::{Archive, Error, Result};
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;

/// Archive priorities of a World of Warcraft 3.x client, highest first
///
/// The final `*` pattern ranks every other archive last.
pub const WOW_ARCHIVE_PRIORITIES: &[&str] = &[
    "patch-????-?",
    "patch-????",
    "patch-3",
    "patch-2",
    "patch-?",
    "patch",
    "lichking-locale-????",
    "expansion-locale-????",
    "locale-????",
    "lichking-speech-????",
    "expansion-speech-????",
    "speech-????",
    "lichking",
    "expansion",
    "common-2",
    "common",
    "base",
    "*",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Read access shared by single archives and chains
pub trait FileSource {
    /// Check whether `path` can be read from this source
    fn file_exists(&self, path: &str) -> bool;

    /// Read `path`, returning `None` when it is absent
    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>>;
}

impl FileSource for Archive {
    fn file_exists(&self, path: &str) -> bool {
        Archive::file_exists(self, path)
    }

    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Archive::read_file(self, path)
    }
}

/// An ordered set of borrowed archives
#[derive(Debug)]
pub struct ArchiveChain<'a> {
    priorities: Vec<Pattern>,
    /// (rank, archive), ascending by rank, insertion order within a rank
    archives: Vec<(usize, &'a Archive)>,
}

impl<'a> ArchiveChain<'a> {
    /// Create a chain ranked by [`WOW_ARCHIVE_PRIORITIES`]
    pub fn new() -> Self {
        let priorities = WOW_ARCHIVE_PRIORITIES
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .collect();
        Self {
            priorities,
            archives: Vec::new(),
        }
    }

    /// Create a chain with custom priority patterns, highest first
    pub fn with_priorities<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let priorities = patterns
            .into_iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            priorities,
            archives: Vec::new(),
        })
    }

    /// Priority patterns in rank order
    pub fn priorities(&self) -> impl Iterator<Item = &str> {
        self.priorities.iter().map(Pattern::as_str)
    }

    /// Rank an archive name would get, if any pattern matches it
    ///
    /// `name` may be a file name or a path; only its stem is compared.
    pub fn priority_for(&self, name: &str) -> Option<usize> {
        let stem = archive_stem(name);
        self.priorities
            .iter()
            .position(|pattern| pattern.matches_with(&stem, MATCH_OPTIONS))
    }

    /// Add an archive and return its rank
    ///
    /// Adding an archive that is already in the chain leaves the chain
    /// unchanged and returns the existing rank.
    pub fn add_archive(&mut self, archive: &'a Archive) -> Result<usize> {
        if let Some(&(rank, _)) = self
            .archives
            .iter()
            .find(|(_, existing)| std::ptr::eq(*existing, archive))
        {
            log::warn!("{} is already in the chain", display_name(archive));
            return Ok(rank);
        }

        let name = archive.name().unwrap_or_default();
        let rank = self
            .priority_for(name)
            .ok_or_else(|| Error::NoMatchingPriority(display_name(archive)))?;

        let index = self.archives.partition_point(|&(r, _)| r <= rank);
        self.archives.insert(index, (rank, archive));

        log::debug!(
            "Added {} to the chain at rank {} (position {})",
            display_name(archive),
            rank,
            index
        );
        Ok(rank)
    }

    /// Find the archive that serves `path`
    ///
    /// The walk stops at the first archive that has the path or whose
    /// lookup fails; a corrupt entry in a higher-ranked archive is reported
    /// instead of falling through to lower-ranked content.
    pub fn resolve(&self, path: &str) -> Result<Option<&'a Archive>> {
        for &(_, archive) in &self.archives {
            if archive.file_info(path)?.is_some() {
                return Ok(Some(archive));
            }
        }
        Ok(None)
    }

    /// Archive that serves `path`, if any
    ///
    /// A failed lookup is logged and reported as `None`.
    pub fn archive_for(&self, path: &str) -> Option<&'a Archive> {
        match self.resolve(path) {
            Ok(archive) => archive,
            Err(e) => {
                log::warn!("lookup of {path:?} in the chain failed: {e}");
                None
            }
        }
    }

    /// Check whether the chain can serve `path`
    pub fn file_exists(&self, path: &str) -> bool {
        self.archive_for(path).is_some()
    }

    /// Read `path` from the highest-priority archive containing it
    pub fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.resolve(path)? {
            Some(archive) => {
                log::trace!("{:?} served by {}", path, display_name(archive));
                archive.read_file(path)
            }
            None => Ok(None),
        }
    }

    /// Archives with their ranks, in lookup order
    pub fn archives(&self) -> impl Iterator<Item = (usize, &'a Archive)> + '_ {
        self.archives.iter().copied()
    }

    /// Number of archives in the chain
    pub fn len(&self) -> usize {
        self.archives.len()
    }

    /// Check if the chain holds no archives
    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    /// Union of all listfiles, in lookup order
    ///
    /// Names differing only in case or separator are listed once, with the
    /// spelling of the highest-priority archive. An archive whose
    /// (listfile) cannot be read is logged and left out of the union.
    pub fn list_files(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for &(_, archive) in &self.archives {
            let names = match archive.list_files() {
                Ok(names) => names,
                Err(e) => {
                    log::warn!("Skipping (listfile) of {}: {}", display_name(archive), e);
                    continue;
                }
            };
            for name in names {
                if seen.insert(name.to_ascii_lowercase().replace('/', "\\")) {
                    files.push(name);
                }
            }
        }
        files
    }
}

impl Default for ArchiveChain<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSource for ArchiveChain<'_> {
    fn file_exists(&self, path: &str) -> bool {
        ArchiveChain::file_exists(self, path)
    }

    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        ArchiveChain::read_file(self, path)
    }
}

/// Lowercased file name without directories or the `.mpq` extension
fn archive_stem(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let lower = base.to_ascii_lowercase();
    match lower.strip_suffix(".mpq") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

fn display_name(archive: &Archive) -> String {
    match archive.path() {
        Some(path) => path.display().to_string(),
        None => "<unnamed archive>".to_string(),
    }
}
