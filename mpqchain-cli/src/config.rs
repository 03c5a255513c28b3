//! Configuration file support

use crate::OutputFormat;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use mpqchain::{ArchiveChain, OpenOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Archive priority patterns for `chain`, highest first
    pub priorities: Option<Vec<String>>,

    /// Preferred locale (Windows LANGID)
    pub locale: Option<u16>,

    /// Reject block tables whose size is not a power of two
    pub strict_block_table: Option<bool>,

    /// Default output format
    pub default_output: Option<String>,
}

impl Config {
    /// Options for opening archives
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions::new()
            .strict_block_table(self.strict_block_table.unwrap_or(false))
            .locale(self.locale)
    }

    /// Empty chain ranked by the configured or the default priorities
    pub fn chain<'a>(&self) -> Result<ArchiveChain<'a>> {
        match &self.priorities {
            Some(patterns) => ArchiveChain::with_priorities(patterns)
                .context("Invalid priority pattern in configuration"),
            None => Ok(ArchiveChain::new()),
        }
    }

    /// Output format named by `default_output`
    pub fn output_format(&self) -> Result<OutputFormat> {
        match self.default_output.as_deref() {
            None => Ok(OutputFormat::Text),
            Some(name) => match OutputFormat::from_str(name, true) {
                Ok(format) => Ok(format),
                Err(_) => bail!("Unknown output format in configuration: {name}"),
            },
        }
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = Vec::new();
    if let Some(home) = dirs::home_dir() {
        locations.push(home.join(".mpqchain").join("config.toml"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        locations.push(config_dir.join("mpqchain").join("config.toml"));
    }
    locations
}

/// Load configuration from file or defaults
///
/// An explicitly given path must exist; the default locations are optional.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_locations().into_iter().find(|p| p.exists()) {
            Some(path) => path,
            None => return Ok(Config::default()),
        },
    };

    log::debug!("Loading configuration from {}", config_path.display());
    let contents = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
    Ok(config)
}
