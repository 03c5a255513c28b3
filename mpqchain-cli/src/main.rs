//! mpqchain - command-line tool for reading MPQ archives and archive chains

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;

mod commands;
mod config;
mod output;

use config::Config;

// Global context for commands to access
static GLOBAL_OPTS: OnceLock<GlobalOptions> = OnceLock::new();

#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub output: OutputFormat,
    pub verbose: u8,
    pub quiet: bool,
    pub no_color: bool,
    pub config: Config,
}

/// Options of the running command
pub fn opts() -> &'static GlobalOptions {
    GLOBAL_OPTS.get_or_init(GlobalOptions::default)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableType {
    Hash,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HashType {
    TableOffset,
    NameA,
    NameB,
    FileKey,
}

#[derive(Parser)]
#[command(
    name = "mpqchain",
    about = "Command-line tool for reading MPQ archives and archive chains",
    long_about = None,
    after_help = "EXAMPLES:
    # List files in an archive
    mpqchain list common.MPQ

    # Extract all files
    mpqchain extract common.MPQ -t extracted/

    # Extract specific files
    mpqchain extract common.MPQ -f DBFilesClient\\\\Map.dbc -f DBFilesClient\\\\Spell.dbc

    # Find which archive of a client serves a file
    mpqchain chain Data/ DBFilesClient\\\\Map.dbc

    # Generate shell completions
    mpqchain completion bash > ~/.bash_completion.d/mpqchain.bash
    mpqchain completion zsh > ~/.zsh/completions/_mpqchain"
)]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(global = true, short = 'o', long, value_enum)]
    output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(global = true, short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(global = true, short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,

    /// Disable colored output
    #[arg(global = true, long)]
    no_color: bool,

    /// Configuration file (defaults to ~/.mpqchain/config.toml)
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List files in an archive
    List {
        /// Path to the MPQ archive
        archive: String,
    },
    /// Extract files from an archive
    Extract {
        /// Path to the MPQ archive
        archive: String,
        /// Target directory
        #[arg(short, long, default_value = ".")]
        target: String,
        /// File to extract, repeatable (extracts all listed files if omitted)
        #[arg(short, long = "file")]
        files: Vec<String>,
    },
    /// Show header fields and table sizes
    Info {
        /// Path to the MPQ archive
        archive: String,
    },
    /// Dump the decrypted hash or block table
    Tables {
        /// Path to the MPQ archive
        archive: String,
        /// Table to display
        #[arg(short = 't', long, value_enum, default_value = "hash")]
        table_type: TableType,
        /// Limit number of entries shown
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Generate hash values for a filename
    Hash {
        /// Filename to hash
        filename: String,
        /// Hash type (all types if omitted)
        #[arg(short = 't', long, value_enum)]
        hash_type: Option<HashType>,
    },
    /// Check whether a file exists in an archive
    Exists {
        /// Path to the MPQ archive
        archive: String,
        /// File to look up
        file: String,
    },
    /// Resolve a file through every archive in a directory
    Chain {
        /// Directory holding the MPQ archives
        dir: PathBuf,
        /// File to resolve
        file: String,
        /// Write the resolved file to this path
        #[arg(long)]
        extract: Option<PathBuf>,
        /// Leave out archives that fail to open instead of aborting
        #[arg(long)]
        skip_broken: bool,
    },
    /// Generate shell completion scripts
    #[command(about = "Generate completion scripts for your shell")]
    Completion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = config::load_config(cli.config.as_deref())?;
    let output = match cli.output {
        Some(output) => output,
        None => config.output_format()?,
    };

    // Set up colored output based on flags
    if cli.no_color || output != OutputFormat::Text {
        colored::control::set_override(false);
    }

    // Store global options for commands to access
    let global_opts = GlobalOptions {
        output,
        verbose: cli.verbose,
        quiet: cli.quiet,
        no_color: cli.no_color,
        config,
    };
    if GLOBAL_OPTS.set(global_opts).is_err() {
        anyhow::bail!("global options initialized twice");
    }

    match cli.command {
        Commands::List { archive } => commands::list::list(&archive)?,
        Commands::Extract {
            archive,
            target,
            files,
        } => commands::extract::extract(&archive, &target, &files)?,
        Commands::Info { archive } => commands::info::info(&archive)?,
        Commands::Tables {
            archive,
            table_type,
            limit,
        } => commands::tables::show(&archive, table_type, limit)?,
        Commands::Hash {
            filename,
            hash_type,
        } => commands::hash::generate(&filename, hash_type)?,
        Commands::Exists { archive, file } => {
            if !commands::exists::exists(&archive, &file)? {
                std::process::exit(1);
            }
        }
        Commands::Chain {
            dir,
            file,
            extract,
            skip_broken,
        } => commands::chain::resolve(&dir, &file, extract.as_deref(), skip_broken)?,
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
