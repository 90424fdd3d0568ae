//! Command-line interface definitions for dupsweep.
//!
//! Global options (verbosity, color, logging, config file) come first, then
//! one of the subcommands.
//!
//! ```bash
//! # List duplicates
//! dupsweep scan ~/Downloads
//!
//! # Same, as JSON, also skipping build output
//! dupsweep scan ~/src --exclude target --output json
//!
//! # Remove duplicates, keeping the first copy of each, without prompting
//! dupsweep remove ~/Downloads --yes
//!
//! # See what would be removed
//! dupsweep remove ~/Downloads --dry-run
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::scanner::{ExcludeMode, HashAlgorithm};

/// Find and remove duplicate files by content hash.
#[derive(Debug, Parser)]
#[command(name = "dupsweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Also append log lines to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Whether the selected command writes JSON to stdout.
    #[must_use]
    pub fn wants_json(&self) -> bool {
        match &self.command {
            Commands::Scan(args) => args.output == OutputFormat::Json,
            Commands::Remove(args) => args.output == ReportFormat::Json,
        }
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory and report duplicate files
    Scan(ScanArgs),
    /// Scan a directory and remove duplicate files
    Remove(RemoveArgs),
}

/// Options shared by every command that scans.
#[derive(Debug, Clone, Args)]
pub struct ScanOptions {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Skip paths containing this string (repeatable)
    #[arg(short, long = "exclude", value_name = "STRING")]
    pub exclude: Vec<String>,

    /// Do not apply the configured exclusions (.git, __pycache__, node_modules by default)
    #[arg(long)]
    pub no_default_excludes: bool,

    /// How exclusions match: anywhere in the path, or whole path components
    #[arg(long, value_enum, value_name = "MODE")]
    pub exclude_mode: Option<ExcludeMode>,

    /// Digest algorithm
    #[arg(long, value_enum, value_name = "ALGORITHM")]
    pub algorithm: Option<HashAlgorithm>,

    /// Read chunk size (e.g. 4KiB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub chunk_size: Option<u64>,

    /// Skip files larger than this (e.g. 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Number of hashing threads
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub io_threads: Option<u64>,

    /// Give up on a single file after this many seconds
    #[arg(long, value_name = "SECS")]
    pub hash_timeout: Option<f64>,
}

impl ScanOptions {
    /// Overlay these flags on a loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if self.no_default_excludes {
            config.excluded.clear();
        }
        config.excluded.extend(self.exclude.iter().cloned());
        if let Some(mode) = self.exclude_mode {
            config.exclude_mode = mode;
        }
        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = usize::try_from(chunk_size).unwrap_or(usize::MAX);
        }
        if let Some(max_size) = self.max_size {
            config.max_file_size = Some(max_size);
        }
        if let Some(threads) = self.io_threads {
            config.io_threads = usize::try_from(threads).unwrap_or(usize::MAX);
        }
        if let Some(secs) = self.hash_timeout {
            config.hash_timeout_secs = Some(secs);
        }
    }
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub options: ScanOptions,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the remove subcommand.
#[derive(Debug, Args)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub options: ScanOptions,

    /// Delete every copy, including the first one found
    #[arg(long)]
    pub delete_all: bool,

    /// Report what would be removed without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Move files to the system trash instead of deleting them
    #[arg(long)]
    pub trash: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: ReportFormat,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    Text,
    /// JSON output for scripting
    Json,
    /// CSV output for spreadsheets
    Csv,
}

/// Output format for removal results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable listing
    Text,
    /// JSON output for scripting
    Json,
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupsweep::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
