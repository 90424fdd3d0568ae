//! dupsweep - content-addressed duplicate file finder and remover.
//!
//! Files under a root directory are hashed (SHA-256 by default, BLAKE3
//! optionally) and grouped by digest. Groups can be reported as text, JSON
//! or CSV, or removed with a keep-first or delete-all policy.
//!
//! The library is usable on its own:
//!
//! ```no_run
//! use dupsweep::actions::{remove_duplicates, RemovalConfig};
//! use dupsweep::duplicates::find_duplicates;
//! use std::path::Path;
//!
//! let excluded = vec![".git".to_string()];
//! let (groups, _summary) = find_duplicates(Path::new("."), &excluded).unwrap();
//! let report = remove_duplicates(&groups, &RemovalConfig::default().with_dry_run(true));
//! println!("{}", report.summary());
//! ```

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod prompt;
pub mod scanner;
pub mod signal;

use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::actions::{remove_duplicates, RemovalConfig, RemovalMode, RemovalReport};
use crate::cli::{Cli, Commands, OutputFormat, RemoveArgs, ReportFormat, ScanArgs, ScanOptions};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, DuplicateGroup, FinderConfig, ScanSummary};
use crate::error::ExitCode;
use crate::output::{CsvOutput, JsonOutput, JsonRemovalOutput, TextReport};
use crate::progress::{Progress, ProgressCallback};
use crate::signal::ShutdownHandler;

/// Terminal streams a command talks to.
pub struct Console<'a> {
    /// Where confirmation answers are read from
    pub input: &'a mut dyn BufRead,
    /// Where reports are written
    pub output: &'a mut dyn Write,
    /// Whether text reports use ANSI colors
    pub color: bool,
}

/// Run the application against the real stdin and stdout.
///
/// # Errors
///
/// Returns an error for fatal conditions: unreadable config, unusable
/// log file, missing or non-directory scan root, or failed output.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let color = !cli.no_color && io::stdout().is_terminal();
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut input = stdin.lock();
    let mut output = stdout.lock();

    run_with_console(
        cli,
        &mut Console {
            input: &mut input,
            output: &mut output,
            color,
        },
    )
}

/// Run the application with explicit streams.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_with_console(cli: Cli, console: &mut Console<'_>) -> Result<ExitCode> {
    let Cli {
        verbose,
        quiet,
        no_color,
        log_file,
        config: config_path,
        command,
    } = cli;

    let mut config =
        Config::load(config_path.as_deref()).context("Failed to load configuration")?;

    let log_file = log_file.or_else(|| config.log_file.clone());
    logging::init_logging(verbose, quiet, log_file.as_deref()).with_context(|| {
        format!(
            "Failed to open log file {}",
            log_file.as_deref().map_or_else(String::new, |p| p.display().to_string())
        )
    })?;

    if no_color {
        console.color = false;
    }

    let handler = signal::install_handler().context("Failed to install Ctrl+C handler")?;

    match command {
        Commands::Scan(args) => {
            args.options.apply_to(&mut config);
            config.validate().context("Invalid scan options")?;
            run_scan(&args, &config, quiet, &handler, console)
        }
        Commands::Remove(args) => {
            args.options.apply_to(&mut config);
            config.validate().context("Invalid scan options")?;
            run_remove(&args, &config, quiet, &handler, console)
        }
    }
}

fn progress_for(quiet: bool) -> Arc<dyn ProgressCallback> {
    Arc::new(Progress::new(quiet))
}

fn scan(
    options: &ScanOptions,
    config: &Config,
    progress: Arc<dyn ProgressCallback>,
    handler: &ShutdownHandler,
) -> Result<(Vec<DuplicateGroup>, ScanSummary)> {
    let finder_config = FinderConfig::default()
        .with_io_threads(config.io_threads)
        .with_walker_config(config.walker_config())
        .with_hasher_config(config.hasher_config())
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);

    DuplicateFinder::new(finder_config)
        .find_duplicates(&options.path)
        .with_context(|| format!("Failed to scan {}", options.path.display()))
}

fn scan_exit_code(groups: &[DuplicateGroup], summary: &ScanSummary) -> ExitCode {
    if summary.interrupted {
        ExitCode::Interrupted
    } else if groups.is_empty() {
        ExitCode::NoDuplicates
    } else if summary.has_errors() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    }
}

fn run_scan(
    args: &ScanArgs,
    config: &Config,
    quiet: bool,
    handler: &ShutdownHandler,
    console: &mut Console<'_>,
) -> Result<ExitCode> {
    let machine_output = args.output != OutputFormat::Text;
    let progress = progress_for(quiet || machine_output);
    let (groups, summary) = scan(&args.options, config, progress, handler)?;
    let exit_code = scan_exit_code(&groups, &summary);

    let out = &mut console.output;
    match args.output {
        OutputFormat::Text => {
            let report = TextReport::new(console.color);
            report.write_groups(out, &groups)?;
            if !quiet {
                report.write_summary(out, &summary)?;
            }
        }
        OutputFormat::Json => {
            JsonOutput::new(&groups, &summary, exit_code)
                .write_to(out, true)
                .context("Failed to write JSON output")?;
        }
        OutputFormat::Csv => {
            CsvOutput::new(&groups)
                .write_to(out)
                .context("Failed to write CSV output")?;
        }
    }

    Ok(exit_code)
}

fn removal_exit_code(report: &RemovalReport) -> ExitCode {
    if report.interrupted {
        ExitCode::Interrupted
    } else if report.has_failures() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    }
}

fn run_remove(
    args: &RemoveArgs,
    config: &Config,
    quiet: bool,
    handler: &ShutdownHandler,
    console: &mut Console<'_>,
) -> Result<ExitCode> {
    let json = args.output == ReportFormat::Json;
    if json && !(args.yes || args.dry_run) {
        bail!("--output json cannot prompt for confirmation; pass --yes or --dry-run");
    }

    let progress = progress_for(quiet || json);
    let (groups, summary) = scan(&args.options, config, progress.clone(), handler)?;
    let text = TextReport::new(console.color);

    if !json {
        text.write_groups(&mut console.output, &groups)?;
        if !quiet {
            text.write_summary(&mut console.output, &summary)?;
        }
    }

    if summary.interrupted {
        log::warn!("Scan interrupted; nothing was removed");
        if json {
            JsonRemovalOutput::new(
                &RemovalReport {
                    interrupted: true,
                    dry_run: args.dry_run,
                    ..RemovalReport::default()
                },
                ExitCode::Interrupted,
            )
            .write_to(&mut console.output, true)?;
        }
        return Ok(ExitCode::Interrupted);
    }

    if groups.is_empty() {
        if json {
            let report = RemovalReport {
                dry_run: args.dry_run,
                ..RemovalReport::default()
            };
            JsonRemovalOutput::new(&report, ExitCode::NoDuplicates)
                .write_to(&mut console.output, true)?;
        }
        return Ok(ExitCode::NoDuplicates);
    }

    if !(args.yes || args.dry_run) {
        writeln!(console.output)?;
        let confirmed = prompt::confirm(
            prompt::REMOVE_PROMPT,
            &mut console.input,
            &mut console.output,
        )
        .context("Failed to read confirmation")?;
        if !confirmed {
            writeln!(console.output, "Removal cancelled.")?;
            return Ok(ExitCode::Success);
        }
    }

    let removal_config = RemovalConfig::default()
        .with_keep_first(!args.delete_all)
        .with_dry_run(args.dry_run)
        .with_mode(if args.trash {
            RemovalMode::Trash
        } else {
            RemovalMode::Permanent
        })
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);

    let report = remove_duplicates(&groups, &removal_config);
    let exit_code = removal_exit_code(&report);

    if json {
        JsonRemovalOutput::new(&report, exit_code)
            .write_to(&mut console.output, true)
            .context("Failed to write JSON output")?;
    } else {
        text.write_removal(&mut console.output, &report)?;
    }

    Ok(exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{FileEntry, HashError};
    use std::path::PathBuf;

    fn group() -> DuplicateGroup {
        DuplicateGroup::new(
            [0; 32],
            vec![
                FileEntry::new(PathBuf::from("/a"), 1, 0),
                FileEntry::new(PathBuf::from("/b"), 1, 1),
            ],
        )
    }

    #[test]
    fn test_scan_exit_code_priorities() {
        let clean = ScanSummary::default();
        assert_eq!(scan_exit_code(&[group()], &clean), ExitCode::Success);
        assert_eq!(scan_exit_code(&[], &clean), ExitCode::NoDuplicates);

        let failed = ScanSummary {
            hash_errors: vec![HashError::NotFound(PathBuf::from("/x"))],
            ..Default::default()
        };
        assert_eq!(scan_exit_code(&[group()], &failed), ExitCode::PartialSuccess);

        let interrupted = ScanSummary {
            interrupted: true,
            ..Default::default()
        };
        assert_eq!(scan_exit_code(&[group()], &interrupted), ExitCode::Interrupted);
    }

    #[test]
    fn test_removal_exit_code() {
        assert_eq!(removal_exit_code(&RemovalReport::default()), ExitCode::Success);
        let interrupted = RemovalReport {
            interrupted: true,
            ..RemovalReport::default()
        };
        assert_eq!(removal_exit_code(&interrupted), ExitCode::Interrupted);
    }
}
