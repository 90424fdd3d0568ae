//! Human-readable text report.
//!
//! Group listing format:
//!
//! ```text
//! Files with hash 2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824:
//! /data/a.txt
//! /data/copy/a.txt
//! ```

use std::io::{self, Write};

use yansi::{Paint, Style};

use crate::actions::{RemovalOutcome, RemovalReport};
use crate::duplicates::{DuplicateGroup, ScanSummary};

const HEADER: Style = Style::new().bold();
const HASH: Style = Style::new().cyan();
const WARNING: Style = Style::new().yellow();
const ERROR: Style = Style::new().red().bold();
const GOOD: Style = Style::new().green();

/// Text report writer.
#[derive(Debug, Clone, Copy)]
pub struct TextReport {
    color: bool,
}

impl TextReport {
    /// Create a text report; `color` enables ANSI styling.
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn styled(&self, text: &str, style: Style) -> String {
        if self.color {
            text.paint(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Write the duplicate groups, or `No duplicate files found.`.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_groups<W: Write>(&self, w: &mut W, groups: &[DuplicateGroup]) -> io::Result<()> {
        if groups.is_empty() {
            return writeln!(w, "No duplicate files found.");
        }

        writeln!(
            w,
            "{}",
            self.styled("Found the following duplicate files:", HEADER)
        )?;
        for group in groups {
            writeln!(w)?;
            writeln!(w, "Files with hash {}:", self.styled(&group.hash_hex(), HASH))?;
            for file in &group.files {
                writeln!(w, "{}", file.path.display())?;
            }
        }
        Ok(())
    }

    /// Write the scan summary block.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_summary<W: Write>(&self, w: &mut W, summary: &ScanSummary) -> io::Result<()> {
        writeln!(w)?;
        writeln!(
            w,
            "Scanned {} files ({}) in {:.2}s",
            summary.total_files,
            summary.total_size_display(),
            summary.scan_duration.as_secs_f64()
        )?;
        if summary.duplicate_groups > 0 {
            writeln!(
                w,
                "{} duplicate groups, {} redundant files, {} reclaimable ({:.1}%)",
                summary.duplicate_groups,
                summary.duplicate_files,
                self.styled(&summary.reclaimable_display(), GOOD),
                summary.wasted_percentage()
            )?;
        }
        if summary.excluded_paths > 0 {
            writeln!(w, "{} paths excluded", summary.excluded_paths)?;
        }
        if summary.has_errors() {
            let skipped = summary.scan_errors.len() + summary.hash_errors.len();
            writeln!(
                w,
                "{}",
                self.styled(&format!("{skipped} paths skipped on error"), WARNING)
            )?;
        }
        if summary.interrupted {
            writeln!(
                w,
                "{}",
                self.styled("Scan interrupted; results are partial.", WARNING)
            )?;
        }
        Ok(())
    }

    /// Write the removal report: failures first, then the summary line.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_removal<W: Write>(&self, w: &mut W, report: &RemovalReport) -> io::Result<()> {
        for entry in &report.entries {
            let line = match &entry.outcome {
                RemovalOutcome::WouldDelete => format!("Would delete: {}", entry.path.display()),
                RemovalOutcome::KeptLinkTarget => self.styled(
                    &format!("Kept (symlink target of original): {}", entry.path.display()),
                    WARNING,
                ),
                RemovalOutcome::SkippedPermissionDenied => self.styled(
                    &format!("Permission denied: {}", entry.path.display()),
                    ERROR,
                ),
                RemovalOutcome::SkippedError(message) => self.styled(
                    &format!("Error removing {}: {message}", entry.path.display()),
                    ERROR,
                ),
                _ => continue,
            };
            writeln!(w, "{line}")?;
        }

        writeln!(w)?;
        let style = if report.has_failures() { WARNING } else { GOOD };
        writeln!(w, "{}", self.styled(&report.summary(), style))?;
        if !report.dry_run && !report.interrupted && !report.has_failures() {
            writeln!(w, "Duplicate files have been removed.")?;
        }
        Ok(())
    }
}
