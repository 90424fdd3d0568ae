//! JSON output formatter for scan and removal results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "hash": "abc123...",
//!       "size": 1024,
//!       "files": ["/path/to/file1.txt", "/path/to/file2.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "scan_duration_ms": 1234,
//!     "interrupted": false,
//!     ...
//!   }
//! }
//! ```

use std::io::Write;

use chrono::Utc;
use serde::Serialize;

use super::OutputError;
use crate::actions::{RemovalEntry, RemovalReport};
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Content digest as hexadecimal string (64 characters)
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// Paths in discovery order; the first one is the original
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.hash_hex(),
            size: group.size,
            files: group
                .files
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Total number of files scanned
    pub total_files: usize,
    /// Total size of all scanned files in bytes
    pub total_size: u64,
    /// Number of files hashed successfully
    pub hashed_files: usize,
    /// Number of files that could not be hashed
    pub failed_files: usize,
    /// Number of paths skipped by exclusion rules
    pub excluded_paths: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Space reclaimable by keeping one copy per group (bytes)
    pub reclaimable_space: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// Messages for directories and files skipped on error
    pub errors: Vec<String>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DS000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a `ScanSummary` and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        let errors = summary
            .scan_errors
            .iter()
            .map(ToString::to_string)
            .chain(summary.hash_errors.iter().map(ToString::to_string))
            .collect();

        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            hashed_files: summary.hashed_files,
            failed_files: summary.failed_files,
            excluded_paths: summary.excluded_paths,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            interrupted: summary.interrupted,
            errors,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output for a scan.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// List of duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create a new JSON output from duplicate groups, summary and exit code.
    ///
    /// # Example
    ///
    /// ```
    /// use dupsweep::duplicates::{DuplicateGroup, ScanSummary};
    /// use dupsweep::error::ExitCode;
    /// use dupsweep::output::JsonOutput;
    /// use dupsweep::scanner::FileEntry;
    /// use std::path::PathBuf;
    ///
    /// let groups = vec![DuplicateGroup::new([0u8; 32], vec![
    ///     FileEntry::new(PathBuf::from("/file1.txt"), 1024, 0),
    ///     FileEntry::new(PathBuf::from("/file2.txt"), 1024, 1),
    /// ])];
    ///
    /// let output = JsonOutput::new(&groups, &ScanSummary::default(), ExitCode::Success);
    /// assert_eq!(output.duplicates.len(), 1);
    /// ```
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            duplicates: groups.iter().map(JsonDuplicateGroup::from).collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), OutputError> {
        write_json(self, writer, pretty)
    }
}

/// JSON output for a removal run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRemovalOutput {
    /// When the report was generated (RFC 3339)
    pub generated_at: String,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Whether the run stopped early
    pub interrupted: bool,
    /// Files kept as originals
    pub kept: usize,
    /// Files deleted
    pub deleted: usize,
    /// Files a dry run would delete
    pub would_delete: usize,
    /// Files already gone
    pub missing: usize,
    /// Files that could not be deleted
    pub failed: usize,
    /// Bytes freed
    pub bytes_freed: u64,
    /// Bytes a dry run would free
    pub bytes_would_free: u64,
    /// Per-file outcomes in processing order
    pub entries: Vec<RemovalEntry>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name
    pub exit_code_name: String,
}

impl JsonRemovalOutput {
    /// Create a JSON removal output stamped with the current time.
    #[must_use]
    pub fn new(report: &RemovalReport, exit_code: ExitCode) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            dry_run: report.dry_run,
            interrupted: report.interrupted,
            kept: report.kept_count(),
            deleted: report.deleted_count(),
            would_delete: report.would_delete_count(),
            missing: report.missing_count(),
            failed: report.failure_count(),
            bytes_freed: report.bytes_freed,
            bytes_would_free: report.bytes_would_free,
            entries: report.entries.clone(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), OutputError> {
        write_json(self, writer, pretty)
    }
}

fn write_json<T: Serialize, W: Write>(
    value: &T,
    writer: &mut W,
    pretty: bool,
) -> Result<(), OutputError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::RemovalOutcome;
    use crate::scanner::{FileEntry, HashError};
    use std::path::PathBuf;
    use std::time::Duration;

    fn create_test_groups() -> Vec<DuplicateGroup> {
        vec![
            DuplicateGroup::new(
                [0u8; 32],
                vec![
                    FileEntry::new(PathBuf::from("/path/to/file1.txt"), 1024, 0),
                    FileEntry::new(PathBuf::from("/path/to/file2.txt"), 1024, 1),
                ],
            ),
            DuplicateGroup::new(
                [1u8; 32],
                vec![
                    FileEntry::new(PathBuf::from("/path/to/fileA.txt"), 2048, 2),
                    FileEntry::new(PathBuf::from("/path/to/fileB.txt"), 2048, 3),
                    FileEntry::new(PathBuf::from("/path/to/fileC.txt"), 2048, 4),
                ],
            ),
        ]
    }

    #[test]
    fn test_json_output_empty() {
        let output = JsonOutput::new(&[], &ScanSummary::default(), ExitCode::NoDuplicates);
        assert!(output.duplicates.is_empty());
        assert_eq!(output.summary.total_files, 0);
        assert_eq!(output.summary.exit_code, 2);
    }

    #[test]
    fn test_json_is_valid() {
        let groups = create_test_groups();
        let summary = ScanSummary {
            total_files: 100,
            scan_duration: Duration::from_millis(1234),
            ..Default::default()
        };
        let json = JsonOutput::new(&groups, &summary, ExitCode::Success)
            .to_json()
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let duplicates = parsed["duplicates"].as_array().unwrap();
        assert_eq!(duplicates.len(), 2);
        assert_eq!(duplicates[1]["files"].as_array().unwrap().len(), 3);
        assert_eq!(duplicates[0]["files"][0], "/path/to/file1.txt");
        assert_eq!(parsed["summary"]["total_files"], 100);
        assert_eq!(parsed["summary"]["scan_duration_ms"], 1234);
    }

    #[test]
    fn test_to_json_compact_and_pretty() {
        let output = JsonOutput::new(&[], &ScanSummary::default(), ExitCode::Success);
        assert!(!output.to_json().unwrap().contains('\n'));
        assert!(output.to_json_pretty().unwrap().contains('\n'));
    }

    #[test]
    fn test_hash_format() {
        let output = JsonOutput::new(
            &create_test_groups(),
            &ScanSummary::default(),
            ExitCode::Success,
        );
        assert_eq!(output.duplicates[0].hash, "00".repeat(32));
    }

    #[test]
    fn test_summary_lists_errors() {
        let summary = ScanSummary {
            failed_files: 1,
            hash_errors: vec![HashError::NotFound(PathBuf::from("/gone"))],
            ..Default::default()
        };
        let output = JsonOutput::new(&[], &summary, ExitCode::PartialSuccess);
        assert_eq!(output.summary.errors.len(), 1);
        assert!(output.summary.errors[0].contains("/gone"));
        assert_eq!(output.summary.exit_code_name, "DS003");
    }

    #[test]
    fn test_write_to() {
        let output = JsonOutput::new(&[], &ScanSummary::default(), ExitCode::Success);
        let mut buffer = Vec::new();
        output.write_to(&mut buffer, false).unwrap();

        let written = String::from_utf8(buffer).unwrap();
        assert!(written.starts_with('{'));
        assert!(written.ends_with("}\n"));
    }

    #[test]
    fn test_removal_output() {
        let report = RemovalReport {
            entries: vec![
                RemovalEntry {
                    group: 0,
                    path: PathBuf::from("/a"),
                    size: 5,
                    outcome: RemovalOutcome::Kept,
                },
                RemovalEntry {
                    group: 0,
                    path: PathBuf::from("/b"),
                    size: 5,
                    outcome: RemovalOutcome::Deleted,
                },
            ],
            bytes_freed: 5,
            ..RemovalReport::default()
        };

        let output = JsonRemovalOutput::new(&report, ExitCode::Success);
        assert_eq!(output.kept, 1);
        assert_eq!(output.deleted, 1);
        assert!(chrono::DateTime::parse_from_rfc3339(&output.generated_at).is_ok());

        let mut buffer = Vec::new();
        output.write_to(&mut buffer, true).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed["entries"][1]["outcome"], "deleted");
        assert_eq!(parsed["bytes_freed"], 5);
    }
}
