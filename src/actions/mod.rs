//! File actions module.
//!
//! This module provides functionality for:
//! - Removing duplicates with a keep-first or delete-all policy
//! - Permanent deletion or moving to the platform trash
//! - Dry runs that only report what would happen
//!
//! ```no_run
//! use dupsweep::actions::{remove_duplicates, RemovalConfig, RemovalMode};
//!
//! let config = RemovalConfig::default().with_mode(RemovalMode::Trash);
//! let report = remove_duplicates(&[], &config);
//! assert!(report.entries.is_empty());
//! ```

pub mod remove;

pub use remove::{
    delete_to_trash, permanent_delete, remove_duplicates, RemovalConfig, RemovalEntry,
    RemovalError, RemovalMode, RemovalOutcome, RemovalReport,
};
