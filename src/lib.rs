//! dirsweep - A directory organization and duplicate cleanup utility
//!
//! This library scans the top level of a directory, classifies its files by
//! extension, size tier or modification date, finds duplicate files by size
//! and content fingerprint, and turns either result into an
//! [`OrganizationPlan`] that can be printed or executed.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod file_category;
pub mod file_organizer;
pub mod fingerprint;
pub mod logging;
pub mod output;
pub mod plan;
pub mod scanner;

pub use config::{CompiledFilters, Config, ConfigError};
pub use duplicates::{DuplicateFinder, DuplicateGroup, DuplicateReport};
pub use file_category::{Calendar, Category, ClassifyPolicy, Classifier};
pub use file_organizer::{ExecutionReport, FileOrganizer};
pub use fingerprint::{ContentFingerprint, Fingerprinter, Md5Fingerprinter};
pub use plan::{Action, OrganizationPlan};
pub use scanner::{FileEntry, scan_directory};

pub use cli::{Args, OrganizeMode, run_cli};
