//! Command-line interface module for dirsweep.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing and mode validation
//! - Scanning the target directory
//! - Building the organization or dedup plan
//! - Dry-run and JSON plan output
//! - Executing the plan and reporting the outcome

use crate::config::{Config, ConfigError, LOCAL_CONFIG_FILE};
use crate::duplicates::DuplicateFinder;
use crate::file_category::{Calendar, ClassifyPolicy, Classifier};
use crate::file_organizer::{ExecutionReport, FileOrganizer};
use crate::fingerprint::Md5Fingerprinter;
use crate::logging::DEFAULT_LOG_FILE;
use crate::output::OutputFormatter;
use crate::plan::{OrganizationPlan, build_dedup_plan, build_move_plan};
use crate::scanner::{FileEntry, ScanError, scan_directory};
use clap::Parser;
use indicatif::ProgressBar;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Organize the files of a directory by extension, size or date, or remove duplicates.
///
/// Exactly one of --extension, --size, --last-modify-date or --erase-duplicates
/// must be given.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "dirsweep", version)]
pub struct Args {
    /// Organize files by their extension
    #[arg(short = 'e', long)]
    pub extension: bool,

    /// Organize files by their size (light, medium, heavy)
    #[arg(short = 's', long)]
    pub size: bool,

    /// Organize files by last modification date
    #[arg(short = 'l', long = "last-modify-date", alias = "last_modify_date")]
    pub last_modify_date: bool,

    /// Remove duplicate files, keeping one copy of each
    #[arg(short = 'd', long = "erase-duplicates", alias = "erase_duplicates")]
    pub erase_duplicates: bool,

    /// Path to the directory to organize
    #[arg(short = 'p', long, default_value = ".")]
    pub path: PathBuf,

    /// Show what would happen without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the plan as JSON instead of executing it
    #[arg(long)]
    pub json: bool,

    /// Calendar used for date folders (overrides the configuration file)
    #[arg(long, value_enum)]
    pub calendar: Option<Calendar>,

    /// Configuration file to use instead of the default lookup
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Where to write the operation log
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Also show informational log lines on the console
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// What a run does with the scanned files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeMode {
    Classify(ClassifyPolicy),
    EraseDuplicates,
}

impl OrganizeMode {
    pub fn label(&self) -> &'static str {
        match self {
            OrganizeMode::Classify(ClassifyPolicy::ByExtension) => "extension",
            OrganizeMode::Classify(ClassifyPolicy::BySize) => "size",
            OrganizeMode::Classify(ClassifyPolicy::ByDate) => "last_modify_date",
            OrganizeMode::EraseDuplicates => "erase_duplicates",
        }
    }
}

impl Args {
    /// The single mode selected on the command line.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoModeSelected`] or [`ConfigError::ConflictingModes`]
    /// unless exactly one mode flag is set.
    pub fn mode(&self) -> Result<OrganizeMode, ConfigError> {
        let flags = [
            (self.extension, "--extension", OrganizeMode::Classify(ClassifyPolicy::ByExtension)),
            (self.size, "--size", OrganizeMode::Classify(ClassifyPolicy::BySize)),
            (
                self.last_modify_date,
                "--last-modify-date",
                OrganizeMode::Classify(ClassifyPolicy::ByDate),
            ),
            (self.erase_duplicates, "--erase-duplicates", OrganizeMode::EraseDuplicates),
        ];
        let selected: Vec<_> = flags.iter().filter(|(set, _, _)| *set).collect();

        match selected.as_slice() {
            [] => Err(ConfigError::NoModeSelected),
            [(_, _, mode)] => Ok(*mode),
            many => Err(ConfigError::ConflictingModes(
                many.iter().map(|(_, name, _)| *name).collect(),
            )),
        }
    }

    /// Plans are only printed, never executed.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run || self.json
    }
}

/// Fatal errors that end a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Failed to render plan as JSON: {0}")]
    PlanOutput(#[from] serde_json::Error),
}

/// Everything a finished run computed.
#[derive(Debug)]
pub struct RunOutcome {
    pub mode: OrganizeMode,
    pub target: PathBuf,
    pub plan: OrganizationPlan,
    /// `None` for dry runs.
    pub report: Option<ExecutionReport>,
}

#[derive(Serialize)]
struct PlanDocument<'a> {
    target: &'a Path,
    mode: &'static str,
    #[serde(flatten)]
    plan: &'a OrganizationPlan,
}

/// Checks that `path` is an existing directory and returns its canonical form.
pub fn resolve_target(path: &Path) -> Result<PathBuf, ConfigError> {
    let target = fs::canonicalize(path).map_err(|_| ConfigError::TargetNotFound(path.to_path_buf()))?;
    if !target.is_dir() {
        return Err(ConfigError::NotADirectory(target));
    }
    Ok(target)
}

/// Runs the CLI application with the given arguments.
///
/// Configuration problems and an unreadable target directory are returned as
/// errors before any file is touched. Failures on individual files are part
/// of the returned [`ExecutionReport`] instead.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirsweep::cli::{Args, run_cli};
///
/// let args = Args::parse_from(["dirsweep", "--extension", "--path", "/data/inbox"]);
/// match run_cli(&args) {
///     Ok(outcome) => println!("{} planned actions", outcome.plan.len()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(args: &Args) -> Result<RunOutcome, RunError> {
    let mode = args.mode()?;
    let target = resolve_target(&args.path)?;

    let config = Config::load(args.config.as_deref())?;
    let filters = config.filters.compile()?;
    let calendar = args.calendar.unwrap_or(config.organize.calendar);

    let entries = scan_directory(&target, &filters, &own_files(args))?;
    if entries.is_empty() {
        warn!("No files found to organize in {}", target.display());
        if !args.json {
            OutputFormatter::warning("No files found to organize.");
        }
    } else {
        info!("Found {} files to organize in {}", entries.len(), target.display());
    }

    let plan = match mode {
        OrganizeMode::Classify(policy) => {
            let classifier = Classifier::new(policy, calendar);
            if policy == ClassifyPolicy::ByDate {
                info!("Using {} calendar for date folders", classifier.calendar_name());
            }
            build_move_plan(&entries, &classifier)
        }
        OrganizeMode::EraseDuplicates => {
            find_duplicates_plan(&entries, config.organize.hash_chunk_size, !args.json)
        }
    };

    if args.json {
        let document = PlanDocument {
            target: &target,
            mode: mode.label(),
            plan: &plan,
        };
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(RunOutcome {
            mode,
            target,
            plan,
            report: None,
        });
    }

    if args.dry_run {
        print_dry_run(&target, &plan);
        return Ok(RunOutcome {
            mode,
            target,
            plan,
            report: None,
        });
    }

    OutputFormatter::info(&format!("Organizing contents of: {}", target.display()));
    let progress = OutputFormatter::create_progress_bar(plan.len() as u64, "organizing");
    let report = FileOrganizer::new(&target).execute_with_progress(&plan, |_| progress.inc(1));
    progress.finish_and_clear();

    OutputFormatter::execution_summary(&report);
    if report.is_complete_success() {
        OutputFormatter::success("Organization completed!");
    } else {
        OutputFormatter::warning(&format!(
            "Organization completed with {} error(s). See the log for details.",
            report.failures.len()
        ));
    }
    info!(
        "Organization completed: {} moved, {} deleted, {} failed",
        report.moved.len(),
        report.deleted.len(),
        report.failures.len()
    );

    Ok(RunOutcome {
        mode,
        target,
        plan,
        report: Some(report),
    })
}

/// Files the tool itself uses, which must never be organized away.
fn own_files(args: &Args) -> Vec<PathBuf> {
    let mut candidates = vec![args.log_file.clone(), PathBuf::from(LOCAL_CONFIG_FILE)];
    candidates.extend(args.config.clone());
    candidates
        .iter()
        .filter_map(|path| fs::canonicalize(path).ok())
        .collect()
}

fn find_duplicates_plan(entries: &[FileEntry], chunk_size: usize, show_progress: bool) -> OrganizationPlan {
    let finder = DuplicateFinder::new(Md5Fingerprinter::with_chunk_size(chunk_size));
    let progress = if show_progress {
        let total = finder.files_to_hash(entries);
        OutputFormatter::create_progress_bar(total as u64, "hashing")
    } else {
        ProgressBar::hidden()
    };

    let report = finder.find_with_progress(entries, |_| progress.inc(1));
    progress.finish_and_clear();

    info!(
        "Hashed {} files, found {} duplicates ({} bytes reclaimable)",
        report.hashed_files,
        report.duplicate_count(),
        report.reclaimable_bytes()
    );
    for failure in &report.unreadable {
        OutputFormatter::warning(&failure.to_string());
    }
    build_dedup_plan(&report)
}

fn print_dry_run(target: &Path, plan: &OrganizationPlan) {
    OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", target.display()));
    if plan.is_empty() {
        OutputFormatter::dry_run_notice("Nothing to do.");
        return;
    }
    if !plan.folders_to_create.is_empty() {
        OutputFormatter::dry_run_notice(&format!(
            "Folders: {}",
            plan.folders_to_create.join(", ")
        ));
    }
    OutputFormatter::plan_listing(plan);
    OutputFormatter::summary_table(&plan.category_counts(), plan.len());
    OutputFormatter::dry_run_notice("No files were modified.");
}
