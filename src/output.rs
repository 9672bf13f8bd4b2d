//! Output formatting and styling module.
//!
//! Provides a centralized interface for all console output: colored status
//! lines, progress bars, the plan listing shown in dry runs, and the summary
//! table printed at the end of a run.

use crate::file_organizer::ExecutionReport;
use crate::plan::{Action, OrganizationPlan};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

const PROGRESS_TEMPLATE: &str = "{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success, error, warning and info lines
/// - Progress bars for hashing and organizing
/// - The dry-run plan listing
/// - Summary tables with per-folder counts
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsweep::output::OutputFormatter;
    /// OutputFormatter::success("Organization completed!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, on stderr.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsweep::output::OutputFormatter;
    /// OutputFormatter::error("Error: The path /data/inbox does not exist");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsweep::output::OutputFormatter;
    /// OutputFormatter::warning("No files found to organize.");
    /// ```
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsweep::output::OutputFormatter;
    /// OutputFormatter::info("Organizing contents of: /home/user/Downloads");
    /// ```
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    ///
    /// # Arguments
    ///
    /// * `header` - The header text
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for file operations.
    ///
    /// # Arguments
    ///
    /// * `total` - Total number of files the bar will count
    /// * `message` - Short label shown after the counter
    ///
    /// # Returns
    ///
    /// A configured `ProgressBar` ready for use.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsweep::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100, "hashing");
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64, message: &'static str) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_TEMPLATE)
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb.set_message(message);
        pb
    }

    /// Prints each planned action, one line per file, followed by the
    /// entries that were skipped while planning.
    ///
    /// # Arguments
    ///
    /// * `plan` - The plan to list
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsweep::file_category::{Calendar, ClassifyPolicy, Classifier};
    /// use dirsweep::output::OutputFormatter;
    /// use dirsweep::plan::build_move_plan;
    /// use dirsweep::scanner::FileEntry;
    /// use std::time::SystemTime;
    ///
    /// let entries = vec![FileEntry::new("/data/inbox/notes.txt", 12, SystemTime::now())];
    /// let classifier = Classifier::new(ClassifyPolicy::ByExtension, Calendar::Gregorian);
    /// OutputFormatter::plan_listing(&build_move_plan(&entries, &classifier));
    /// ```
    pub fn plan_listing(plan: &OrganizationPlan) {
        for planned in &plan.actions {
            let name = planned.entry.file_name();
            match &planned.action {
                Action::MoveTo { category } => {
                    println!(" - {} {} {}/", name, "→".cyan(), category.dir_name());
                }
                Action::Delete { keep, fingerprint } => {
                    println!(
                        " - {} {} (duplicate of {}, {})",
                        name,
                        "delete".red(),
                        keep.file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| keep.display().to_string()),
                        fingerprint
                    );
                }
            }
        }
        for skipped in &plan.skipped {
            println!(
                " - {} {} ({})",
                skipped.path.display(),
                "skipped".yellow(),
                skipped.reason
            );
        }
    }

    /// Prints a summary table with file counts by folder.
    ///
    /// # Arguments
    ///
    /// * `category_counts` - Map of folder or category name to file count
    /// * `total_files` - Total number of files processed
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsweep::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("txt_files".to_string(), 15);
    /// counts.insert("jpg_files".to_string(), 8);
    /// OutputFormatter::summary_table(&counts, 23);
    /// ```
    pub fn summary_table(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = width
        );
    }

    /// Prints what an execution did, followed by any failures.
    ///
    /// # Arguments
    ///
    /// * `report` - The report returned by the executor
    pub fn execution_summary(report: &ExecutionReport) {
        let mut counts = BTreeMap::new();
        for operation in &report.moved {
            *counts.entry(operation.category.clone()).or_insert(0) += 1;
        }
        if !report.deleted.is_empty() {
            counts.insert("duplicates removed".to_string(), report.deleted.len());
        }
        Self::summary_table(&counts, report.processed());

        if !report.pruned_folders.is_empty() {
            println!("Removed {} empty folder(s)", report.pruned_folders.len());
        }
        if !report.failures.is_empty() {
            Self::header("FAILURES");
            for failure in &report.failures {
                Self::error(&failure.to_string());
            }
        }
    }

    /// Prints a dry-run notice message.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display after the `[DRY RUN]` prefix
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
