/// Plan execution against the filesystem.
///
/// [`FileOrganizer`] walks an [`OrganizationPlan`] one entry at a time:
/// it creates the planned folders, moves or deletes each file, and finally
/// removes planned folders that ended up empty. A failure on one file is
/// logged and recorded in the [`ExecutionReport`]; it never stops the rest of
/// the plan. Another process may be changing the directory at the same time,
/// so a vanished source or an already existing destination is expected and
/// reported like any other per-file failure.
use crate::file_category::Category;
use crate::plan::{Action, OrganizationPlan, PlannedAction, destination_for};
use crate::scanner::FileEntry;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

/// A file that was moved into its category folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// The original path of the file before organization.
    pub original_path: PathBuf,
    /// The new path of the file after organization.
    pub new_path: PathBuf,
    /// The folder the file was moved to.
    pub category: String,
}

/// Errors on individual files or folders. None of them aborts a run.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Failed to create a category directory.
    #[error("Failed to create folder {}: {source}", path.display())]
    FolderCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A file with the same name already sits in the destination folder.
    #[error("Cannot move {}: {} already exists", from.display(), to.display())]
    DestinationExists { from: PathBuf, to: PathBuf },
    /// The file disappeared after the scan.
    #[error("Cannot process {}: file no longer exists", path.display())]
    SourceMissing { path: PathBuf },
    /// Failed to move a file to its category directory.
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The copy a duplicate was supposed to be kept in is gone, so the
    /// duplicate is left in place.
    #[error("Keeping {}: the retained copy {} no longer exists", path.display(), keep.display())]
    SurvivorMissing { path: PathBuf, keep: PathBuf },
    /// Failed to delete a duplicate.
    #[error("Failed to remove duplicate {}: {source}", path.display())]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to remove an empty category directory.
    #[error("Failed to remove folder {}: {source}", path.display())]
    FolderRemovalFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OrganizeError {
    /// The file or folder the error is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::FolderCreationFailed { path, .. }
            | Self::SourceMissing { path }
            | Self::SurvivorMissing { path, .. }
            | Self::DeleteFailed { path, .. }
            | Self::FolderRemovalFailed { path, .. } => path,
            Self::DestinationExists { from, .. } | Self::MoveFailed { from, .. } => from,
        }
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// What a plan execution actually did.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Folders that did not exist and were created.
    pub created_folders: Vec<PathBuf>,
    pub moved: Vec<Operation>,
    pub deleted: Vec<PathBuf>,
    /// Planned folders removed again because nothing was moved into them.
    pub pruned_folders: Vec<PathBuf>,
    pub failures: Vec<OrganizeError>,
}

impl ExecutionReport {
    /// Returns true if every planned operation succeeded.
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn processed(&self) -> usize {
        self.moved.len() + self.deleted.len()
    }

    fn fail(&mut self, err: OrganizeError) {
        error!("{}", err);
        self.failures.push(err);
    }
}

/// Applies organization plans inside one base directory.
pub struct FileOrganizer {
    base_path: PathBuf,
}

impl FileOrganizer {
    /// Creates an organizer for one directory.
    ///
    /// # Arguments
    ///
    /// * `base_path` - The directory whose files the plans refer to; category
    ///   folders are created directly inside it
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsweep::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let organizer = FileOrganizer::new("/data/inbox");
    /// assert_eq!(organizer.base_path(), Path::new("/data/inbox"));
    /// ```
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Executes `plan` in order.
    ///
    /// Planned folders are created first. Each action is then applied: files
    /// are moved without overwriting, and duplicates are deleted only while
    /// their retained copy still exists. Finally, planned folders that
    /// received nothing are removed if empty.
    ///
    /// # Arguments
    ///
    /// * `plan` - The plan to apply; its paths must lie inside the base path
    ///
    /// # Returns
    ///
    /// An [`ExecutionReport`] listing created folders, moves, deletions and
    /// pruned folders, plus one [`OrganizeError`] per failed entry. Failures
    /// never stop the remaining actions.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsweep::file_category::{Calendar, ClassifyPolicy, Classifier};
    /// use dirsweep::file_organizer::FileOrganizer;
    /// use dirsweep::plan::build_move_plan;
    /// use dirsweep::scanner::FileEntry;
    /// use std::path::Path;
    ///
    /// let entry = FileEntry::from_path(Path::new("/data/inbox/report.pdf")).unwrap();
    /// let classifier = Classifier::new(ClassifyPolicy::ByExtension, Calendar::Gregorian);
    /// let plan = build_move_plan(&[entry], &classifier);
    ///
    /// let report = FileOrganizer::new("/data/inbox").execute(&plan);
    /// for failure in &report.failures {
    ///     eprintln!("{}", failure);
    /// }
    /// ```
    pub fn execute(&self, plan: &OrganizationPlan) -> ExecutionReport {
        self.execute_with_progress(plan, |_| {})
    }

    /// Like [`execute`](Self::execute), calling `on_entry` after each planned file.
    ///
    /// # Arguments
    ///
    /// * `plan` - The plan to apply
    /// * `on_entry` - Called once per action, whether it succeeded or failed
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsweep::file_organizer::FileOrganizer;
    /// use dirsweep::output::OutputFormatter;
    /// use dirsweep::plan::OrganizationPlan;
    ///
    /// let plan = OrganizationPlan::default();
    /// let pb = OutputFormatter::create_progress_bar(plan.len() as u64, "organizing");
    /// let report = FileOrganizer::new("/data/inbox").execute_with_progress(&plan, |_| pb.inc(1));
    /// pb.finish_and_clear();
    /// assert!(report.is_complete_success());
    /// ```
    pub fn execute_with_progress<P>(&self, plan: &OrganizationPlan, mut on_entry: P) -> ExecutionReport
    where
        P: FnMut(&PlannedAction),
    {
        let mut report = ExecutionReport::default();

        for folder in &plan.folders_to_create {
            let folder_path = self.base_path.join(folder);
            match self.create_folder(&folder_path) {
                Ok(true) => {
                    info!("Created folder: {}", folder_path.display());
                    report.created_folders.push(folder_path);
                }
                Ok(false) => {}
                Err(e) => report.fail(e),
            }
        }

        for planned in &plan.actions {
            match &planned.action {
                Action::MoveTo { category } => match self.move_entry(&planned.entry, category) {
                    Ok(operation) => {
                        info!(
                            "Moved file: {} → {}/",
                            planned.entry.file_name(),
                            operation.category
                        );
                        report.moved.push(operation);
                    }
                    Err(e) => report.fail(e),
                },
                Action::Delete { keep, .. } => match Self::delete_entry(&planned.entry, keep) {
                    Ok(()) => {
                        info!(
                            "Removed duplicate: {} (same content as {})",
                            planned.entry.file_name(),
                            keep.display()
                        );
                        report.deleted.push(planned.entry.path.clone());
                    }
                    Err(e) => report.fail(e),
                },
            }
            on_entry(planned);
        }

        let moved_sources: HashSet<PathBuf> = report
            .moved
            .iter()
            .map(|op| op.original_path.clone())
            .collect();
        for folder in plan.folders_left_empty(&moved_sources) {
            let folder_path = self.base_path.join(folder);
            match Self::remove_if_empty(&folder_path) {
                Ok(true) => {
                    info!("Removed empty folder: {}", folder_path.display());
                    report.pruned_folders.push(folder_path);
                }
                Ok(false) => {}
                Err(e) => report.fail(e),
            }
        }

        report
    }

    /// Creates `path` if absent. Returns whether it was created.
    fn create_folder(&self, path: &Path) -> OrganizeResult<bool> {
        if path.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(path).map_err(|source| OrganizeError::FolderCreationFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(true)
    }

    /// Moves one file into its category folder without overwriting anything.
    ///
    /// # Returns
    ///
    /// The recorded [`Operation`], or [`OrganizeError::SourceMissing`],
    /// [`OrganizeError::DestinationExists`] or [`OrganizeError::MoveFailed`].
    fn move_entry(&self, entry: &FileEntry, category: &Category) -> OrganizeResult<Operation> {
        let folder = category.dir_name();
        let destination = destination_for(&self.base_path, entry, category).ok_or_else(|| {
            OrganizeError::MoveFailed {
                from: entry.path.clone(),
                to: self.base_path.join(folder),
                source: io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
            }
        })?;

        if !entry.path.exists() {
            return Err(OrganizeError::SourceMissing {
                path: entry.path.clone(),
            });
        }
        if destination.exists() {
            return Err(OrganizeError::DestinationExists {
                from: entry.path.clone(),
                to: destination,
            });
        }

        fs::rename(&entry.path, &destination).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound if !entry.path.exists() => OrganizeError::SourceMissing {
                path: entry.path.clone(),
            },
            _ => OrganizeError::MoveFailed {
                from: entry.path.clone(),
                to: destination.clone(),
                source,
            },
        })?;

        Ok(Operation {
            original_path: entry.path.clone(),
            new_path: destination,
            category: folder.to_string(),
        })
    }

    /// Removes a duplicate, but only while the copy it duplicates still exists.
    fn delete_entry(entry: &FileEntry, keep: &Path) -> OrganizeResult<()> {
        if !entry.path.exists() {
            return Err(OrganizeError::SourceMissing {
                path: entry.path.clone(),
            });
        }
        if !keep.is_file() {
            return Err(OrganizeError::SurvivorMissing {
                path: entry.path.clone(),
                keep: keep.to_path_buf(),
            });
        }
        fs::remove_file(&entry.path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => OrganizeError::SourceMissing {
                path: entry.path.clone(),
            },
            _ => OrganizeError::DeleteFailed {
                path: entry.path.clone(),
                source,
            },
        })
    }

    /// Removes `path` only if it is an empty directory. Returns whether it was removed.
    fn remove_if_empty(path: &Path) -> OrganizeResult<bool> {
        let to_error = |source| OrganizeError::FolderRemovalFailed {
            path: path.to_path_buf(),
            source,
        };
        if !path.is_dir() {
            return Ok(false);
        }
        let mut contents = fs::read_dir(path).map_err(to_error)?;
        if contents.next().is_some() {
            warn!("Keeping non-empty folder {}", path.display());
            return Ok(false);
        }
        fs::remove_dir(path).map_err(to_error)?;
        Ok(true)
    }
}
