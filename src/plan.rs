/// Organization plans.
///
/// A plan is the complete list of filesystem changes a run intends to make,
/// computed from the scanned entries before anything is touched. Executing
/// it is the job of [`FileOrganizer`](crate::file_organizer::FileOrganizer);
/// building it is pure and needs no filesystem access.
use crate::duplicates::DuplicateReport;
use crate::file_category::{Category, Classifier};
use crate::fingerprint::ContentFingerprint;
use crate::scanner::FileEntry;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// What to do with one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Move the file into the category's folder, keeping its name.
    MoveTo { category: Category },
    /// Delete the file; `keep` holds identical content.
    Delete {
        keep: PathBuf,
        fingerprint: ContentFingerprint,
    },
}

/// A file paired with its planned action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAction {
    pub entry: FileEntry,
    #[serde(flatten)]
    pub action: Action,
}

/// A file left out of the plan, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// The ordered set of actions for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizationPlan {
    pub actions: Vec<PlannedAction>,
    /// Folder names to create before moving, sorted and distinct.
    pub folders_to_create: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
}

impl OrganizationPlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn moves(&self) -> impl Iterator<Item = (&FileEntry, &Category)> {
        self.actions.iter().filter_map(|planned| match &planned.action {
            Action::MoveTo { category } => Some((&planned.entry, category)),
            Action::Delete { .. } => None,
        })
    }

    pub fn deletions(&self) -> impl Iterator<Item = &FileEntry> {
        self.actions.iter().filter_map(|planned| match planned.action {
            Action::Delete { .. } => Some(&planned.entry),
            Action::MoveTo { .. } => None,
        })
    }

    /// Number of planned files per folder (moves) or under `"duplicates"` (deletes).
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for planned in &self.actions {
            let label = match &planned.action {
                Action::MoveTo { category } => category.dir_name().to_string(),
                Action::Delete { .. } => "duplicates".to_string(),
            };
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    /// Planned folders that would hold none of the planned files once the
    /// moves of `moved_sources` have happened.
    ///
    /// Computed from the plan alone. Whether a folder is really empty (it may
    /// have existed with content before the run) is for the executor to check.
    pub fn folders_left_empty(&self, moved_sources: &HashSet<PathBuf>) -> Vec<String> {
        let filled: HashSet<&str> = self
            .moves()
            .filter(|(entry, _)| moved_sources.contains(&entry.path))
            .map(|(_, category)| category.dir_name())
            .collect();

        self.folders_to_create
            .iter()
            .filter(|folder| !filled.contains(folder.as_str()))
            .cloned()
            .collect()
    }
}

/// Builds a move plan: one [`Action::MoveTo`] per entry, in input order.
pub fn build_move_plan(entries: &[FileEntry], classifier: &Classifier) -> OrganizationPlan {
    let mut folders = BTreeSet::new();
    let actions = entries
        .iter()
        .map(|entry| {
            let category = classifier.classify(entry);
            folders.insert(category.dir_name().to_string());
            PlannedAction {
                entry: entry.clone(),
                action: Action::MoveTo { category },
            }
        })
        .collect();

    OrganizationPlan {
        actions,
        folders_to_create: folders.into_iter().collect(),
        skipped: Vec::new(),
    }
}

/// Builds a dedup plan: one [`Action::Delete`] per removable duplicate,
/// sorted by path. Unreadable files become skipped entries.
pub fn build_dedup_plan(report: &DuplicateReport) -> OrganizationPlan {
    let mut actions: Vec<PlannedAction> = report
        .groups
        .iter()
        .flat_map(|group| {
            group.duplicates.iter().map(|duplicate| PlannedAction {
                entry: duplicate.clone(),
                action: Action::Delete {
                    keep: group.keep.path.clone(),
                    fingerprint: group.fingerprint,
                },
            })
        })
        .collect();
    actions.sort_by(|a, b| a.entry.path.cmp(&b.entry.path));

    let skipped = report
        .unreadable
        .iter()
        .map(|failure| SkippedEntry {
            path: failure.path.clone(),
            reason: failure.source.to_string(),
        })
        .collect();

    OrganizationPlan {
        actions,
        folders_to_create: Vec::new(),
        skipped,
    }
}

/// Destination path of `entry` inside `category`'s folder under `base_path`.
pub fn destination_for(base_path: &Path, entry: &FileEntry, category: &Category) -> Option<PathBuf> {
    entry
        .path
        .file_name()
        .map(|name| base_path.join(category.dir_name()).join(name))
}
