/// Duplicate detection by size bucketing and content fingerprints.
///
/// Files are first grouped by byte size, which costs nothing beyond the scan.
/// Only buckets holding two or more files are fingerprinted; within such a
/// bucket, files with equal fingerprints form a duplicate group. The file
/// with the smallest path in each group is kept and the others are marked as
/// removable, so the outcome never depends on scan order.
use crate::fingerprint::{ContentFingerprint, Fingerprinter, ReadFailure};
use crate::scanner::FileEntry;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Entries grouped by identical byte size.
///
/// Every entry of the input appears in exactly one bucket.
#[derive(Debug, Default)]
pub struct SizeBuckets<'a> {
    buckets: BTreeMap<u64, Vec<&'a FileEntry>>,
}

impl<'a> SizeBuckets<'a> {
    /// Single pass over `entries`; bucket contents keep input order.
    pub fn from_entries(entries: &'a [FileEntry]) -> Self {
        let mut buckets: BTreeMap<u64, Vec<&'a FileEntry>> = BTreeMap::new();
        for entry in entries {
            buckets.entry(entry.size).or_default().push(entry);
        }
        Self { buckets }
    }

    /// Number of distinct sizes.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, size: u64) -> Option<&[&'a FileEntry]> {
        self.buckets.get(&size).map(Vec::as_slice)
    }

    /// All buckets in ascending size order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[&'a FileEntry])> + '_ {
        self.buckets
            .iter()
            .map(|(size, entries)| (*size, entries.as_slice()))
    }

    /// Buckets that can contain duplicates (two or more entries).
    pub fn candidates(&self) -> impl Iterator<Item = (u64, &[&'a FileEntry])> + '_ {
        self.iter().filter(|(_, entries)| entries.len() > 1)
    }

    /// Total number of entries that will need fingerprinting.
    pub fn candidate_file_count(&self) -> usize {
        self.candidates().map(|(_, entries)| entries.len()).sum()
    }
}

/// Files sharing one fingerprint.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub fingerprint: ContentFingerprint,
    pub size: u64,
    /// The retained copy: smallest path in the group.
    pub keep: FileEntry,
    /// Every other member, sorted by path.
    pub duplicates: Vec<FileEntry>,
}

/// Outcome of a duplicate search.
#[derive(Debug, Default)]
pub struct DuplicateReport {
    /// Groups with at least one removable file, sorted by the kept path.
    pub groups: Vec<DuplicateGroup>,
    /// Files that could not be fingerprinted. They are never deleted.
    pub unreadable: Vec<ReadFailure>,
    /// Number of files whose content was hashed.
    pub hashed_files: usize,
}

impl DuplicateReport {
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(|group| group.duplicates.len()).sum()
    }

    pub fn reclaimable_bytes(&self) -> u64 {
        self.groups
            .iter()
            .map(|group| group.size * group.duplicates.len() as u64)
            .sum()
    }
}

/// Partitions one size bucket by content.
///
/// Returns the duplicate groups found in the bucket and the entries that
/// could not be read. `on_hashed` is called after each fingerprint attempt.
pub fn resolve_bucket<F>(
    bucket: &[&FileEntry],
    fingerprinter: &F,
    on_hashed: &mut dyn FnMut(&FileEntry),
) -> (Vec<DuplicateGroup>, Vec<ReadFailure>)
where
    F: Fingerprinter + ?Sized,
{
    let mut by_fingerprint: BTreeMap<ContentFingerprint, Vec<&FileEntry>> = BTreeMap::new();
    let mut failures = Vec::new();

    for &entry in bucket {
        match fingerprinter.fingerprint(&entry.path) {
            Ok(fingerprint) => {
                debug!("{} -> {}", entry.path.display(), fingerprint);
                by_fingerprint.entry(fingerprint).or_default().push(entry);
            }
            Err(failure) => {
                warn!("{}", failure);
                failures.push(failure);
            }
        }
        on_hashed(entry);
    }

    let groups = by_fingerprint
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(fingerprint, mut members)| {
            members.sort_by(|a, b| a.path.cmp(&b.path));
            let keep = members[0].clone();
            let duplicates = members[1..].iter().map(|entry| (*entry).clone()).collect();
            DuplicateGroup {
                fingerprint,
                size: keep.size,
                keep,
                duplicates,
            }
        })
        .collect();

    (groups, failures)
}

/// Finds duplicate content across a scanned file set.
pub struct DuplicateFinder<F> {
    fingerprinter: F,
}

impl<F: Fingerprinter> DuplicateFinder<F> {
    pub fn new(fingerprinter: F) -> Self {
        Self { fingerprinter }
    }

    /// Number of files [`find_with_progress`](Self::find_with_progress) will
    /// report through its callback: those sharing their size with another entry.
    pub fn files_to_hash(&self, entries: &[FileEntry]) -> usize {
        SizeBuckets::from_entries(entries).candidate_file_count()
    }

    pub fn find(&self, entries: &[FileEntry]) -> DuplicateReport {
        self.find_with_progress(entries, |_| {})
    }

    /// Like [`find`](Self::find), calling `on_hashed` once per fingerprinted file.
    ///
    /// Bucket membership is settled for the whole set before any file is read.
    pub fn find_with_progress<P>(&self, entries: &[FileEntry], mut on_hashed: P) -> DuplicateReport
    where
        P: FnMut(&FileEntry),
    {
        let buckets = SizeBuckets::from_entries(entries);
        debug!(
            "{} files in {} size buckets, {} need hashing",
            entries.len(),
            buckets.len(),
            buckets.candidate_file_count()
        );

        let mut report = DuplicateReport::default();
        for (_, bucket) in buckets.candidates() {
            let (groups, failures) = resolve_bucket(bucket, &self.fingerprinter, &mut on_hashed);
            report.hashed_files += bucket.len() - failures.len();
            report.groups.extend(groups);
            report.unreadable.extend(failures);
        }

        report.groups.sort_by(|a, b| a.keep.path.cmp(&b.keep.path));
        report.unreadable.sort_by(|a, b| a.path.cmp(&b.path));
        report
    }
}
