/// File classification for folder-based organization.
///
/// This module maps a scanned file to a [`Category`] under one of three
/// policies: by extension, by size tier, or by modification date. A category
/// is derived from the file's own attributes only, so the same file always
/// lands in the same folder for a given policy and calendar.
///
/// # Examples
///
/// ```
/// use dirsweep::file_category::{Calendar, ClassifyPolicy, Classifier};
/// use dirsweep::scanner::FileEntry;
/// use std::time::SystemTime;
///
/// let classifier = Classifier::new(ClassifyPolicy::ByExtension, Calendar::Gregorian);
/// let entry = FileEntry::new("photo.JPG", 1024, SystemTime::now());
/// let category = classifier.classify(&entry);
/// assert_eq!(category.key(), "jpg");
/// assert_eq!(category.dir_name(), "jpg_files");
/// ```
use crate::scanner::FileEntry;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category key for files without an extension.
pub const NO_EXTENSION_KEY: &str = "noext";

/// Category key for modification times outside the representable date range.
pub const UNDATED_KEY: &str = "undated";

/// Suffix appended to extension and size keys to form folder names.
const FOLDER_SUFFIX: &str = "_files";

/// One megabyte as used for size tiers (binary, 1 048 576 bytes).
pub const MEGABYTE: u64 = 1024 * 1024;

/// Smallest size classified as [`SizeTier::Medium`].
pub const MEDIUM_THRESHOLD: u64 = 10 * MEGABYTE;

/// Smallest size classified as [`SizeTier::Heavy`].
pub const HEAVY_THRESHOLD: u64 = 100 * MEGABYTE;

/// A destination category: the key it was derived from and its folder name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Category {
    key: String,
    folder: String,
}

impl Category {
    /// A category whose folder is `<key>_files`.
    fn suffixed(key: impl Into<String>) -> Self {
        let key = key.into();
        let folder = format!("{}{}", key, FOLDER_SUFFIX);
        Self { key, folder }
    }

    /// A category whose folder name is the key itself.
    fn bare(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            folder: key.clone(),
            key,
        }
    }

    /// The key this category was derived from, e.g. `jpg`, `light` or `2024-03-15`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsweep::file_category::SizeTier;
    ///
    /// assert_eq!(SizeTier::Light.category().dir_name(), "light_files");
    /// assert_eq!(SizeTier::Heavy.category().dir_name(), "heavy_files");
    /// ```
    pub fn dir_name(&self) -> &str {
        &self.folder
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Size tiers used by [`ClassifyPolicy::BySize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeTier {
    /// Under 10 MB.
    Light,
    /// From 10 MB up to, but not including, 100 MB.
    Medium,
    /// 100 MB and above.
    Heavy,
}

impl SizeTier {
    /// Classifies a byte count. Lower bounds are inclusive.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsweep::file_category::{SizeTier, MEGABYTE};
    ///
    /// assert_eq!(SizeTier::from_bytes(10 * MEGABYTE - 1), SizeTier::Light);
    /// assert_eq!(SizeTier::from_bytes(10 * MEGABYTE), SizeTier::Medium);
    /// assert_eq!(SizeTier::from_bytes(100 * MEGABYTE), SizeTier::Heavy);
    /// ```
    pub fn from_bytes(size: u64) -> Self {
        if size >= HEAVY_THRESHOLD {
            SizeTier::Heavy
        } else if size >= MEDIUM_THRESHOLD {
            SizeTier::Medium
        } else {
            SizeTier::Light
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SizeTier::Light => "light",
            SizeTier::Medium => "medium",
            SizeTier::Heavy => "heavy",
        }
    }

    pub fn category(&self) -> Category {
        Category::suffixed(self.key())
    }
}

/// How files are grouped into folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifyPolicy {
    /// Lowercased file extension; `noext` when there is none.
    ByExtension,
    /// `light`, `medium` or `heavy` by byte size.
    BySize,
    /// Local calendar date of the last modification.
    ByDate,
}

/// Calendar used to name date folders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Calendar {
    #[default]
    Gregorian,
    /// Solar Hijri (Jalali) calendar.
    Persian,
}

impl Calendar {
    pub fn formatter(self) -> Box<dyn DateFormatter> {
        match self {
            Calendar::Gregorian => Box::new(GregorianFormatter),
            Calendar::Persian => Box::new(PersianFormatter),
        }
    }
}

/// Renders a local calendar date as a fixed-width, sortable `YYYY-MM-DD` key.
pub trait DateFormatter: Send + Sync {
    fn format(&self, date: NaiveDate) -> String;

    /// Human-readable calendar name for log messages.
    fn name(&self) -> &'static str;
}

/// Formats dates in the proleptic Gregorian calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct GregorianFormatter;

impl DateFormatter for GregorianFormatter {
    fn format(&self, date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    fn name(&self) -> &'static str {
        "Gregorian"
    }
}

/// Formats dates in the Solar Hijri (Jalali) calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersianFormatter;

impl DateFormatter for PersianFormatter {
    fn format(&self, date: NaiveDate) -> String {
        let (year, month, day) =
            gregorian_to_jalali(i64::from(date.year()), i64::from(date.month()), i64::from(date.day()));
        format!("{:04}-{:02}-{:02}", year, month, day)
    }

    fn name(&self) -> &'static str {
        "Persian"
    }
}

/// Arithmetic Gregorian to Jalali conversion (33-year cycle approximation).
fn gregorian_to_jalali(gy: i64, gm: i64, gd: i64) -> (i64, i64, i64) {
    const DAYS_BEFORE_MONTH: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

    let gy2 = if gm > 2 { gy + 1 } else { gy };
    let mut days = 355_666 + 365 * gy + (gy2 + 3) / 4 - (gy2 + 99) / 100 + (gy2 + 399) / 400
        + gd
        + DAYS_BEFORE_MONTH[(gm - 1) as usize];

    let mut jy = -1595 + 33 * (days / 12_053);
    days %= 12_053;
    jy += 4 * (days / 1461);
    days %= 1461;
    if days > 365 {
        jy += (days - 1) / 365;
        days = (days - 1) % 365;
    }

    let (jm, jd) = if days < 186 {
        (1 + days / 31, 1 + days % 31)
    } else {
        (7 + (days - 186) / 30, 1 + (days - 186) % 30)
    };
    (jy, jm, jd)
}

/// Maps file entries to categories under a fixed policy and calendar.
///
/// The calendar is chosen once when the classifier is built and used for
/// every file it classifies.
pub struct Classifier {
    policy: ClassifyPolicy,
    date_formatter: Box<dyn DateFormatter>,
}

impl Classifier {
    pub fn new(policy: ClassifyPolicy, calendar: Calendar) -> Self {
        Self::with_formatter(policy, calendar.formatter())
    }

    pub fn with_formatter(policy: ClassifyPolicy, date_formatter: Box<dyn DateFormatter>) -> Self {
        Self {
            policy,
            date_formatter,
        }
    }

    pub fn policy(&self) -> ClassifyPolicy {
        self.policy
    }

    pub fn calendar_name(&self) -> &'static str {
        self.date_formatter.name()
    }

    /// Determines the category for a file.
    ///
    /// Never fails: files without an extension get the `noext` category,
    /// every size maps to a tier, and a timestamp chrono cannot represent
    /// gets the `undated` category.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsweep::file_category::{Calendar, ClassifyPolicy, Classifier, MEGABYTE};
    /// use dirsweep::scanner::FileEntry;
    /// use std::time::SystemTime;
    ///
    /// let by_size = Classifier::new(ClassifyPolicy::BySize, Calendar::Gregorian);
    /// let entry = FileEntry::new("movie.mkv", 250 * MEGABYTE, SystemTime::now());
    /// assert_eq!(by_size.classify(&entry).key(), "heavy");
    ///
    /// let by_ext = Classifier::new(ClassifyPolicy::ByExtension, Calendar::Gregorian);
    /// let entry = FileEntry::new("Makefile", 10, SystemTime::now());
    /// assert_eq!(by_ext.classify(&entry).key(), "noext");
    /// ```
    pub fn classify(&self, entry: &FileEntry) -> Category {
        match self.policy {
            ClassifyPolicy::ByExtension => extension_category(entry),
            ClassifyPolicy::BySize => SizeTier::from_bytes(entry.size).category(),
            ClassifyPolicy::ByDate => match entry.modified_local() {
                Some(local) => Category::bare(self.date_formatter.format(local.date_naive())),
                None => Category::bare(UNDATED_KEY),
            },
        }
    }
}

fn extension_category(entry: &FileEntry) -> Category {
    match entry.path.extension() {
        Some(ext) if !ext.is_empty() => Category::suffixed(ext.to_string_lossy().to_lowercase()),
        _ => Category::suffixed(NO_EXTENSION_KEY),
    }
}
