use clap::Parser;
use dirsweep::cli::{Args, RunError, RunOutcome, run_cli};
use dirsweep::config::ConfigError;
use dirsweep::file_category::MEGABYTE;
use dirsweep::file_organizer::OrganizeError;
use dirsweep::plan::Action;
/// Integration tests for dirsweep
///
/// These tests simulate real-world usage scenarios, running the complete
/// scan, plan and execute pipeline against temporary directories.
///
/// Test categories:
/// 1. Organizing by extension, size and date
/// 2. Duplicate removal
/// 3. Dry-run and JSON plan output
/// 4. Configuration and filtering
/// 5. Edge cases and error scenarios
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary directory to organize, plus a separate directory for the
/// log file and configuration so they never show up in the scan.
struct TestFixture {
    temp_dir: TempDir,
    support_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        TestFixture {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            support_dir: TempDir::new().expect("Failed to create support directory"),
        }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn create_file(&self, name: &str, content: &[u8]) {
        let file_path = self.path().join(name);
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    fn create_text_file(&self, name: &str, content: &str) {
        self.create_file(name, content.as_bytes());
    }

    /// Create a sparse file of the given length.
    fn create_sized_file(&self, name: &str, len: u64) {
        let file = File::create(self.path().join(name)).expect("Failed to create file");
        file.set_len(len).expect("Failed to set file length");
    }

    /// Create a file whose modification time is local noon on the given day.
    fn create_file_modified_on(&self, name: &str, year: i32, month: u32, day: u32) {
        use chrono::{Local, TimeZone};

        self.create_text_file(name, name);
        let noon = Local
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .expect("unambiguous local noon");
        let file = File::options()
            .write(true)
            .open(self.path().join(name))
            .expect("Failed to open file");
        file.set_modified(SystemTime::from(noon))
            .expect("Failed to set modification time");
    }

    fn create_subdir(&self, name: &str) {
        fs::create_dir(self.path().join(name)).expect("Failed to create subdirectory");
    }

    /// Write a configuration file outside the organized directory.
    fn write_config(&self, content: &str) -> PathBuf {
        let path = self.support_dir.path().join("config.toml");
        fs::write(&path, content).expect("Failed to write config");
        path
    }

    /// Arguments for a run whose log file lives in the support directory.
    fn args(&self, flags: &[&str]) -> Args {
        self.args_with_log(&self.support_dir.path().join("dirsweep.log"), flags)
    }

    /// Arguments for a run logging to `log_file`.
    fn args_with_log(&self, log_file: &Path, flags: &[&str]) -> Args {
        let path = self.path().to_string_lossy().into_owned();
        let log_file = log_file.to_string_lossy().into_owned();
        let mut argv = vec!["dirsweep", "--path", &path, "--log-file", &log_file];
        argv.extend_from_slice(flags);
        Args::try_parse_from(argv).expect("valid arguments")
    }

    fn run(&self, flags: &[&str]) -> RunOutcome {
        run_cli(&self.args(flags)).expect("run should succeed")
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_dir(), "Directory should exist: {}", path.display());
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    /// Count files in the directory (non-recursive).
    fn count_files(&self) -> usize {
        self.top_level(|metadata| metadata.is_file())
    }

    /// Count directories in the directory (non-recursive).
    fn count_dirs(&self) -> usize {
        self.top_level(|metadata| metadata.is_dir())
    }

    fn top_level(&self, keep: impl Fn(&fs::Metadata) -> bool) -> usize {
        fs::read_dir(self.path())
            .expect("Failed to read directory")
            .filter_map(|entry| entry.ok()?.metadata().ok())
            .filter(|metadata| keep(metadata))
            .count()
    }

    /// Sorted names of the top-level directories.
    fn dir_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path())
            .expect("Failed to read directory")
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

// ============================================================================
// 1. Organizing
// ============================================================================

#[test]
fn test_organize_by_extension() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.JPG", "jpeg");
    fixture.create_text_file("notes.txt", "notes");
    fixture.create_text_file("archive", "no extension");

    let outcome = fixture.run(&["--extension"]);
    let report = outcome.report.expect("executed run has a report");

    assert!(report.is_complete_success());
    assert_eq!(report.moved.len(), 3);
    fixture.assert_file_exists("jpg_files/photo.JPG");
    fixture.assert_file_exists("txt_files/notes.txt");
    fixture.assert_file_exists("noext_files/archive");
    assert_eq!(fixture.count_files(), 0);
    assert_eq!(
        fixture.dir_names(),
        vec!["jpg_files", "noext_files", "txt_files"]
    );
}

#[test]
fn test_organize_by_extension_short_flag() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.md", "a");
    fixture.create_text_file("b.md", "b");

    fixture.run(&["-e"]);

    fixture.assert_file_exists("md_files/a.md");
    fixture.assert_file_exists("md_files/b.md");
    assert_eq!(fixture.count_dirs(), 1);
}

#[test]
fn test_file_contents_survive_move() {
    let fixture = TestFixture::new();
    fixture.create_text_file("letter.doc", "Dear reader");

    fixture.run(&["--extension"]);

    assert_eq!(fixture.read("doc_files/letter.doc"), "Dear reader");
}

#[test]
fn test_organize_by_size() {
    let fixture = TestFixture::new();
    fixture.create_text_file("small.txt", "tiny");
    fixture.create_sized_file("just_under.bin", 10 * MEGABYTE - 1);
    fixture.create_sized_file("medium.bin", 10 * MEGABYTE);
    fixture.create_sized_file("heavy.bin", 100 * MEGABYTE);

    let outcome = fixture.run(&["--size"]);

    assert!(outcome.report.expect("report").is_complete_success());
    fixture.assert_file_exists("light_files/small.txt");
    fixture.assert_file_exists("light_files/just_under.bin");
    fixture.assert_file_exists("medium_files/medium.bin");
    fixture.assert_file_exists("heavy_files/heavy.bin");
}

#[test]
fn test_size_mode_creates_only_used_tiers() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    fixture.create_text_file("b.txt", "b");

    fixture.run(&["-s"]);

    assert_eq!(fixture.dir_names(), vec!["light_files"]);
}

#[test]
fn test_organize_by_date() {
    let fixture = TestFixture::new();
    fixture.create_file_modified_on("march.pdf", 2024, 3, 15);
    fixture.create_file_modified_on("also_march.txt", 2024, 3, 15);
    fixture.create_file_modified_on("new_year.pdf", 2023, 1, 1);

    fixture.run(&["--last-modify-date"]);

    fixture.assert_file_exists("2024-03-15/march.pdf");
    fixture.assert_file_exists("2024-03-15/also_march.txt");
    fixture.assert_file_exists("2023-01-01/new_year.pdf");
    assert_eq!(fixture.dir_names(), vec!["2023-01-01", "2024-03-15"]);
}

#[test]
fn test_organize_by_persian_date() {
    let fixture = TestFixture::new();
    fixture.create_file_modified_on("nowruz.txt", 2024, 3, 20);
    fixture.create_file_modified_on("last_day.txt", 2024, 3, 19);

    fixture.run(&["-l", "--calendar", "persian"]);

    fixture.assert_file_exists("1403-01-01/nowruz.txt");
    fixture.assert_file_exists("1402-12-29/last_day.txt");
}

#[test]
fn test_persian_calendar_from_config() {
    let fixture = TestFixture::new();
    fixture.create_file_modified_on("nowruz.txt", 2024, 3, 20);
    let config = fixture.write_config("[organize]\ncalendar = \"persian\"\n");
    let config = config.to_string_lossy().into_owned();

    fixture.run(&["-l", "--config", &config]);

    fixture.assert_file_exists("1403-01-01/nowruz.txt");
}

#[test]
fn test_subdirectories_are_left_alone() {
    let fixture = TestFixture::new();
    fixture.create_subdir("projects");
    fs::write(fixture.path().join("projects").join("inner.txt"), "inner").unwrap();
    fixture.create_text_file("outer.txt", "outer");

    fixture.run(&["--extension"]);

    fixture.assert_file_exists("projects/inner.txt");
    fixture.assert_file_exists("txt_files/outer.txt");
    fixture.assert_file_not_exists("txt_files/inner.txt");
}

// ============================================================================
// 2. Duplicate removal
// ============================================================================

#[test]
fn test_erase_duplicates_keeps_smallest_path() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "hello");
    fixture.create_text_file("b.txt", "hello");
    fixture.create_text_file("c.txt", "world");

    let outcome = fixture.run(&["--erase-duplicates"]);
    let report = outcome.report.expect("report");

    assert!(report.is_complete_success());
    assert_eq!(report.deleted.len(), 1);
    fixture.assert_file_exists("a.txt");
    fixture.assert_file_not_exists("b.txt");
    fixture.assert_file_exists("c.txt");
    assert_eq!(fixture.count_dirs(), 0);
}

#[test]
fn test_erase_duplicates_across_extensions() {
    let fixture = TestFixture::new();
    fixture.create_file("z_copy.dat", &[7u8; 4096]);
    fixture.create_file("m_original.bin", &[7u8; 4096]);
    fixture.create_file("a_other.bin", &[8u8; 4096]);

    fixture.run(&["-d"]);

    fixture.assert_file_exists("m_original.bin");
    fixture.assert_file_not_exists("z_copy.dat");
    fixture.assert_file_exists("a_other.bin");
}

#[test]
fn test_erase_duplicates_empty_files_collapse() {
    let fixture = TestFixture::new();
    fixture.create_file("empty1", b"");
    fixture.create_file("empty2", b"");
    fixture.create_file("empty3", b"");

    fixture.run(&["--erase_duplicates"]);

    fixture.assert_file_exists("empty1");
    fixture.assert_file_not_exists("empty2");
    fixture.assert_file_not_exists("empty3");
}

#[test]
fn test_erase_duplicates_same_size_different_content() {
    let fixture = TestFixture::new();
    fixture.create_text_file("one.txt", "aaaa");
    fixture.create_text_file("two.txt", "bbbb");

    let outcome = fixture.run(&["-d"]);

    assert!(outcome.plan.is_empty());
    assert_eq!(fixture.count_files(), 2);
}

#[test]
fn test_erase_duplicates_is_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "same");
    fixture.create_text_file("b.txt", "same");

    fixture.run(&["-d"]);
    let second = fixture.run(&["-d"]);

    assert!(second.plan.is_empty());
    fixture.assert_file_exists("a.txt");
}

// ============================================================================
// 3. Dry run and JSON output
// ============================================================================

#[test]
fn test_dry_run_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.jpg", "jpeg");
    fixture.create_text_file("notes.txt", "notes");

    let outcome = fixture.run(&["--extension", "--dry-run"]);

    assert!(outcome.report.is_none());
    assert_eq!(outcome.plan.len(), 2);
    assert_eq!(outcome.plan.folders_to_create, vec!["jpg_files", "txt_files"]);
    assert_eq!(fixture.count_files(), 2);
    assert_eq!(fixture.count_dirs(), 0);
}

#[test]
fn test_dry_run_duplicates_keeps_files() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "hello");
    fixture.create_text_file("b.txt", "hello");

    let outcome = fixture.run(&["-d", "--dry-run"]);

    assert_eq!(outcome.plan.len(), 1);
    match &outcome.plan.actions[0].action {
        Action::Delete { keep, .. } => {
            assert_eq!(keep.file_name().and_then(|n| n.to_str()), Some("a.txt"))
        }
        other => panic!("expected a delete action, got {:?}", other),
    }
    fixture.assert_file_exists("b.txt");
}

#[test]
fn test_json_implies_dry_run() {
    let fixture = TestFixture::new();
    fixture.create_text_file("notes.txt", "notes");

    let outcome = fixture.run(&["-e", "--json"]);

    assert!(outcome.report.is_none());
    fixture.assert_file_exists("notes.txt");
    assert_eq!(fixture.count_dirs(), 0);

    let json = serde_json::to_value(&outcome.plan).unwrap();
    assert_eq!(json["folders_to_create"][0], "txt_files");
    assert_eq!(json["actions"][0]["action"], "move_to");
}

// ============================================================================
// 4. Configuration and filtering
// ============================================================================

#[test]
fn test_hidden_files_are_skipped_by_default() {
    let fixture = TestFixture::new();
    fixture.create_text_file(".hidden.txt", "secret");
    fixture.create_text_file("visible.txt", "public");

    fixture.run(&["--extension"]);

    fixture.assert_file_exists(".hidden.txt");
    fixture.assert_file_exists("txt_files/visible.txt");
}

#[test]
fn test_exclude_patterns_from_config() {
    let fixture = TestFixture::new();
    fixture.create_text_file("download.part", "partial");
    fixture.create_text_file("keep.txt", "keep");
    let config = fixture.write_config("[filters.exclude]\npatterns = [\"*.part\"]\n");
    let config = config.to_string_lossy().into_owned();

    fixture.run(&["-e", "--config", &config]);

    fixture.assert_file_exists("download.part");
    fixture.assert_file_exists("txt_files/keep.txt");
}

#[test]
fn test_log_file_inside_target_is_not_organized() {
    let fixture = TestFixture::new();
    fixture.create_text_file("dirsweep.log", "log lines");
    fixture.create_text_file("notes.txt", "notes");
    let log_file = fixture.path().join("dirsweep.log");

    let outcome = run_cli(&fixture.args_with_log(&log_file, &["-e"])).expect("run should succeed");

    assert_eq!(outcome.plan.len(), 1);
    fixture.assert_file_exists("dirsweep.log");
    fixture.assert_file_exists("txt_files/notes.txt");
}

#[test]
fn test_invalid_config_aborts_before_changes() {
    let fixture = TestFixture::new();
    fixture.create_text_file("notes.txt", "notes");
    let config = fixture.write_config("[organize]\nhash_chunk_size = 0\n");
    let config = config.to_string_lossy().into_owned();

    let result = run_cli(&fixture.args(&["-e", "--config", &config]));

    assert!(matches!(
        result,
        Err(RunError::Config(ConfigError::InvalidChunkSize))
    ));
    fixture.assert_file_exists("notes.txt");
}

// ============================================================================
// 5. Edge cases and error scenarios
// ============================================================================

#[test]
fn test_empty_directory() {
    let fixture = TestFixture::new();

    let outcome = fixture.run(&["--extension"]);

    assert!(outcome.plan.is_empty());
    assert!(outcome.report.expect("report").is_complete_success());
    assert_eq!(fixture.count_dirs(), 0);
}

#[test]
fn test_no_mode_is_an_error() {
    let fixture = TestFixture::new();
    fixture.create_text_file("notes.txt", "notes");

    let result = run_cli(&fixture.args(&[]));

    assert!(matches!(
        result,
        Err(RunError::Config(ConfigError::NoModeSelected))
    ));
    fixture.assert_file_exists("notes.txt");
}

#[test]
fn test_conflicting_modes_are_an_error() {
    let fixture = TestFixture::new();
    fixture.create_text_file("notes.txt", "notes");

    let result = run_cli(&fixture.args(&["--extension", "--size"]));

    match result {
        Err(RunError::Config(ConfigError::ConflictingModes(flags))) => {
            assert_eq!(flags, vec!["--extension", "--size"]);
        }
        other => panic!("expected conflicting modes, got {:?}", other.map(|o| o.plan)),
    }
    fixture.assert_file_exists("notes.txt");
    assert_eq!(fixture.count_dirs(), 0);
}

#[test]
fn test_missing_target_is_an_error() {
    let fixture = TestFixture::new();
    let missing = fixture.path().join("does_not_exist");
    let missing_arg = missing.to_string_lossy().into_owned();

    let args = Args::try_parse_from(["dirsweep", "-e", "--path", &missing_arg]).unwrap();
    let result = run_cli(&args);

    assert!(matches!(
        result,
        Err(RunError::Config(ConfigError::TargetNotFound(path))) if path == missing
    ));
}

#[test]
fn test_target_that_is_a_file_is_an_error() {
    let fixture = TestFixture::new();
    fixture.create_text_file("plain.txt", "x");
    let file_arg = fixture.path().join("plain.txt").to_string_lossy().into_owned();

    let args = Args::try_parse_from(["dirsweep", "-e", "--path", &file_arg]).unwrap();

    assert!(matches!(
        run_cli(&args),
        Err(RunError::Config(ConfigError::NotADirectory(_)))
    ));
}

#[test]
fn test_existing_destination_is_never_overwritten() {
    let fixture = TestFixture::new();
    fixture.create_subdir("txt_files");
    fs::write(fixture.path().join("txt_files").join("notes.txt"), "older").unwrap();
    fixture.create_text_file("notes.txt", "newer");
    fixture.create_text_file("other.txt", "other");

    let outcome = fixture.run(&["--extension"]);
    let report = outcome.report.expect("report");

    assert_eq!(report.moved.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0],
        OrganizeError::DestinationExists { .. }
    ));
    assert_eq!(fixture.read("txt_files/notes.txt"), "older");
    assert_eq!(fixture.read("notes.txt"), "newer");
    fixture.assert_file_exists("txt_files/other.txt");
}

#[test]
fn test_rerun_after_organizing_is_a_no_op() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    fixture.create_text_file("b.rs", "b");

    fixture.run(&["--extension"]);
    let second = fixture.run(&["--extension"]);

    assert!(second.plan.is_empty());
    fixture.assert_dir_exists("txt_files");
    fixture.assert_dir_exists("rs_files");
}
