/// Integration tests for movie-year
///
/// These tests run complete rename batches against a temporary library,
/// with TMDb replaced by an in-memory metadata source.
///
/// Test categories:
/// 1. Basic rename workflows
/// 2. Dry-run mode verification
/// 3. Collisions and skips
/// 4. Collection folders
/// 5. Undo and round trips
/// 6. Configuration and the interactive menu
use movie_year::cli::{Command, RenameOptions, rename_movies, run_cli, undo_last_batch};
use movie_year::config::{ApiKey, Config};
use movie_year::menu::{Prompter, run_menu};
use movie_year::metadata::{Metadata, MetadataSource, Resolution};
use movie_year::undo::UndoOutcome;
use movie_year::{BatchLog, RenameRecord};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary movie library with its own log file next to it.
struct TestFixture {
    _temp_dir: TempDir,
    root: PathBuf,
    log_file: PathBuf,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = fs::canonicalize(temp_dir.path()).expect("Failed to canonicalize temp dir");
        let root = base.join("library");
        fs::create_dir(&root).expect("Failed to create library directory");

        TestFixture {
            _temp_dir: temp_dir,
            root,
            log_file: base.join("rename_log.txt"),
        }
    }

    fn path(&self) -> &Path {
        &self.root
    }

    fn config(&self) -> Config {
        Config {
            root: self.root.clone(),
            log_file: self.log_file.clone(),
            api_delay_ms: 0,
            ..Default::default()
        }
    }

    fn log(&self) -> BatchLog {
        BatchLog::new(&self.log_file)
    }

    /// Create a file (and any parent folders) with its own name as content.
    fn create_file(&self, rel_path: &str) {
        let path = self.root.join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, rel_path).expect("Failed to write file");
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.root.join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.root.join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    fn assert_content(&self, rel_path: &str, expected: &str) {
        let content = fs::read_to_string(self.root.join(rel_path)).expect("Failed to read file");
        assert_eq!(content, expected, "Unexpected content in {}", rel_path);
    }

    /// All files and folders under the root, relative and sorted.
    fn snapshot(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| {
                let entry = entry.expect("Failed to read entry");
                entry.path().strip_prefix(&self.root).unwrap().to_path_buf()
            })
            .collect()
    }
}

/// In-memory metadata keyed by the exact title queried.
#[derive(Default)]
struct StaticSource {
    movies: HashMap<String, Metadata>,
    queries: RefCell<Vec<String>>,
}

impl StaticSource {
    fn with(mut self, title: &str, year: &str, collection: Option<&str>) -> Self {
        self.movies.insert(
            title.to_string(),
            Metadata {
                title: title.to_string(),
                year: year.to_string(),
                collection: collection.map(str::to_string),
            },
        );
        self
    }

    fn queried(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }
}

impl MetadataSource for StaticSource {
    fn resolve(&self, title: &str) -> Resolution {
        self.queries.borrow_mut().push(title.to_string());
        match self.movies.get(title) {
            Some(metadata) => Resolution::Found(metadata.clone()),
            None => Resolution::NotFound,
        }
    }
}

fn options(clean_junk: bool, dry_run: bool, sort_by_collection: bool) -> RenameOptions {
    RenameOptions {
        clean_junk,
        dry_run,
        sort_by_collection,
    }
}

// ============================================================================
// Test Suite 1: Basic Renames
// ============================================================================

#[test]
fn test_rename_empty_library() {
    let fixture = TestFixture::new();
    let source = StaticSource::default();

    let summary = rename_movies(&fixture.config(), &RenameOptions::default(), &source)
        .expect("Batch failed");

    assert_eq!(summary.processed(), 0);
    assert!(!fixture.log_file.exists(), "No log for an empty batch");
}

#[test]
fn test_rename_single_movie() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.mkv");
    let source = StaticSource::default().with("Heat", "1995", None);

    let summary = rename_movies(&fixture.config(), &RenameOptions::default(), &source)
        .expect("Batch failed");

    assert_eq!(summary.renamed, 1);
    fixture.assert_file_exists("Heat (1995).mkv");
    fixture.assert_file_not_exists("Heat.mkv");
    fixture.assert_content("Heat (1995).mkv", "Heat.mkv");

    let records = fixture.log().read_records().unwrap();
    assert_eq!(
        records,
        vec![RenameRecord::new(
            fixture.path().join("Heat.mkv"),
            fixture.path().join("Heat (1995).mkv")
        )]
    );
}

#[test]
fn test_rename_lowercases_extension() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.MKV");
    let source = StaticSource::default().with("Heat", "1995", None);

    rename_movies(&fixture.config(), &RenameOptions::default(), &source).expect("Batch failed");

    fixture.assert_file_exists("Heat (1995).mkv");
}

#[test]
fn test_rename_with_junk_cleanup_queries_clean_title() {
    let fixture = TestFixture::new();
    fixture.create_file("The.Matrix.1080p.BluRay.x264.mkv");
    let source = StaticSource::default().with("The Matrix", "1999", None);

    let summary = rename_movies(&fixture.config(), &options(true, false, false), &source)
        .expect("Batch failed");

    assert_eq!(source.queried(), vec!["The Matrix"]);
    assert_eq!(summary.renamed, 1);
    fixture.assert_file_exists("The Matrix (1999).mkv");
}

#[test]
fn test_rename_without_junk_cleanup_keeps_raw_stem() {
    let fixture = TestFixture::new();
    fixture.create_file("The.Matrix.1080p.mkv");
    let source = StaticSource::default();

    rename_movies(&fixture.config(), &RenameOptions::default(), &source).expect("Batch failed");

    assert_eq!(source.queried(), vec!["The.Matrix.1080p"]);
}

#[test]
fn test_rename_skips_tagged_and_non_video_files() {
    let fixture = TestFixture::new();
    fixture.create_file("Alien (1979).mkv");
    fixture.create_file("Heat.srt");
    fixture.create_file("Heat.mkv");
    let source = StaticSource::default().with("Heat", "1995", None);

    let summary = rename_movies(&fixture.config(), &RenameOptions::default(), &source)
        .expect("Batch failed");

    assert_eq!(source.queried(), vec!["Heat"]);
    assert_eq!(summary.already_tagged, 1);
    fixture.assert_file_exists("Alien (1979).mkv");
    fixture.assert_file_exists("Heat.srt");
}

#[test]
fn test_rename_processes_subfolders_in_place() {
    let fixture = TestFixture::new();
    fixture.create_file("Crime/Heat.mkv");
    fixture.create_file("SciFi/Deep/Alien.avi");
    let source = StaticSource::default()
        .with("Heat", "1995", None)
        .with("Alien", "1979", Some("Alien Collection"));

    let summary = rename_movies(&fixture.config(), &RenameOptions::default(), &source)
        .expect("Batch failed");

    assert_eq!(summary.renamed, 2);
    fixture.assert_file_exists("Crime/Heat (1995).mkv");
    fixture.assert_file_exists("SciFi/Deep/Alien (1979).avi");
    fixture.assert_file_not_exists("Alien Collection");
}

// ============================================================================
// Test Suite 2: Dry-Run Mode
// ============================================================================

#[test]
fn test_dry_run_doesnt_move_files() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.mkv");
    fixture.create_file("Alien.mkv");
    let source = StaticSource::default()
        .with("Heat", "1995", None)
        .with("Alien", "1979", Some("Alien Collection"));
    let before = fixture.snapshot();

    let summary = rename_movies(&fixture.config(), &options(false, true, true), &source)
        .expect("Batch failed");

    assert_eq!(summary.planned, 2);
    assert_eq!(summary.renamed, 0);
    assert_eq!(fixture.snapshot(), before, "Dry run must not touch the library");
    assert!(!fixture.log_file.exists(), "Dry run must not write the log");
}

#[test]
fn test_dry_run_then_real_run_agree() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.mkv");
    fixture.create_file("Unknown.mkv");
    let source = StaticSource::default().with("Heat", "1995", None);

    let dry = rename_movies(&fixture.config(), &options(false, true, false), &source)
        .expect("Dry run failed");
    let real = rename_movies(&fixture.config(), &options(false, false, false), &source)
        .expect("Batch failed");

    assert_eq!(dry.planned, real.renamed);
    assert_eq!(dry.not_found, real.not_found);
}

// ============================================================================
// Test Suite 3: Collisions and Skips
// ============================================================================

#[test]
fn test_existing_destination_is_skipped() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.mkv");
    fixture.create_file("Heat (1995).mkv");
    let source = StaticSource::default().with("Heat", "1995", None);

    let summary = rename_movies(&fixture.config(), &RenameOptions::default(), &source)
        .expect("Batch failed");

    assert_eq!(summary.skipped_existing, 1);
    assert_eq!(summary.renamed, 0);
    fixture.assert_content("Heat.mkv", "Heat.mkv");
    fixture.assert_content("Heat (1995).mkv", "Heat (1995).mkv");
    assert!(fixture.log().read_records().unwrap().is_empty());
}

#[test]
fn test_not_found_is_skipped() {
    let fixture = TestFixture::new();
    fixture.create_file("Obscure Home Video.mp4");
    let source = StaticSource::default();

    let summary = rename_movies(&fixture.config(), &RenameOptions::default(), &source)
        .expect("Batch failed");

    assert_eq!(summary.not_found, 1);
    fixture.assert_file_exists("Obscure Home Video.mp4");
    assert!(!fixture.log_file.exists());
}

#[test]
fn test_rerun_is_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.mkv");
    let source = StaticSource::default().with("Heat", "1995", None);

    rename_movies(&fixture.config(), &RenameOptions::default(), &source).expect("Batch failed");
    let after_first = fixture.snapshot();
    let second = rename_movies(&fixture.config(), &RenameOptions::default(), &source)
        .expect("Second batch failed");

    assert_eq!(second.renamed, 0);
    assert_eq!(second.already_tagged, 1);
    assert_eq!(fixture.snapshot(), after_first);
    assert_eq!(fixture.log().read_records().unwrap().len(), 1);
}

#[test]
fn test_two_sources_with_same_target_only_first_wins() {
    let fixture = TestFixture::new();
    fixture.create_file("a/Heat.mkv");
    fixture.create_file("b/Heat.mkv");
    let source = StaticSource::default().with("Heat", "1995", Some("Heat Saga"));

    let summary = rename_movies(&fixture.config(), &options(false, false, true), &source)
        .expect("Batch failed");

    assert_eq!(summary.renamed, 1);
    assert_eq!(summary.skipped_existing, 1);
    fixture.assert_file_exists("Heat Saga/Heat (1995).mkv");
    fixture.assert_content("Heat Saga/Heat (1995).mkv", "a/Heat.mkv");
    fixture.assert_file_exists("b/Heat.mkv");
}

// ============================================================================
// Test Suite 4: Collection Folders
// ============================================================================

#[test]
fn test_collection_sorting_moves_into_root_folder() {
    let fixture = TestFixture::new();
    fixture.create_file("SciFi/Alien.mkv");
    fixture.create_file("Heat.mkv");
    let source = StaticSource::default()
        .with("Alien", "1979", Some("Alien Collection"))
        .with("Heat", "1995", None);

    let summary = rename_movies(&fixture.config(), &options(false, false, true), &source)
        .expect("Batch failed");

    assert_eq!(summary.renamed, 2);
    fixture.assert_file_exists("Alien Collection/Alien (1979).mkv");
    fixture.assert_file_not_exists("SciFi/Alien.mkv");
    // No collection: stays where it was.
    fixture.assert_file_exists("Heat (1995).mkv");
}

#[test]
fn test_collection_folder_reused_when_present() {
    let fixture = TestFixture::new();
    fixture.create_file("Alien Collection/Aliens (1986).mkv");
    fixture.create_file("Alien.mkv");
    let source = StaticSource::default().with("Alien", "1979", Some("Alien Collection"));

    rename_movies(&fixture.config(), &options(false, false, true), &source).expect("Batch failed");

    fixture.assert_file_exists("Alien Collection/Aliens (1986).mkv");
    fixture.assert_file_exists("Alien Collection/Alien (1979).mkv");
}

#[test]
fn test_collection_name_with_separator_stays_under_root() {
    let fixture = TestFixture::new();
    fixture.create_file("Face Off.mkv");
    let source = StaticSource::default().with("Face Off", "1997", Some("Face/Off Collection"));

    rename_movies(&fixture.config(), &options(false, false, true), &source).expect("Batch failed");

    fixture.assert_file_exists("Face-Off Collection/Face Off (1997).mkv");
}

// ============================================================================
// Test Suite 5: Undo and Round Trips
// ============================================================================

#[test]
fn test_round_trip_restores_exact_paths() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.mkv");
    fixture.create_file("SciFi/Alien.mkv");
    fixture.create_file("SciFi/Deep/Aliens.mp4");
    fixture.create_file("Drama/Memento.avi");
    let source = StaticSource::default()
        .with("Heat", "1995", None)
        .with("Alien", "1979", Some("Alien Collection"))
        .with("Aliens", "1986", Some("Alien Collection"))
        .with("Memento", "2000", None);
    let before = fixture.snapshot();

    let summary = rename_movies(&fixture.config(), &options(false, false, true), &source)
        .expect("Batch failed");
    assert_eq!(summary.renamed, 4);

    // Remove an emptied folder to force undo to recreate it.
    fs::remove_dir_all(fixture.path().join("SciFi")).expect("Failed to remove folder");

    let outcome = undo_last_batch(&fixture.config()).expect("Undo failed");
    let UndoOutcome::Completed(report) = outcome else {
        panic!("expected a completed undo");
    };

    assert_eq!(report.restored.len(), 4);
    assert!(report.is_complete_success());
    fixture.assert_content("Heat.mkv", "Heat.mkv");
    fixture.assert_content("SciFi/Alien.mkv", "SciFi/Alien.mkv");
    fixture.assert_content("SciFi/Deep/Aliens.mp4", "SciFi/Deep/Aliens.mp4");
    fixture.assert_content("Drama/Memento.avi", "Drama/Memento.avi");
    assert!(!fixture.log_file.exists(), "Log must be removed after undo");

    // The collection folder created by the batch stays, now empty.
    let mut after = fixture.snapshot();
    after.retain(|p| p != Path::new("Alien Collection"));
    assert_eq!(after, before);
}

#[test]
fn test_undo_without_log_does_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat (1995).mkv");
    let before = fixture.snapshot();

    let outcome = undo_last_batch(&fixture.config()).expect("Undo failed");

    assert!(matches!(outcome, UndoOutcome::NothingToUndo));
    assert_eq!(fixture.snapshot(), before);
    assert!(!fixture.log_file.exists());
}

#[test]
fn test_undo_via_run_cli() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.mkv");
    let source = StaticSource::default().with("Heat", "1995", None);
    rename_movies(&fixture.config(), &RenameOptions::default(), &source).expect("Batch failed");

    let result = run_cli(Command::Undo, &fixture.config(), ApiKey::Unset);

    assert!(result.is_ok());
    fixture.assert_file_exists("Heat.mkv");
    fixture.assert_file_not_exists("Heat (1995).mkv");
}

#[test]
fn test_undo_with_deleted_file_reverts_the_rest() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.mkv");
    fixture.create_file("Memento.mkv");
    let source = StaticSource::default()
        .with("Heat", "1995", None)
        .with("Memento", "2000", None);
    rename_movies(&fixture.config(), &RenameOptions::default(), &source).expect("Batch failed");

    fs::remove_file(fixture.path().join("Heat (1995).mkv")).expect("Failed to delete file");

    let UndoOutcome::Completed(report) = undo_last_batch(&fixture.config()).expect("Undo failed")
    else {
        panic!("expected a completed undo");
    };

    assert_eq!(report.restored.len(), 1);
    assert_eq!(report.skipped_files.len(), 1);
    fixture.assert_file_exists("Memento.mkv");
    assert!(!fixture.log_file.exists());
}

#[test]
fn test_log_accumulates_batches_until_undo() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.mkv");
    let source = StaticSource::default()
        .with("Heat", "1995", None)
        .with("Memento", "2000", None);
    rename_movies(&fixture.config(), &RenameOptions::default(), &source).expect("Batch failed");

    fixture.create_file("Memento.mkv");
    rename_movies(&fixture.config(), &RenameOptions::default(), &source)
        .expect("Second batch failed");
    assert_eq!(fixture.log().read_records().unwrap().len(), 2);

    undo_last_batch(&fixture.config()).expect("Undo failed");

    fixture.assert_file_exists("Heat.mkv");
    fixture.assert_file_exists("Memento.mkv");
}

#[test]
fn test_path_with_record_separator_is_left_in_place() {
    let fixture = TestFixture::new();
    fixture.create_file("Before -> After/Heat.mkv");
    fixture.create_file("Memento.mkv");
    let source = StaticSource::default()
        .with("Heat", "1995", None)
        .with("Memento", "2000", None);

    let summary = rename_movies(&fixture.config(), &RenameOptions::default(), &source)
        .expect("Batch failed");

    assert_eq!(summary.renamed, 1);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(
        summary.failed[0].0,
        fixture.path().join("Before -> After/Heat.mkv")
    );
    fixture.assert_file_exists("Before -> After/Heat.mkv");
    fixture.assert_file_not_exists("Before -> After/Heat (1995).mkv");

    undo_last_batch(&fixture.config()).expect("Undo failed");
    fixture.assert_file_exists("Memento.mkv");
    fixture.assert_file_exists("Before -> After/Heat.mkv");
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_name_survives_rename_and_undo() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fixture = TestFixture::new();
    let odd_name = fixture.path().join(OsStr::from_bytes(b"Caf\xe9.mkv"));
    fs::write(&odd_name, "data").expect("Failed to write file");
    fixture.create_file("Heat.mkv");
    let source = StaticSource::default().with("Heat", "1995", None);

    let summary = rename_movies(&fixture.config(), &RenameOptions::default(), &source)
        .expect("Batch failed");

    assert_eq!(summary.non_utf8, 1);
    assert_eq!(summary.renamed, 1);
    assert_eq!(source.queried(), vec!["Heat"]);
    assert!(odd_name.is_file());

    undo_last_batch(&fixture.config()).expect("Undo failed");
    assert!(odd_name.is_file(), "Original bytes of the name must be kept");
    fixture.assert_file_exists("Heat.mkv");
}

// ============================================================================
// Test Suite 6: Configuration and Menu
// ============================================================================

#[test]
fn test_exclusion_filters_from_config() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat/Extras/Behind The Scenes.mkv");
    fixture.create_file("Heat/Heat.mkv");
    let mut config = fixture.config();
    config.filters.exclude_patterns = vec!["**/Extras/**".to_string()];
    let source = StaticSource::default().with("Heat", "1995", None);

    let summary =
        rename_movies(&config, &RenameOptions::default(), &source).expect("Batch failed");

    assert_eq!(source.queried(), vec!["Heat"]);
    assert_eq!(summary.excluded, 1);
    fixture.assert_file_exists("Heat/Heat (1995).mkv");
}

#[test]
fn test_custom_extensions_from_config() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.ts");
    fixture.create_file("Alien.mkv");
    let mut config = fixture.config();
    config.extensions = vec!["ts".to_string()];
    let source = StaticSource::default()
        .with("Heat", "1995", None)
        .with("Alien", "1979", None);

    rename_movies(&config, &RenameOptions::default(), &source).expect("Batch failed");

    fixture.assert_file_exists("Heat (1995).ts");
    fixture.assert_file_exists("Alien.mkv");
}

#[test]
fn test_unreadable_log_does_not_stop_the_batch() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.mkv");
    fs::create_dir(&fixture.log_file).expect("Failed to create directory");
    let source = StaticSource::default().with("Heat", "1995", None);

    let summary = rename_movies(&fixture.config(), &RenameOptions::default(), &source)
        .expect("Batch failed");

    // The record cannot be written, so the move is rolled back.
    assert_eq!(summary.renamed, 0);
    assert_eq!(summary.failed.len(), 1);
    fixture.assert_file_exists("Heat.mkv");
    fixture.assert_file_not_exists("Heat (1995).mkv");
}

#[test]
fn test_missing_root_is_an_error() {
    let fixture = TestFixture::new();
    let mut config = fixture.config();
    config.root = fixture.path().join("does-not-exist");

    let result = rename_movies(&config, &RenameOptions::default(), &StaticSource::default());
    assert!(result.is_err());
}

#[test]
fn test_menu_rename_then_undo() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.1080p.mkv");
    let config = fixture.config();

    // 1 = rename; junk yes, dry-run no, collections no; 2 = undo; 3 = exit.
    let input = "1\ny\nn\nn\n2\n3\n";
    let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());

    let result = run_menu(
        &config,
        ApiKey::Set("test-key".to_string()),
        &mut prompter,
        |_, key| {
            assert_eq!(key.as_str(), Some("test-key"));
            Ok(Box::new(StaticSource::default().with("Heat", "1995", None))
                as Box<dyn MetadataSource>)
        },
    );

    assert!(result.is_ok());
    // Renamed by option 1, then reverted by option 2.
    fixture.assert_file_exists("Heat.1080p.mkv");
    fixture.assert_file_not_exists("Heat (1995).mkv");
    assert!(!fixture.log_file.exists());
}

#[test]
fn test_menu_prompts_for_missing_key() {
    let fixture = TestFixture::new();
    fixture.create_file("Heat.mkv");
    let config = fixture.config();

    let input = "1\nprompted-key\nn\nn\nn\n3\n";
    let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());

    let result = run_menu(&config, ApiKey::Unset, &mut prompter, |_, key| {
        assert_eq!(key, &ApiKey::Set("prompted-key".to_string()));
        Ok(Box::new(StaticSource::default().with("Heat", "1995", None)) as Box<dyn MetadataSource>)
    });

    assert!(result.is_ok());
    fixture.assert_file_exists("Heat (1995).mkv");
}
