//! Command-line workflows for movie-year.
//!
//! This module runs the two user-facing operations:
//! - A rename batch: scan, look up, plan, and apply (or preview) renames
//! - Undo: revert the last applied batch from the log

use crate::batch_log::BatchLog;
use crate::classifier::clean_title;
use crate::config::{ApiKey, Config};
use crate::metadata::{MetadataSource, Throttle, TmdbClient};
use crate::output::OutputFormatter;
use crate::planner::{PlanAction, PlanOptions, apply, plan};
use crate::scanner::scan;
use crate::undo::{UndoManager, UndoOutcome};
use std::path::PathBuf;

/// Choices that shape a rename batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameOptions {
    /// Strip quality and encoding tokens from titles before lookup.
    pub clean_junk: bool,
    /// Report planned renames without touching the filesystem.
    pub dry_run: bool,
    /// Move movies into `root/<collection>` folders.
    pub sort_by_collection: bool,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a rename batch.
    Rename(RenameOptions),
    /// Undo the last batch.
    Undo,
}

/// Counts and failures from one rename batch.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Files moved and logged.
    pub renamed: usize,
    /// Renames reported in dry-run mode.
    pub planned: usize,
    /// Candidates whose destination already existed.
    pub skipped_existing: usize,
    /// Candidates with no metadata.
    pub not_found: usize,
    /// Video files skipped because they already carry a year.
    pub already_tagged: usize,
    /// Video files skipped by exclusion rules.
    pub excluded: usize,
    /// Video files skipped because their path is not valid UTF-8.
    pub non_utf8: usize,
    /// Candidates that failed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    /// Number of candidates looked at.
    pub fn processed(&self) -> usize {
        self.renamed + self.planned + self.skipped_existing + self.not_found + self.failed.len()
    }

    fn print(&self, dry_run: bool) {
        let mut rows = Vec::new();
        if dry_run {
            rows.push(("Would rename", self.planned));
        } else {
            rows.push(("Renamed", self.renamed));
        }
        rows.push(("Skipped (already exists)", self.skipped_existing));
        rows.push(("Year not found", self.not_found));
        rows.push(("Already tagged", self.already_tagged));
        if self.excluded > 0 {
            rows.push(("Excluded", self.excluded));
        }
        if self.non_utf8 > 0 {
            rows.push(("Non-UTF-8 names", self.non_utf8));
        }
        rows.push(("Failed", self.failed.len()));

        OutputFormatter::summary_table(if dry_run { "DRY-RUN SUMMARY" } else { "SUMMARY" }, &rows);
    }
}

/// Runs a command against the configured library.
///
/// A rename needs a credential; without one the command stops before
/// touching anything.
///
/// # Examples
///
/// ```no_run
/// use movie_year::cli::{Command, run_cli};
/// use movie_year::config::Config;
///
/// let config = Config::default();
/// let key = config.api_key();
/// if let Err(e) = run_cli(Command::Undo, &config, key) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(command: Command, config: &Config, api_key: ApiKey) -> Result<(), String> {
    match command {
        Command::Rename(options) => {
            let source = connect(config, &api_key)?;
            rename_movies(config, &options, source.as_ref()).map(|_| ())
        }
        Command::Undo => undo_last_batch(config).map(|_| ()),
    }
}

/// Builds the TMDb client for a credential.
pub fn connect(config: &Config, api_key: &ApiKey) -> Result<Box<dyn MetadataSource>, String> {
    let Some(key) = api_key.as_str() else {
        return Err(
            "No API key provided. Set TMDB_API_KEY, add it to the config file, or pass --api-key."
                .to_string(),
        );
    };

    let client = TmdbClient::new(key, &config.tmdb.base_url, config.timeout())
        .map_err(|e| format!("Could not create TMDb client: {}", e))?;
    Ok(Box::new(client))
}

/// Runs one rename batch over the configured root.
///
/// Candidates are processed one at a time in traversal order, with the
/// configured delay between lookups. Per-file problems are reported and
/// counted; only an unusable configuration or root aborts the batch.
pub fn rename_movies(
    config: &Config,
    options: &RenameOptions,
    source: &dyn MetadataSource,
) -> Result<BatchSummary, String> {
    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    let extensions = config.video_extensions();

    let spinner = OutputFormatter::create_spinner(&format!("Scanning {}", config.root.display()));
    let scanned = scan(&config.root, &extensions, &filters);
    spinner.finish_and_clear();
    let scanned = scanned.map_err(|e| e.to_string())?;

    OutputFormatter::info(&format!(
        "Found {} movie file(s) without a year in {}",
        scanned.candidates.len(),
        scanned.root.display()
    ));
    if options.dry_run {
        OutputFormatter::dry_run_notice("No files will be renamed.");
    }

    let log = BatchLog::new(&config.log_file);
    let plan_options = PlanOptions {
        root: scanned.root.clone(),
        sort_by_collection: options.sort_by_collection,
        dry_run: options.dry_run,
    };
    let mut throttle = Throttle::new(config.api_delay());
    log::debug!("Lookup delay: {:?}", throttle.interval());

    if !options.dry_run {
        match log.has_pending_batch() {
            Ok(true) => OutputFormatter::info(&format!(
                "{} already holds renames; undo will revert them together with this batch.",
                log.path().display()
            )),
            Ok(false) => {}
            Err(e) => log::warn!("Could not check for a pending batch: {e}"),
        }
    }

    let mut summary = BatchSummary {
        already_tagged: scanned.already_tagged,
        excluded: scanned.excluded,
        non_utf8: scanned.non_utf8,
        ..Default::default()
    };

    for candidate in &scanned.candidates {
        let title = clean_title(&candidate.file_name, options.clean_junk);

        throttle.wait();
        let resolution = source.resolve(&title);

        let planned = match plan(candidate, &title, &resolution, &plan_options) {
            Ok(planned) => planned,
            Err(e) => {
                OutputFormatter::error(&e.to_string());
                summary.failed.push((candidate.path.clone(), e.to_string()));
                continue;
            }
        };
        let new_name = planned.new_name().unwrap_or_default();

        match planned.action {
            PlanAction::SkipNoYear => {
                OutputFormatter::warning(&format!("Year not found: {}", title));
                summary.not_found += 1;
            }
            PlanAction::SkipExists => {
                OutputFormatter::warning(&format!("Skipped (already exists): {}", new_name));
                summary.skipped_existing += 1;
            }
            PlanAction::Rename if options.dry_run => {
                OutputFormatter::dry_run_notice(&format!(
                    "Would rename: {} → {}",
                    candidate.file_name, new_name
                ));
                summary.planned += 1;
            }
            PlanAction::Rename => match apply(&planned, &log) {
                Ok(_) => {
                    OutputFormatter::success(&format!(
                        "Renamed: {} → {}",
                        candidate.file_name, new_name
                    ));
                    summary.renamed += 1;
                }
                Err(e) => {
                    OutputFormatter::error(&format!(
                        "Failed to rename {}: {}",
                        candidate.file_name, e
                    ));
                    summary.failed.push((candidate.path.clone(), e.to_string()));
                }
            },
        }
    }

    summary.print(options.dry_run);
    if summary.renamed > 0 {
        OutputFormatter::plain(&format!(
            "Log written to {}. Use 'movie-year undo' to revert this batch.",
            log.path().display()
        ));
    } else if options.dry_run {
        OutputFormatter::plain("Dry run complete. No files were modified.");
    }

    Ok(summary)
}

/// Reverts the batch recorded in the configured log and reports the result.
pub fn undo_last_batch(config: &Config) -> Result<UndoOutcome, String> {
    let log = BatchLog::new(&config.log_file);
    OutputFormatter::info(&format!("Undoing renames from {}", log.path().display()));

    let outcome = UndoManager::undo(&log).map_err(|e| format!("Error: {}", e))?;

    match &outcome {
        UndoOutcome::NothingToUndo => {
            OutputFormatter::warning("No renames recorded. Nothing to undo.");
        }
        UndoOutcome::Completed(report) => {
            for record in &report.restored {
                OutputFormatter::success(&format!(
                    "Reverted: {} → {}",
                    record.destination.display(),
                    record.source.display()
                ));
            }
            for (path, reason) in &report.skipped_files {
                OutputFormatter::warning(&format!("{}: {}", reason, path.display()));
            }
            for (path, reason) in &report.failed_restores {
                OutputFormatter::error(&format!("{}: {}", path.display(), reason));
            }

            OutputFormatter::summary_table(
                "UNDO SUMMARY",
                &[
                    ("Restored", report.restored.len()),
                    ("Skipped", report.skipped_files.len()),
                    ("Failed", report.failed_restores.len()),
                ],
            );

            if report.log_cleared {
                OutputFormatter::plain("Undo complete. Log file cleared.");
            } else {
                OutputFormatter::warning(&format!(
                    "Undo complete, but {} could not be removed.",
                    log.path().display()
                ));
            }
        }
    }

    Ok(outcome)
}
