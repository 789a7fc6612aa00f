/// Undo functionality for reverting the last rename batch.
///
/// This module replays the batch log in reverse, moving every file back to
/// where it was before the batch ran, and then removes the log.
use crate::batch_log::{BatchLog, LogError, RenameRecord};
use std::fs;
use std::path::PathBuf;

/// Represents the result of an undo run that had records to process.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Records whose file was moved back, in the order they were reverted.
    pub restored: Vec<RenameRecord>,
    /// Records skipped because the renamed file is no longer there.
    pub skipped_files: Vec<(PathBuf, String)>,
    /// Records that could not be reverted.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Whether the log file was removed afterwards.
    pub log_cleared: bool,
}

impl UndoReport {
    /// Returns the total number of records processed.
    pub fn total_processed(&self) -> usize {
        self.restored.len() + self.failed_restores.len() + self.skipped_files.len()
    }

    /// Returns true if every record was reverted.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

/// What an undo request did.
#[derive(Debug)]
pub enum UndoOutcome {
    /// The log was missing or held no records. Nothing was touched.
    NothingToUndo,
    /// The batch was replayed.
    Completed(UndoReport),
}

/// Manages undo operations for rename batches.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the batch recorded in `log`.
    ///
    /// Records are processed newest first, so files moved into collection
    /// folders created during the batch are unwound in the right order. Each
    /// record fails soft:
    ///
    /// * **Renamed file missing**: skipped with a note
    /// * **Original location occupied**: recorded as a failure, nothing is overwritten
    /// * **Move error**: recorded as a failure with the error reason
    ///
    /// After all records are processed the log is removed, so a batch can be
    /// undone only once.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use movie_year::batch_log::BatchLog;
    /// use movie_year::undo::{UndoManager, UndoOutcome};
    ///
    /// let log = BatchLog::new("rename_log.txt");
    /// match UndoManager::undo(&log) {
    ///     Ok(UndoOutcome::Completed(report)) => println!("Restored {} files", report.restored.len()),
    ///     Ok(UndoOutcome::NothingToUndo) => println!("Nothing to undo"),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(log: &BatchLog) -> Result<UndoOutcome, LogError> {
        let records = log.read_records()?;
        if records.is_empty() {
            return Ok(UndoOutcome::NothingToUndo);
        }

        let mut report = UndoReport::default();
        for record in records.into_iter().rev() {
            match Self::restore_file(&record) {
                Ok(()) => report.restored.push(record),
                Err(Restore::Missing(path, reason)) => report.skipped_files.push((path, reason)),
                Err(Restore::Failed(path, reason)) => report.failed_restores.push((path, reason)),
            }
        }

        match log.clear() {
            Ok(()) => report.log_cleared = true,
            Err(e) => log::warn!("Could not clear log file: {e}"),
        }

        Ok(UndoOutcome::Completed(report))
    }

    /// Moves a single file back to its original location, recreating the
    /// original folder if it was removed.
    fn restore_file(record: &RenameRecord) -> Result<(), Restore> {
        if fs::symlink_metadata(&record.destination).is_err() {
            return Err(Restore::Missing(
                record.destination.clone(),
                "File not found, cannot revert".to_string(),
            ));
        }

        if fs::symlink_metadata(&record.source).is_ok() {
            return Err(Restore::Failed(
                record.destination.clone(),
                format!(
                    "Original location is occupied: {}",
                    record.source.display()
                ),
            ));
        }

        if let Some(parent) = record.source.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Restore::Failed(
                    record.destination.clone(),
                    format!("Could not recreate {}: {}", parent.display(), e),
                )
            })?;
        }

        fs::rename(&record.destination, &record.source).map_err(|e| {
            Restore::Failed(
                record.destination.clone(),
                format!("Failed to revert: {}", e),
            )
        })
    }
}

/// Why a single record could not be restored.
enum Restore {
    Missing(PathBuf, String),
    Failed(PathBuf, String),
}
