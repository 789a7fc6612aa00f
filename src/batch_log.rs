/// Append-only record of applied renames.
///
/// Each successful rename is written as one UTF-8 line of the form
/// `<old_absolute_path> -> <new_absolute_path>`. The log holds exactly one
/// pending batch: apply appends to it, undo replays it in reverse and then
/// removes it.
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Separator between the two paths of a log line.
pub const RECORD_SEPARATOR: &str = " -> ";

/// Default log file name, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "rename_log.txt";

/// One applied rename, the unit of undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRecord {
    /// Where the file was before the rename.
    pub source: PathBuf,
    /// Where the file was moved to.
    pub destination: PathBuf,
}

impl RenameRecord {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Parses a log line. Lines without the separator yield `None`.
    ///
    /// The line is split on the first separator; [`is_loggable`] keeps paths
    /// that would break this out of the log.
    pub fn parse_line(line: &str) -> Option<Self> {
        let (source, destination) = line.split_once(RECORD_SEPARATOR)?;
        Some(Self::new(source, destination))
    }
}

/// Returns true if `path` survives a write/parse round-trip through the log:
/// valid UTF-8, no record separator, no line breaks.
pub fn is_loggable(path: &Path) -> bool {
    path.to_str()
        .is_some_and(|s| !s.contains(RECORD_SEPARATOR) && !s.contains(['\n', '\r']))
}

impl fmt::Display for RenameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.source.to_string_lossy(),
            RECORD_SEPARATOR,
            self.destination.to_string_lossy()
        )
    }
}

/// Errors from reading or writing the batch log.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Failed to write log file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read log file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove log file {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to the batch log file.
#[derive(Debug, Clone)]
pub struct BatchLog {
    path: PathBuf,
}

impl BatchLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record. The file is opened in append mode for each write
    /// so every record is on disk before the next candidate is processed.
    pub fn append(&self, record: &RenameRecord) -> Result<(), LogError> {
        let to_error = |source| LogError::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(to_error)?;
        writeln!(file, "{}", record).map_err(to_error)?;
        file.flush().map_err(to_error)
    }

    /// Reads all records in chronological order. A missing file is an empty
    /// log; malformed lines are ignored.
    pub fn read_records(&self) -> Result<Vec<RenameRecord>, LogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|source| LogError::Read {
            path: self.path.clone(),
            source,
        })?;

        Ok(contents
            .lines()
            .filter_map(RenameRecord::parse_line)
            .collect())
    }

    /// Returns true if the log holds at least one record.
    pub fn has_pending_batch(&self) -> Result<bool, LogError> {
        Ok(!self.read_records()?.is_empty())
    }

    /// Removes the log file, marking the batch as consumed.
    pub fn clear(&self) -> Result<(), LogError> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|source| LogError::Remove {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
