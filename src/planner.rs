/// Rename planning and application.
///
/// Planning decides where a movie file should go: `"{title} ({year}){ext}"`
/// in its current folder, or under `root/<collection>` when collection
/// sorting is enabled and the movie belongs to one. Applying moves the file
/// and records the move in the batch log so it can be undone later.
use crate::batch_log::{BatchLog, LogError, RenameRecord, is_loggable};
use crate::metadata::Resolution;
use std::fs;
use std::path::{Path, PathBuf};

/// A movie file found during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// File name including extension.
    pub file_name: String,
    /// Lowercased extension with its leading dot, e.g. `.mkv`. Empty when the
    /// file has none.
    pub extension: String,
}

impl Candidate {
    /// Builds a candidate from a file path. Returns `None` for paths without
    /// a file name component.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        Some(Self {
            path,
            file_name,
            extension,
        })
    }

    /// The folder currently holding the file.
    pub fn folder(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Options that shape the destination of a rename.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Root of the movie library; collection folders are created under it.
    pub root: PathBuf,
    /// Move movies that belong to a collection into `root/<collection>`.
    pub sort_by_collection: bool,
    /// Compute plans without touching the filesystem.
    pub dry_run: bool,
}

/// What should happen to a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    /// Move the file to the destination.
    Rename,
    /// A file already occupies the destination; leave the source alone.
    SkipExists,
    /// No metadata was found, so there is no year to add.
    SkipNoYear,
}

/// The planned outcome for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub source: PathBuf,
    /// Computed target. `None` only for [`PlanAction::SkipNoYear`].
    pub destination: Option<PathBuf>,
    pub action: PlanAction,
}

impl RenamePlan {
    /// File name of the destination, for display.
    pub fn new_name(&self) -> Option<String> {
        self.destination
            .as_ref()
            .and_then(|d| d.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }
}

/// Errors that can occur while planning or applying a rename.
#[derive(Debug, thiserror::Error)]
pub enum RenameError {
    /// Failed to create a collection directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move the file to its destination.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The destination appeared between planning and applying.
    #[error("Destination already exists: {}", .path.display())]
    DestinationExists { path: PathBuf },

    /// The path cannot be written to the batch log and read back, so the
    /// rename could not be undone.
    #[error("Path cannot be recorded for undo: {}", .path.display())]
    UnloggablePath { path: PathBuf },

    /// Only plans with [`PlanAction::Rename`] can be applied.
    #[error("Nothing to apply for {} ({action:?})", .path.display())]
    NotARename { path: PathBuf, action: PlanAction },

    /// The file was moved but the record could not be written.
    #[error("Moved to {} but could not record it: {source}", .record.destination.display())]
    LogWriteFailed {
        record: RenameRecord,
        #[source]
        source: LogError,
        rolled_back: bool,
    },
}

/// Result type for planning and applying renames.
pub type RenameResult<T> = Result<T, RenameError>;

/// Turns a collection name into a single folder name. Path separators are
/// replaced so the name cannot escape or nest under `root`.
pub fn collection_folder_name(collection: &str) -> Option<String> {
    let name = collection.replace(['/', '\\'], "-");
    let name = name.trim();
    match name {
        "" | "." | ".." => None,
        _ => Some(name.to_string()),
    }
}

/// Builds the new file name, `"{title} ({year}){ext}"`.
pub fn new_file_name(title: &str, year: &str, extension: &str) -> String {
    format!("{} ({}){}", title, year, extension)
}

/// Returns true if anything, including a dangling symlink, occupies `path`.
fn path_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Plans the rename of a single candidate.
///
/// The only filesystem mutation is creating the collection folder, and only
/// outside dry-run mode. Planning twice against an unchanged filesystem
/// yields the same plan.
///
/// # Examples
///
/// ```
/// use movie_year::metadata::{Metadata, Resolution};
/// use movie_year::planner::{Candidate, PlanAction, PlanOptions, plan};
///
/// let candidate = Candidate::from_path("/movies/Heat.mkv").unwrap();
/// let resolution = Resolution::Found(Metadata {
///     title: "Heat".to_string(),
///     year: "1995".to_string(),
///     collection: None,
/// });
/// let options = PlanOptions {
///     root: "/movies".into(),
///     sort_by_collection: false,
///     dry_run: true,
/// };
///
/// let planned = plan(&candidate, "Heat", &resolution, &options).unwrap();
/// assert_eq!(planned.action, PlanAction::Rename);
/// assert_eq!(planned.new_name().as_deref(), Some("Heat (1995).mkv"));
/// ```
pub fn plan(
    candidate: &Candidate,
    title: &str,
    resolution: &Resolution,
    options: &PlanOptions,
) -> RenameResult<RenamePlan> {
    let Some(metadata) = resolution.metadata() else {
        return Ok(RenamePlan {
            source: candidate.path.clone(),
            destination: None,
            action: PlanAction::SkipNoYear,
        });
    };

    let collection_folder = if options.sort_by_collection {
        metadata
            .collection
            .as_deref()
            .and_then(collection_folder_name)
            .map(|name| options.root.join(name))
    } else {
        None
    };

    let target_folder = match collection_folder {
        Some(folder) => {
            if !options.dry_run && !folder.is_dir() {
                fs::create_dir_all(&folder).map_err(|e| RenameError::DirectoryCreationFailed {
                    path: folder.clone(),
                    source: e,
                })?;
            }
            folder
        }
        None => candidate.folder().to_path_buf(),
    };

    let destination =
        target_folder.join(new_file_name(title, &metadata.year, &candidate.extension));

    let action = if path_taken(&destination) {
        PlanAction::SkipExists
    } else {
        PlanAction::Rename
    };

    Ok(RenamePlan {
        source: candidate.path.clone(),
        destination: Some(destination),
        action,
    })
}

/// Applies a rename plan: moves the file, then appends the record to the
/// batch log.
///
/// A failed move writes no record. Paths the log cannot hold are refused
/// before anything moves. If the record cannot be written the move is
/// reverted when possible, so the log never misses a file it moved.
pub fn apply(plan: &RenamePlan, log: &BatchLog) -> RenameResult<RenameRecord> {
    let destination = match (&plan.action, &plan.destination) {
        (PlanAction::Rename, Some(destination)) => destination,
        _ => {
            return Err(RenameError::NotARename {
                path: plan.source.clone(),
                action: plan.action,
            });
        }
    };

    if let Some(path) = [&plan.source, destination]
        .into_iter()
        .find(|path| !is_loggable(path))
    {
        return Err(RenameError::UnloggablePath { path: path.clone() });
    }

    if path_taken(destination) {
        return Err(RenameError::DestinationExists {
            path: destination.clone(),
        });
    }

    fs::rename(&plan.source, destination).map_err(|e| RenameError::FileMoveFailure {
        from: plan.source.clone(),
        to: destination.clone(),
        source: e,
    })?;

    let record = RenameRecord::new(&plan.source, destination);
    if let Err(e) = log.append(&record) {
        let rolled_back = fs::rename(destination, &plan.source).is_ok();
        return Err(RenameError::LogWriteFailed {
            record,
            source: e,
            rolled_back,
        });
    }

    Ok(record)
}
