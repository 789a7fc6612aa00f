//! Library traversal.
//!
//! Walks the movie root recursively and collects the files a rename batch
//! should look at: regular files with a video extension whose name does not
//! already carry a year and that no exclusion rule matches.

use crate::classifier::{VideoExtensions, has_year};
use crate::config::CompiledFilters;
use crate::planner::Candidate;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Errors that stop a scan before it starts.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid root folder {}: {source}", .path.display())]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Files found under the root, in traversal order.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Canonical absolute root that was walked.
    pub root: PathBuf,
    /// Files that need a year.
    pub candidates: Vec<Candidate>,
    /// Video files skipped because their name already has a year.
    pub already_tagged: usize,
    /// Video files skipped by exclusion rules.
    pub excluded: usize,
    /// Video files skipped because their path is not valid UTF-8.
    pub non_utf8: usize,
}

/// Scans `root` for candidate movie files.
///
/// The root is canonicalized so every candidate path is absolute. Entries
/// within a directory are visited in file-name order; symlinked directories
/// are not followed. Unreadable entries and non-UTF-8 paths are logged and
/// skipped.
pub fn scan(
    root: &Path,
    extensions: &VideoExtensions,
    filters: &CompiledFilters,
) -> Result<ScanResult, ScanError> {
    let root = dunce::canonicalize(root).map_err(|e| ScanError::InvalidRoot {
        path: root.to_path_buf(),
        source: e,
    })?;
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root));
    }

    let mut result = ScanResult {
        root: root.clone(),
        ..Default::default()
    };

    for entry in WalkDir::new(&root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        if !entry.file_type().is_file() || !extensions.matches(entry.path()) {
            continue;
        }

        if entry.path().to_str().is_none() {
            log::warn!(
                "Skipping file with a non-UTF-8 path: {}",
                entry.path().display()
            );
            result.non_utf8 += 1;
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if has_year(&name) {
            result.already_tagged += 1;
            continue;
        }

        if !filters.should_include(entry.path()) {
            log::debug!("Excluded by filter: {}", entry.path().display());
            result.excluded += 1;
            continue;
        }

        if let Some(candidate) = Candidate::from_path(entry.into_path()) {
            result.candidates.push(candidate);
        }
    }

    Ok(result)
}
