//! Filename classification for movie files.
//!
//! This module decides which files are worth looking up and recovers a clean
//! title from a release-style filename.
//!
//! # Examples
//!
//! ```
//! use movie_year::classifier::{clean_title, has_year};
//!
//! assert!(has_year("Movie (1999).mkv"));
//! assert!(!has_year("Movie.mkv"));
//! assert_eq!(clean_title("Movie.2019.1080p.BluRay.x264.mkv", true), "Movie 2019");
//! ```
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

/// Matches a year already embedded in a filename, e.g. `(1999)`.
static RE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\d{4}\)").expect("Failed to compile year regex"));

/// Quality and encoding markers removed when junk cleanup is enabled.
static RE_JUNK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(1080p|720p|480p|BluRay|BRRip|DVDRip|HDR|WEBRip|x264|x265|HEVC|AAC|DTS|H\.264|H\.265)",
    )
    .expect("Failed to compile junk regex")
});

static RE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[._]+").expect("Failed to compile separator regex"));

static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("Failed to compile whitespace regex"));

/// Video extensions recognized when no configuration overrides them.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "wmv", "m4v", "webm"];

/// Returns true if the filename already carries a parenthesized 4-digit year.
///
/// Files that match are left untouched by a rename batch.
pub fn has_year(name: &str) -> bool {
    RE_YEAR.is_match(name)
}

/// Recovers a title from a filename.
///
/// The extension is always stripped. With `remove_junk` set, known quality
/// tokens are removed anywhere in the name (case-insensitive), runs of dots
/// and underscores become a single space, repeated whitespace is collapsed,
/// and the result is trimmed.
///
/// A bare year token such as `2019` is not junk and survives cleanup.
pub fn clean_title(name: &str, remove_junk: bool) -> String {
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let stem = stem.trim();

    if !remove_junk {
        return stem.to_string();
    }

    let without_junk = RE_JUNK.replace_all(stem, "");
    let spaced = RE_SEPARATORS.replace_all(without_junk.trim(), " ");
    let collapsed = RE_WHITESPACE.replace_all(&spaced, " ");
    collapsed.trim().to_string()
}

/// The set of file extensions treated as movies.
///
/// Extensions are stored lowercase without a leading dot, so lookups are
/// case-insensitive.
#[derive(Debug, Clone)]
pub struct VideoExtensions {
    extensions: HashSet<String>,
}

impl VideoExtensions {
    /// Builds a set from configured extensions, tolerating leading dots and
    /// mixed case (`".MKV"` and `"mkv"` are the same entry).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    /// Returns true if the path has one of the recognized extensions.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.extensions.contains(&ext.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for VideoExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_VIDEO_EXTENSIONS)
    }
}
