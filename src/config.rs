//! Configuration loading and file exclusion rules.
//!
//! Settings are read from a TOML file. Every key is optional; anything left
//! out falls back to the built-in default.
//!
//! # Configuration File Format
//!
//! ```toml
//! root = "/Movies"
//! log_file = "rename_log.txt"
//! api_delay_ms = 250
//! extensions = ["mp4", "mkv", "avi", "mov", "wmv", "m4v", "webm"]
//!
//! [tmdb]
//! api_key = "your-key"
//! base_url = "https://api.themoviedb.org/3"
//! timeout_secs = 10
//!
//! [filters]
//! exclude_patterns = ["**/Extras/**"]
//! exclude_regex = ["(?i)sample"]
//! ```

use crate::batch_log::DEFAULT_LOG_FILE;
use crate::classifier::{DEFAULT_VIDEO_EXTENSIONS, VideoExtensions};
use crate::metadata::{DEFAULT_API_DELAY, TMDB_BASE_URL};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = ".movie-year.toml";

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

/// Placeholder value shipped in sample configs; treated as unset.
pub const API_KEY_PLACEHOLDER: &str = "PASTE_YOUR_TMDB_API_KEY_HERE";

/// Errors that can occur during configuration loading and filtering.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// A TMDb credential. There is no shared credential state; the value is
/// resolved once and handed to whoever builds the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKey {
    Unset,
    Set(String),
}

impl ApiKey {
    /// Normalizes a raw value: blank strings and the placeholder are unset.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some(API_KEY_PLACEHOLDER) => ApiKey::Unset,
            Some(key) => ApiKey::Set(key.to_string()),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, ApiKey::Set(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ApiKey::Set(key) => Some(key),
            ApiKey::Unset => None,
        }
    }

    /// Returns `self` if set, otherwise `other`.
    pub fn or(self, other: ApiKey) -> ApiKey {
        if self.is_set() { self } else { other }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Movie library root to scan.
    pub root: PathBuf,
    /// Where the batch log is written.
    pub log_file: PathBuf,
    /// Minimum delay between metadata lookups, in milliseconds.
    pub api_delay_ms: u64,
    /// Recognized video extensions.
    pub extensions: Vec<String>,
    pub tmdb: TmdbConfig,
    pub filters: FilterRules,
}

/// TMDb connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Rules for leaving files out of a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Glob patterns matched against the full path (e.g. `"**/Extras/**"`).
    pub exclude_patterns: Vec<String>,
    /// Regex patterns matched against the file name.
    pub exclude_regex: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            api_delay_ms: DEFAULT_API_DELAY.as_millis() as u64,
            extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            tmdb: TmdbConfig::default(),
            filters: FilterRules::default(),
        }
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: TMDB_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.movie-year.toml` in the current directory
    /// 3. Look for `movie-year/config.toml` in the user config directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(user_config) = Self::user_config_path()
            && user_config.exists()
        {
            return Self::load_from_file(&user_config);
        }

        Ok(Self::default())
    }

    /// Path of the per-user configuration file, if a config directory exists.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("movie-year").join("config.toml"))
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// The credential, with the environment taking precedence over the file.
    pub fn api_key(&self) -> ApiKey {
        let from_env = ApiKey::from_raw(std::env::var(API_KEY_ENV).ok().as_deref());
        from_env.or(ApiKey::from_raw(self.tmdb.api_key.as_deref()))
    }

    pub fn api_delay(&self) -> Duration {
        Duration::from_millis(self.api_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.tmdb.timeout_secs)
    }

    pub fn video_extensions(&self) -> VideoExtensions {
        VideoExtensions::new(&self.extensions)
    }

    /// Compile the exclusion rules for matching.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Pre-compiled exclusion rules.
#[derive(Debug, Default)]
pub struct CompiledFilters {
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude_regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Check if a file should take part in a batch (not excluded).
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}
