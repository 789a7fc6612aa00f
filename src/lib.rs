//! movie-year - add release years to movie filenames
//!
//! This library scans a movie library, looks each untagged file up in TMDb,
//! renames it to `Title (Year).ext` (optionally moving it into a folder named
//! after its collection), and records every rename so the whole batch can be
//! undone.

pub mod batch_log;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod menu;
pub mod metadata;
pub mod output;
pub mod planner;
pub mod scanner;
pub mod undo;

pub use batch_log::{BatchLog, LogError, RenameRecord};
pub use classifier::{VideoExtensions, clean_title, has_year};
pub use config::{ApiKey, CompiledFilters, Config, ConfigError};
pub use metadata::{Metadata, MetadataSource, Resolution, Throttle, TmdbClient};
pub use planner::{Candidate, PlanAction, PlanOptions, RenameError, RenamePlan, apply, plan};
pub use undo::{UndoManager, UndoOutcome, UndoReport};

pub use cli::{BatchSummary, Command, RenameOptions, rename_movies, run_cli};
