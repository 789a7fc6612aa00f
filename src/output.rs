//! Output formatting and styling module.
//!
//! Provides a centralized interface for all user-facing output: colored
//! status lines, the scan spinner, and the end-of-batch summary table.
//! Diagnostics go through the `log` facade instead.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Dry-run notices
/// - A spinner for directory scanning
/// - Summary tables with counts
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use movie_year::output::OutputFormatter;
    /// OutputFormatter::success("Renamed: Heat.mkv → Heat (1995).mkv");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY-RUN] {}", message).yellow());
    }

    /// Creates a ticking spinner for work of unknown length.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use movie_year::output::OutputFormatter;
    /// let spinner = OutputFormatter::create_spinner("Scanning /Movies");
    /// spinner.finish_and_clear();
    /// ```
    pub fn create_spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("Invalid spinner template"),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// Prints a two-column summary table. Rows with a zero count are shown
    /// dimmed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use movie_year::output::OutputFormatter;
    /// OutputFormatter::summary_table("SUMMARY", &[("Renamed", 3), ("Year not found", 1)]);
    /// ```
    pub fn summary_table(title: &str, rows: &[(&str, usize)]) {
        Self::header(title);

        let width = rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0)
            .max(6);

        println!("{}", "-".repeat(width + 10));
        for (label, count) in rows {
            let count_text = count.to_string();
            let count_text = if *count == 0 {
                count_text.dimmed()
            } else {
                count_text.green()
            };
            println!(
                "{:<width$} | {} {}",
                label,
                count_text,
                file_word(*count),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));
    }
}

/// "file" or "files".
pub fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
