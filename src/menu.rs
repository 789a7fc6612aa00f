//! Interactive menu.
//!
//! The menu loop offers rename, undo and exit. Renaming asks for a TMDb key
//! when none is configured and then for the three batch options. All prompts
//! go through [`Prompter`], which reads from any `BufRead` and writes to any
//! `Write`.

use crate::cli::{RenameOptions, rename_movies, undo_last_batch};
use crate::config::{ApiKey, Config};
use crate::metadata::MetadataSource;
use crate::output::OutputFormatter;
use colored::*;
use std::io::{self, BufRead, Write};

/// Where users can get a TMDb key.
pub const TMDB_SIGNUP_URL: &str = "https://www.themoviedb.org/signup";

/// Line-oriented prompts over arbitrary input and output.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `message` and reads one trimmed line.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` when the input is exhausted, so callers never
    /// loop on a closed stdin.
    pub fn line(&mut self, message: &str) -> io::Result<String> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut input = String::new();
        if self.input.read_line(&mut input)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            ));
        }
        Ok(input.trim().to_string())
    }

    /// Asks a yes/no question until the answer is `y`, `yes`, `n` or `no`.
    pub fn yes_no(&mut self, message: &str) -> io::Result<bool> {
        loop {
            let answer = self.line(&format!("{} [y/n]: ", message))?.to_lowercase();
            match answer.as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please enter y or n.")?,
            }
        }
    }

    /// Asks for a TMDb key. An empty answer stays unset.
    pub fn api_key(&mut self) -> io::Result<ApiKey> {
        writeln!(self.output, "TMDb API key is not set.")?;
        writeln!(
            self.output,
            "Sign up for a free API key at: {}",
            TMDB_SIGNUP_URL
        )?;
        let key = self.line("Paste your TMDb API key here: ")?;
        Ok(ApiKey::from_raw(Some(&key)))
    }

    /// Asks the three batch questions.
    pub fn rename_options(&mut self) -> io::Result<RenameOptions> {
        let clean_junk = self.yes_no(
            "Do you want to clean junk (1080p, BluRay, x264, etc.) from filenames?",
        )?;
        let dry_run =
            self.yes_no("Do you want to run in dry-run mode (no files will be renamed)?")?;
        let sort_by_collection =
            self.yes_no("Do you want to sort movies into folders based on TMDb collections?")?;

        Ok(RenameOptions {
            clean_junk,
            dry_run,
            sort_by_collection,
        })
    }

    /// Shows the main menu and reads a choice, re-asking on invalid input.
    pub fn menu_choice(&mut self) -> io::Result<MenuChoice> {
        loop {
            writeln!(self.output, "\n{}", "=== Movie Year Renamer ===".bold())?;
            writeln!(self.output, "1. Rename movies")?;
            writeln!(self.output, "2. Undo last batch of renames")?;
            writeln!(self.output, "3. Exit")?;

            match self.line("Select an option [1-3]: ")?.as_str() {
                "1" => return Ok(MenuChoice::Rename),
                "2" => return Ok(MenuChoice::Undo),
                "3" => return Ok(MenuChoice::Exit),
                _ => writeln!(self.output, "Invalid choice. Please enter 1, 2, or 3.")?,
            }
        }
    }
}

/// A main-menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Rename,
    Undo,
    Exit,
}

/// Runs the interactive menu until the user exits or input ends.
///
/// `connect` builds a metadata source from a credential. Errors inside a
/// menu action are printed and the menu is shown again; a missing key
/// returns to the menu without scanning. The resolved key is kept for the
/// rest of the session.
pub fn run_menu<R, W, F>(
    config: &Config,
    mut api_key: ApiKey,
    prompter: &mut Prompter<R, W>,
    connect: F,
) -> Result<(), String>
where
    R: BufRead,
    W: Write,
    F: Fn(&Config, &ApiKey) -> Result<Box<dyn MetadataSource>, String>,
{
    loop {
        let choice = match prompter.menu_choice() {
            Ok(choice) => choice,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.to_string()),
        };

        let result = match choice {
            MenuChoice::Rename => rename_from_menu(config, &mut api_key, prompter, &connect),
            MenuChoice::Undo => undo_last_batch(config).map(|_| ()),
            MenuChoice::Exit => {
                OutputFormatter::plain("Exiting.");
                return Ok(());
            }
        };

        if let Err(e) = result {
            OutputFormatter::error(&e);
        }
    }
}

fn rename_from_menu<R, W, F>(
    config: &Config,
    api_key: &mut ApiKey,
    prompter: &mut Prompter<R, W>,
    connect: &F,
) -> Result<(), String>
where
    R: BufRead,
    W: Write,
    F: Fn(&Config, &ApiKey) -> Result<Box<dyn MetadataSource>, String>,
{
    if !api_key.is_set() {
        *api_key = prompter.api_key().map_err(|e| e.to_string())?;
        if !api_key.is_set() {
            return Err("No API key provided.".to_string());
        }
    }

    let options = prompter.rename_options().map_err(|e| e.to_string())?;
    let source = connect(config, api_key)?;

    OutputFormatter::plain("\nStarting scan...\n");
    rename_movies(config, &options, source.as_ref()).map(|_| ())
}
