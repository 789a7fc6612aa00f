use clap::{Parser, Subcommand};
use movie_year::cli::{Command, RenameOptions, connect, run_cli};
use movie_year::config::{ApiKey, Config};
use movie_year::menu::{Prompter, run_menu};
use movie_year::output::OutputFormatter;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "movie-year")]
#[command(about = "Add release years to movie filenames using TMDb", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Movie library root (overrides the configuration)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Print debug diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename movie files in the library
    Rename {
        /// Remove quality tokens (1080p, BluRay, x264, ...) from titles
        #[arg(long)]
        clean_junk: bool,

        /// Show what would be renamed without changing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Move movies into folders named after their TMDb collection
        #[arg(long)]
        sort_collections: bool,

        /// TMDb API key (overrides TMDB_API_KEY and the configuration)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Undo the last batch of renames
    Undo,

    /// Interactive menu (default)
    Menu,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::error(&format!("Error loading configuration: {}", e));
            return ExitCode::FAILURE;
        }
    };
    if let Some(root) = cli.root {
        config.root = root;
    }

    let result = match cli.command.unwrap_or(Commands::Menu) {
        Commands::Rename {
            clean_junk,
            dry_run,
            sort_collections,
            api_key,
        } => {
            let options = RenameOptions {
                clean_junk,
                dry_run,
                sort_by_collection: sort_collections,
            };
            let key = ApiKey::from_raw(api_key.as_deref()).or(config.api_key());
            let key = if key.is_set() {
                key
            } else {
                let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
                prompter.api_key().unwrap_or(ApiKey::Unset)
            };
            run_cli(Command::Rename(options), &config, key)
        }
        Commands::Undo => run_cli(Command::Undo, &config, ApiKey::Unset),
        Commands::Menu => {
            let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
            run_menu(&config, config.api_key(), &mut prompter, connect)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}
