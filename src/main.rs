//! # repolens CLI
//!
//! Ingests public GitHub repositories and analyzes their files with a
//! local model server, falling back to built-in heuristics when no model
//! is usable.
//!
//! ## Usage
//!
//! ```bash
//! repolens --config ./config/repolens.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `repolens init` | Create the SQLite database and run schema migrations |
//! | `repolens ingest <url>` | Fetch a repository and store its text files |
//! | `repolens preview <file-id>` | Print a numbered preview of a file |
//! | `repolens analyze <file-id>` | Analyze a file and store the result |
//! | `repolens search <repo-id> "<query>"` | Search a repository's files |
//! | `repolens related <file-id>` | List files related to a file |
//! | `repolens repos` | List ingested repositories |
//! | `repolens forget <repo-id>` | Delete a repository and its files |
//! | `repolens status` | Show configuration and model server status |
//! | `repolens serve` | Start the HTTP API |
//!
//! Logs go to stderr; set `RUST_LOG` (default `info`) to change verbosity.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use repolens::config::{self, Config};
use repolens::service::Service;
use repolens::{commands, migrate, server};

const DEFAULT_CONFIG: &str = "./config/repolens.toml";

/// repolens: repository ingestion and model-assisted code analysis.
#[derive(Parser)]
#[command(name = "repolens", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When omitted, `./config/repolens.toml` is used if it exists and
    /// built-in defaults otherwise.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Fetch a repository by URL and store its text files.
    ///
    /// Re-ingesting a repository replaces its previously stored files.
    Ingest {
        /// Repository URL, e.g. `https://github.com/owner/name`.
        url: String,
    },

    /// Print a numbered preview of a stored file.
    Preview {
        /// File id as printed by `ingest`.
        file_id: String,

        /// Number of lines to show (defaults to `[preview].default_lines`).
        #[arg(long)]
        lines: Option<usize>,
    },

    /// Analyze a stored file with the model cascade.
    Analyze {
        file_id: String,
    },

    /// Search every file of a repository.
    Search {
        repository_id: String,
        query: String,
    },

    /// Rank the files related to a stored file.
    Related {
        file_id: String,
    },

    /// List ingested repositories.
    Repos,

    /// Delete a repository together with its files and search history.
    Forget {
        repository_id: String,
    },

    /// Show configuration and model server status.
    Status,

    /// Start the HTTP API on `[server].bind`.
    Serve,
}

fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => config::load_config(p),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            config::load_config(Path::new(DEFAULT_CONFIG))
        }
        None => {
            let mut cfg = Config::minimal();
            cfg.resolve_token_from_env();
            Ok(cfg)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        command => {
            let service = Service::from_config(&cfg).await?;
            match command {
                Commands::Ingest { url } => commands::run_ingest(&service, &url).await?,
                Commands::Preview { file_id, lines } => {
                    commands::run_preview(&service, &file_id, lines).await?
                }
                Commands::Analyze { file_id } => commands::run_analyze(&service, &file_id).await?,
                Commands::Search {
                    repository_id,
                    query,
                } => commands::run_search(&service, &repository_id, &query).await?,
                Commands::Related { file_id } => commands::run_related(&service, &file_id).await?,
                Commands::Repos => commands::run_list_repositories(&service).await?,
                Commands::Forget { repository_id } => {
                    commands::run_forget(&service, &repository_id).await?
                }
                Commands::Status => commands::run_status(&service, &cfg).await?,
                Commands::Init | Commands::Serve => unreachable!("handled above"),
            }
        }
    }

    Ok(())
}
