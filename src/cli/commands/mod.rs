//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `import`: pull a year of Last.fm history into the database
//! - `charts`: print weekly and yearly charts

mod charts;
mod import;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::db;

pub use charts::{cmd_weekly, cmd_yearly};
pub use import::cmd_import;

/// Scrobble Charts CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database file (default: from config, else scrobble_charts.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file (default: the OS config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Import a year of listening history from Last.fm
    Import {
        /// ISO year to import
        #[arg(short, long)]
        year: i32,
        /// Last.fm user name (default: from config)
        #[arg(short, long)]
        user: Option<String>,
        /// Last.fm API key (or set LASTFM_API_KEY env var)
        #[arg(short, long, env = "LASTFM_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Scrobbles per request (1-200)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=200))]
        page_size: Option<u32>,
    },
    /// Show the top tracks of one ISO week
    Weekly {
        /// ISO year
        #[arg(short, long)]
        year: i32,
        /// ISO week number (1-53)
        #[arg(short, long)]
        week: u32,
        /// Last.fm user name (default: from config)
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Show the top tracks of one ISO year by weekly chart points
    Yearly {
        /// ISO year
        #[arg(short, long)]
        year: i32,
        /// Last.fm user name (default: from config)
        #[arg(short, long)]
        user: Option<String>,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let db_path = cli.db.as_deref().or(config.database.path.as_deref());
    let rt = Runtime::new()?;

    match &cli.command {
        Commands::Import {
            year,
            user,
            api_key,
            page_size,
        } => {
            let user = resolve_user(user.as_deref(), &config)?;
            let api_key = api_key
                .as_deref()
                .or(config.credentials.lastfm_api_key.as_deref())
                .filter(|key| !key.trim().is_empty())
                .context(
                    "No Last.fm API key: pass --api-key, set LASTFM_API_KEY or add it to the config file",
                )?;
            cmd_import(&rt, &config, db_path, &user, *year, api_key, *page_size)
        }
        Commands::Weekly { year, week, user } => {
            let user = resolve_user(user.as_deref(), &config)?;
            cmd_weekly(&rt, db_path, &user, *year, *week)
        }
        Commands::Yearly { year, user } => {
            let user = resolve_user(user.as_deref(), &config)?;
            cmd_yearly(&rt, db_path, &user, *year)
        }
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// An explicit config file must load; the default one falls back to defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Ok(config::load_from(path)?),
        None => Ok(config::load()),
    }
}

fn resolve_user(arg: Option<&str>, config: &Config) -> anyhow::Result<String> {
    arg.or(config.lastfm.user.as_deref())
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .map(str::to_string)
        .context("No user given: pass --user or set lastfm.user in the config file")
}

/// Open (and migrate) the database.
pub(crate) async fn open_db(path: Option<&Path>) -> anyhow::Result<SqlitePool> {
    let url = db::db_url(path);
    db::init_db(&url)
        .await
        .with_context(|| format!("Failed to open database {url}"))
}

/// Cut `text` to at most `width` characters for column output.
pub(crate) fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
