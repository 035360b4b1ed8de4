// src/cli/mod.rs — CLI definition (clap derive)

pub mod migrate;
pub mod patterns;
pub mod prefs;
pub mod sweep;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::infra::config::Config;
use crate::storage::Database;

#[derive(Parser)]
#[command(
    name = "smart-reminders",
    about = "Decides when to nudge users about their goals",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path (overrides config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run pending database migrations or show their status
    Migrate {
        /// Show status without migrating
        #[arg(long)]
        status: bool,
        /// Undo the most recent migration
        #[arg(long, conflicts_with = "status")]
        rollback: bool,
    },
    /// Evaluate every active goal once and dispatch due reminders
    Sweep {
        /// Only handle users in this shard, e.g. 0/4
        #[arg(long)]
        shard: Option<String>,
    },
    /// Mark sent reminders from finished days as effective or not
    Evaluate,
    /// Recalculate one goal's logging pattern
    Recalc {
        user: String,
        goal: String,
        /// IANA timezone to use instead of the user's stored one
        #[arg(long)]
        tz: Option<String>,
    },
    /// Recalculate confident patterns that have gone stale
    Rescan,
    /// Inspect or change reminder preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Show today's tier schedule and day state for a goal
    Plan { user: String, goal: String },
    /// Sweep, evaluate and maintain patterns on an interval until Ctrl-C
    Daemon {
        #[arg(long)]
        shard: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum PrefsAction {
    /// Effective preferences for all of a user's goals
    List { user: String },
    /// Preference and inferred pattern for one goal
    Show { user: String, goal: String },
    /// Change one goal's preference
    Set {
        user: String,
        goal: String,
        /// smart, fixed or disabled
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        fixed_hour: Option<i64>,
        /// gentle, balanced or persistent
        #[arg(long)]
        aggressiveness: Option<String>,
        #[arg(long)]
        quiet_start: Option<i64>,
        #[arg(long)]
        quiet_end: Option<i64>,
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long)]
        clear_quiet: bool,
        #[arg(long)]
        clear_fixed_hour: bool,
    },
}

/// Load config from `--config` or the default location, then apply `--db`.
pub fn load_config(config: Option<&Path>, db: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = match config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(db) = db {
        config.database.path = Some(db.display().to_string());
    }
    Ok(config)
}

/// Open the configured database, running migrations.
pub fn open_database(config: &Config) -> anyhow::Result<Database> {
    let path = config.db_path();
    tracing::debug!("Opening database at {}", path.display());
    Database::open(&path)
}
