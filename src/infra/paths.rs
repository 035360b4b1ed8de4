// src/infra/paths.rs — Config and data locations
//
// All paths respect the SMART_REMINDERS_HOME environment variable.
// When set, config and data live under that directory. When unset,
// config uses ~/.smart-reminders/ and data uses XDG_DATA_HOME/smart-reminders.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

const HOME_VAR: &str = "SMART_REMINDERS_HOME";

fn reminders_home() -> Option<PathBuf> {
    std::env::var_os(HOME_VAR).map(PathBuf::from)
}

fn home_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $SMART_REMINDERS_HOME/ or ~/.smart-reminders/
pub fn config_dir() -> PathBuf {
    if let Some(home) = reminders_home() {
        return home;
    }
    home_dir().join(".smart-reminders")
}

/// Data directory: $SMART_REMINDERS_HOME/data/ or the platform data dir.
pub fn data_dir() -> PathBuf {
    if let Some(home) = reminders_home() {
        return home.join("data");
    }
    ProjectDirs::from("", "", "smart-reminders")
        .map(|d| d.data_local_dir().to_path_buf())
        .unwrap_or_else(|| config_dir().join("data"))
}

pub fn db_path() -> PathBuf {
    data_dir().join("reminders.db")
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
