// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::errors::{ReminderError, Result};
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub patterns: PatternsConfig,

    #[serde(default)]
    pub effectiveness: EffectivenessConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub sweep_interval_minutes: u32,
    /// Window used when no reliable pattern exists.
    pub default_window_start: u8,
    pub default_window_end: u8,
    /// Local hour for `last_chance` when no quiet hours are set.
    pub last_chance_hour: u8,
    /// Gap between `gentle` and `supportive` at balanced aggressiveness.
    pub tier_gap_minutes: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_minutes: 60,
            default_window_start: 18,
            default_window_end: 21,
            last_chance_hour: 21,
            tier_gap_minutes: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternsConfig {
    pub min_samples: u32,
    /// Below this a bucket is unreliable and callers fall back.
    pub reliable_confidence: f64,
    pub lookback_days: u32,
    pub rescan_min_confidence: f64,
    pub stale_after_days: u32,
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            min_samples: 3,
            reliable_confidence: 0.3,
            lookback_days: 90,
            rescan_min_confidence: 0.3,
            stale_after_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectivenessConfig {
    /// Evaluated reminders required before a goal can signal recalculation.
    pub min_evaluated: u32,
    pub recalc_below_rate: f64,
    /// Most recent evaluated reminders considered.
    pub window: u32,
}

impl Default for EffectivenessConfig {
    fn default() -> Self {
        Self {
            min_evaluated: 5,
            recalc_below_rate: 0.3,
            window: 14,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// POST target for dispatch intents. Unset means log-only dispatch.
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ReminderError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject hour values the scheduler cannot place on a clock.
    pub fn validate(&self) -> Result<()> {
        let s = &self.scheduler;
        for (name, hour) in [
            ("default_window_start", s.default_window_start),
            ("default_window_end", s.default_window_end),
            ("last_chance_hour", s.last_chance_hour),
        ] {
            if hour > 23 {
                return Err(ReminderError::Config(format!(
                    "scheduler.{name} must be 0-23, got {hour}"
                )));
            }
        }
        if s.default_window_start > s.default_window_end {
            return Err(ReminderError::Config(
                "scheduler.default_window_start must not exceed default_window_end".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.patterns.reliable_confidence) {
            return Err(ReminderError::Config(
                "patterns.reliable_confidence must be within 0.0-1.0".into(),
            ));
        }
        Ok(())
    }

    /// Database location: config override, else the data directory default.
    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(paths::db_path)
    }
}
