// src/preferences/mod.rs — Per-goal reminder settings

pub mod resolver;
pub mod update;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::types::{Aggressiveness, ReminderMode};
use crate::storage::store::PreferenceRow;

pub use resolver::PreferenceResolver;
pub use update::PreferenceUpdate;

/// Local-time window `[start, end)` in which nothing may be dispatched.
/// Wraps past midnight when `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuietHours {
    pub start: u8,
    pub end: u8,
}

impl QuietHours {
    /// Whether a minute-of-day falls inside the window.
    pub fn contains(&self, minute_of_day: u32) -> bool {
        let start = self.start as u32 * 60;
        let end = self.end as u32 * 60;
        if start < end {
            minute_of_day >= start && minute_of_day < end
        } else if start > end {
            minute_of_day >= start || minute_of_day < end
        } else {
            false
        }
    }

    pub fn end_minute(&self) -> u32 {
        self.end as u32 * 60
    }
}

/// Settings the scheduler acts on: the stored row, or defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderPreference {
    pub user_id: String,
    pub goal_id: String,
    pub enabled: bool,
    pub mode: ReminderMode,
    pub fixed_hour: Option<u8>,
    pub aggressiveness: Aggressiveness,
    pub quiet_hours: Option<QuietHours>,
    pub last_modified_at: Option<DateTime<Utc>>,
    /// False when these are system defaults with no stored row.
    pub persisted: bool,
}

impl ReminderPreference {
    pub fn defaults(user_id: &str, goal_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            goal_id: goal_id.to_string(),
            enabled: true,
            mode: ReminderMode::Smart,
            fixed_hour: None,
            aggressiveness: Aggressiveness::Balanced,
            quiet_hours: None,
            last_modified_at: None,
            persisted: false,
        }
    }

    /// Whether the scheduler should consider this goal at all.
    pub fn is_active(&self) -> bool {
        self.enabled && self.mode != ReminderMode::Disabled
    }

    pub fn to_row(&self, modified_at: DateTime<Utc>) -> PreferenceRow {
        PreferenceRow {
            user_id: self.user_id.clone(),
            goal_id: self.goal_id.clone(),
            enabled: self.enabled,
            mode: self.mode,
            fixed_hour: self.fixed_hour,
            aggressiveness: self.aggressiveness,
            quiet_hours_start: self.quiet_hours.map(|q| q.start),
            quiet_hours_end: self.quiet_hours.map(|q| q.end),
            last_modified_at: modified_at,
        }
    }
}

impl From<PreferenceRow> for ReminderPreference {
    fn from(row: PreferenceRow) -> Self {
        let quiet_hours = match (row.quiet_hours_start, row.quiet_hours_end) {
            (Some(start), Some(end)) if start != end => Some(QuietHours { start, end }),
            _ => None,
        };
        Self {
            user_id: row.user_id,
            goal_id: row.goal_id,
            enabled: row.enabled,
            mode: row.mode,
            fixed_hour: row.fixed_hour,
            aggressiveness: row.aggressiveness,
            quiet_hours,
            last_modified_at: Some(row.last_modified_at),
            persisted: true,
        }
    }
}
