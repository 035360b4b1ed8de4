// src/api/types.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::types::DayBucket;
use crate::preferences::ReminderPreference;
use crate::storage::store::PatternRow;

/// A goal's effective preference, as listed for a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalPreferenceView {
    pub goal_id: String,
    pub goal_title: String,
    pub preference: ReminderPreference,
}

/// Preference plus the inferred pattern behind smart timing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalPreferenceDetail {
    pub goal_title: String,
    pub preference: ReminderPreference,
    pub pattern: Option<PatternSummary>,
}

/// One stored bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSummary {
    /// `general` or a lowercase weekday such as `mon`.
    pub bucket: String,
    pub typical_hour_start: u8,
    pub typical_hour_end: u8,
    pub confidence_score: f64,
    pub sample_size: u32,
    pub last_calculated_at: DateTime<Utc>,
}

/// The general bucket plus whatever weekday buckets qualified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSummary {
    pub general: Option<BucketSummary>,
    pub weekdays: Vec<BucketSummary>,
}

impl PatternSummary {
    /// `None` when no bucket is stored.
    pub fn from_rows(rows: &[PatternRow]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let general = rows
            .iter()
            .find(|r| r.bucket == DayBucket::General)
            .map(BucketSummary::from);
        let weekdays = rows
            .iter()
            .filter(|r| r.bucket != DayBucket::General)
            .map(BucketSummary::from)
            .collect();
        Some(Self { general, weekdays })
    }
}

impl From<&PatternRow> for BucketSummary {
    fn from(row: &PatternRow) -> Self {
        Self {
            bucket: row.bucket.label(),
            typical_hour_start: row.typical_hour_start,
            typical_hour_end: row.typical_hour_end,
            confidence_score: row.confidence_score,
            sample_size: row.sample_size,
            last_calculated_at: row.last_calculated_at,
        }
    }
}
