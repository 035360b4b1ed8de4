// src/patterns/inference.rs — Logging-time pattern inference

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::core::clock::{fractional_hour, parse_timezone, to_local};
use crate::core::types::DayBucket;
use crate::infra::config::PatternsConfig;
use crate::infra::errors::{ReminderError, Result};
use crate::patterns::stats::{summarize, BucketStats};
use crate::storage::store::{PatternRow, Store};

/// Recomputes stored logging patterns from a pair's progress history.
pub struct PatternInferenceEngine<'a> {
    store: &'a Store,
    config: &'a PatternsConfig,
}

/// Outcome of a background re-scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RescanReport {
    pub recalculated: usize,
    pub insufficient: usize,
    pub failed: usize,
}

/// Group log instants into the general bucket plus one bucket per local
/// weekday, and summarize every bucket holding at least `min_samples`.
pub fn infer_buckets(
    logs: &[DateTime<Utc>],
    tz: Tz,
    min_samples: u32,
) -> Vec<(DayBucket, BucketStats)> {
    let mut buckets: HashMap<DayBucket, Vec<f64>> = HashMap::new();
    for instant in logs {
        let local = to_local(*instant, tz);
        let hour = fractional_hour(local.time());
        buckets.entry(DayBucket::General).or_default().push(hour);
        buckets
            .entry(DayBucket::Weekday(local.weekday()))
            .or_default()
            .push(hour);
    }

    let mut result: Vec<(DayBucket, BucketStats)> = buckets
        .into_iter()
        .filter(|(_, hours)| hours.len() as u32 >= min_samples.max(1))
        .filter_map(|(bucket, hours)| summarize(&hours).map(|stats| (bucket, stats)))
        .collect();
    result.sort_by_key(|(bucket, _)| bucket.to_storage());
    result
}

impl<'a> PatternInferenceEngine<'a> {
    pub fn new(store: &'a Store, config: &'a PatternsConfig) -> Self {
        Self { store, config }
    }

    /// Read the pair's history inside the lookback window and recalculate.
    pub fn recalculate(
        &self,
        user_id: &str,
        goal_id: &str,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> Result<Vec<PatternRow>> {
        let since = now - Duration::days(self.config.lookback_days as i64);
        let logs = self.store.query_progress_since(user_id, goal_id, since)?;
        self.recalculate_from(user_id, goal_id, tz, &logs, now)
    }

    /// Recalculate from already-loaded log instants. The pair ends up with
    /// exactly one row per qualifying bucket; buckets that no longer reach
    /// `min_samples` are deleted.
    pub fn recalculate_from(
        &self,
        user_id: &str,
        goal_id: &str,
        tz: Tz,
        logs: &[DateTime<Utc>],
        now: DateTime<Utc>,
    ) -> Result<Vec<PatternRow>> {
        let buckets = infer_buckets(logs, tz, self.config.min_samples);
        if buckets.is_empty() {
            let removed = self.store.replace_patterns(user_id, goal_id, &[])?;
            debug!(
                user_id,
                goal_id,
                samples = logs.len(),
                removed,
                "No bucket reached the minimum sample size"
            );
            return Err(ReminderError::insufficient(user_id, goal_id));
        }

        let rows: Vec<PatternRow> = buckets
            .into_iter()
            .map(|(bucket, stats)| {
                debug!(
                    user_id,
                    goal_id,
                    bucket = ?bucket,
                    variance = stats.variance,
                    confidence = stats.confidence,
                    "Bucket summarized"
                );
                PatternRow {
                    user_id: user_id.to_string(),
                    goal_id: goal_id.to_string(),
                    bucket,
                    typical_hour_start: stats.hour_start,
                    typical_hour_end: stats.hour_end,
                    confidence_score: stats.confidence,
                    sample_size: stats.sample_size,
                    last_calculated_at: now,
                }
            })
            .collect();
        let removed = self.store.replace_patterns(user_id, goal_id, &rows)?;
        if removed > 0 {
            debug!(user_id, goal_id, removed, "Dropped buckets below the minimum sample size");
        }

        info!(
            user_id,
            goal_id,
            buckets = rows.len(),
            samples = logs.len(),
            "Recalculated logging pattern"
        );
        Ok(rows)
    }

    /// Recalculate every confident pattern whose last calculation is older
    /// than `stale_after_days`. A failure on one pair does not stop the scan.
    pub fn rescan_stale(&self, now: DateTime<Utc>) -> Result<RescanReport> {
        let before = now - Duration::days(self.config.stale_after_days as i64);
        let stale = self
            .store
            .query_stale_patterns(self.config.rescan_min_confidence, before)?;

        let mut report = RescanReport::default();
        for (user_id, goal_id) in stale {
            match self.recalculate_for_user(&user_id, &goal_id, now) {
                Ok(_) => report.recalculated += 1,
                Err(e) if e.is_fallback() => {
                    debug!(user_id = %user_id, goal_id = %goal_id, "Stale pattern skipped: {}", e);
                    report.insufficient += 1;
                }
                Err(e) => {
                    warn!(user_id = %user_id, goal_id = %goal_id, "Stale pattern rescan failed: {}", e);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    /// Recalculate using the user's stored timezone.
    pub fn recalculate_for_user(
        &self,
        user_id: &str,
        goal_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<PatternRow>> {
        let tz_name = self
            .store
            .user_timezone(user_id)?
            .ok_or_else(|| ReminderError::UserNotFound {
                user_id: user_id.to_string(),
            })?;
        let tz = parse_timezone(&tz_name)?;
        self.recalculate(user_id, goal_id, tz, now)
    }
}
