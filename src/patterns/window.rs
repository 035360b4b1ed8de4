// src/patterns/window.rs — Resolve today's logging window with fallbacks

use chrono::Weekday;
use serde::Serialize;

use crate::core::types::{DayBucket, HourWindow};
use crate::infra::config::{PatternsConfig, SchedulerConfig};
use crate::storage::store::{PatternRow, Store};

/// Where a resolved window came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSource {
    Weekday,
    General,
    Default,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedWindow {
    pub window: HourWindow,
    pub source: WindowSource,
    pub confidence: Option<f64>,
}

impl ResolvedWindow {
    pub fn fixed(hour: u8) -> Self {
        Self {
            window: HourWindow::point(hour),
            source: WindowSource::Fixed,
            confidence: None,
        }
    }

    pub fn default_window(config: &SchedulerConfig) -> Self {
        Self {
            window: HourWindow::new(config.default_window_start, config.default_window_end),
            source: WindowSource::Default,
            confidence: None,
        }
    }
}

/// Pick the first reliable candidate: the weekday bucket, then the general
/// bucket, then the configured default window.
pub fn choose_window(
    weekday: Option<&PatternRow>,
    general: Option<&PatternRow>,
    patterns: &PatternsConfig,
    scheduler: &SchedulerConfig,
) -> ResolvedWindow {
    let reliable = |p: &&PatternRow| p.confidence_score >= patterns.reliable_confidence;

    if let Some(p) = weekday.filter(reliable) {
        return from_pattern(p, WindowSource::Weekday);
    }
    if let Some(p) = general.filter(reliable) {
        return from_pattern(p, WindowSource::General);
    }
    ResolvedWindow::default_window(scheduler)
}

/// Look up the stored buckets for `day` and apply [`choose_window`].
pub fn resolve_window(
    store: &Store,
    user_id: &str,
    goal_id: &str,
    day: Weekday,
    patterns: &PatternsConfig,
    scheduler: &SchedulerConfig,
) -> anyhow::Result<ResolvedWindow> {
    let weekday = store.query_pattern(user_id, goal_id, DayBucket::Weekday(day))?;
    let general = store.query_pattern(user_id, goal_id, DayBucket::General)?;
    Ok(choose_window(
        weekday.as_ref(),
        general.as_ref(),
        patterns,
        scheduler,
    ))
}

fn from_pattern(p: &PatternRow, source: WindowSource) -> ResolvedWindow {
    ResolvedWindow {
        window: HourWindow::new(p.typical_hour_start, p.typical_hour_end),
        source,
        confidence: Some(p.confidence_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pattern(bucket: DayBucket, start: u8, end: u8, confidence: f64) -> PatternRow {
        PatternRow {
            user_id: "u".into(),
            goal_id: "g".into(),
            bucket,
            typical_hour_start: start,
            typical_hour_end: end,
            confidence_score: confidence,
            sample_size: 10,
            last_calculated_at: Utc::now(),
        }
    }

    #[test]
    fn test_prefers_reliable_weekday() {
        let weekday = pattern(DayBucket::Weekday(Weekday::Sat), 10, 11, 0.6);
        let general = pattern(DayBucket::General, 7, 8, 0.9);
        let resolved = choose_window(
            Some(&weekday),
            Some(&general),
            &PatternsConfig::default(),
            &SchedulerConfig::default(),
        );
        assert_eq!(resolved.source, WindowSource::Weekday);
        assert_eq!(resolved.window, HourWindow::new(10, 11));
    }

    #[test]
    fn test_unreliable_weekday_falls_back_to_general() {
        let weekday = pattern(DayBucket::Weekday(Weekday::Sat), 10, 11, 0.29);
        let general = pattern(DayBucket::General, 7, 8, 0.5);
        let resolved = choose_window(
            Some(&weekday),
            Some(&general),
            &PatternsConfig::default(),
            &SchedulerConfig::default(),
        );
        assert_eq!(resolved.source, WindowSource::General);
        assert_eq!(resolved.confidence, Some(0.5));
    }

    #[test]
    fn test_nothing_reliable_uses_default() {
        let general = pattern(DayBucket::General, 7, 8, 0.1);
        let resolved = choose_window(
            None,
            Some(&general),
            &PatternsConfig::default(),
            &SchedulerConfig::default(),
        );
        assert_eq!(resolved.source, WindowSource::Default);
        assert_eq!(resolved.window, HourWindow::new(18, 21));

        let empty = choose_window(
            None,
            None,
            &PatternsConfig::default(),
            &SchedulerConfig::default(),
        );
        assert_eq!(empty.source, WindowSource::Default);
    }
}
