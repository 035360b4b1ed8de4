// src/effectiveness/mod.rs — Post-hoc evaluation of sent reminders

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::clock::{local_date, parse_timezone};
use crate::infra::config::EffectivenessConfig;
use crate::infra::errors::Result;
use crate::storage::store::Store;

/// Marks each sent reminder effective or not once its local day is over.
pub struct EffectivenessTracker<'a> {
    store: &'a Store,
    config: &'a EffectivenessConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationReport {
    /// Unevaluated rows inspected.
    pub pending: usize,
    pub effective: usize,
    pub ineffective: usize,
    /// Rows whose local day has not ended yet.
    pub not_elapsed: usize,
    /// Rows left pending because their stored timezone no longer parses.
    pub unknown_timezone: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectivenessStats {
    pub user_id: String,
    pub goal_id: String,
    /// Evaluated reminders considered, newest first, capped by the window.
    pub evaluated: usize,
    pub effective: usize,
    pub rate: Option<f64>,
}

impl<'a> EffectivenessTracker<'a> {
    pub fn new(store: &'a Store, config: &'a EffectivenessConfig) -> Self {
        Self { store, config }
    }

    /// Evaluate every pending reminder whose local day has fully elapsed.
    /// Only NULL rows are touched, so re-running is harmless.
    pub fn evaluate(&self, now: DateTime<Utc>) -> Result<EvaluationReport> {
        let pending = self.store.query_unevaluated_reminders()?;
        let mut report = EvaluationReport {
            pending: pending.len(),
            ..Default::default()
        };

        for reminder in pending {
            let tz = match parse_timezone(&reminder.user_timezone) {
                Ok(tz) => tz,
                Err(e) => {
                    warn!(reminder_id = %reminder.id, "Leaving reminder pending: {}", e);
                    report.unknown_timezone += 1;
                    continue;
                }
            };

            if local_date(now, tz) <= reminder.sent_at_local_date {
                report.not_elapsed += 1;
                continue;
            }

            let effective = self.store.has_progress_between(
                &reminder.user_id,
                &reminder.goal_id,
                reminder.sent_at_local_date,
                reminder.sent_at_local_date,
            )?;

            if self
                .store
                .mark_reminder_effectiveness(&reminder.id, effective)?
            {
                if effective {
                    report.effective += 1;
                } else {
                    report.ineffective += 1;
                }
            } else {
                debug!(reminder_id = %reminder.id, "Reminder evaluated concurrently");
            }
        }

        info!(
            pending = report.pending,
            effective = report.effective,
            ineffective = report.ineffective,
            "Effectiveness evaluation complete"
        );
        Ok(report)
    }

    /// Effectiveness over the most recent evaluated reminders of a pair.
    pub fn summary(&self, user_id: &str, goal_id: &str) -> Result<EffectivenessStats> {
        let outcomes = self
            .store
            .query_recent_outcomes(user_id, goal_id, self.config.window)?;
        let effective = outcomes.iter().filter(|o| **o).count();
        let rate = (!outcomes.is_empty()).then(|| effective as f64 / outcomes.len() as f64);

        Ok(EffectivenessStats {
            user_id: user_id.to_string(),
            goal_id: goal_id.to_string(),
            evaluated: outcomes.len(),
            effective,
            rate,
        })
    }

    /// Pairs whose reminders keep missing: enough evaluated history and an
    /// effective rate below the threshold. Their patterns should be re-run.
    pub fn recalculation_candidates(&self) -> Result<Vec<EffectivenessStats>> {
        let mut candidates = Vec::new();
        for (user_id, goal_id) in self.store.query_evaluated_pairs()? {
            let stats = self.summary(&user_id, &goal_id)?;
            let below = stats
                .rate
                .is_some_and(|rate| rate < self.config.recalc_below_rate);
            if stats.evaluated as u32 >= self.config.min_evaluated && below {
                candidates.push(stats);
            }
        }
        Ok(candidates)
    }
}
