// src/scheduler/sweep.rs — Periodic decision sweep over (user, goal) pairs

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::clock::{minute_of_day, parse_timezone, period_bounds, to_local};
use crate::core::types::{ReminderMode, Tier};
use crate::infra::config::Config;
use crate::infra::errors::{ReminderError, Result};
use crate::patterns::{resolve_window, ResolvedWindow, WindowSource};
use crate::preferences::{PreferenceResolver, ReminderPreference};
use crate::scheduler::copy::suggested_copy;
use crate::scheduler::dispatch::{DispatchIntent, Dispatcher};
use crate::scheduler::state::{day_state, DayFacts, DayState};
use crate::scheduler::tiers::{format_minute, plan_day, DayPlan};
use crate::storage::store::{ActivePairRow, ReminderRow, Store};

/// A slice of users for one sweep worker: users whose stable hash modulo
/// `total` equals `index`. Always holds `index < total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shard {
    index: u32,
    total: u32,
}

impl Shard {
    pub fn new(index: u32, total: u32) -> anyhow::Result<Self> {
        if total == 0 || index >= total {
            anyhow::bail!("shard index must be below shard count, got {index}/{total}");
        }
        Ok(Self { index, total })
    }

    /// Parse `i/n`, e.g. `0/4`.
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let (index, total) = s
            .split_once('/')
            .ok_or_else(|| anyhow::anyhow!("shard must look like i/n, got '{s}'"))?;
        Self::new(index.trim().parse()?, total.trim().parse()?)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        let digest = Sha256::digest(user_id.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head) % self.total as u64 == self.index as u64
    }
}

impl std::fmt::Display for Shard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.index, self.total)
    }
}

/// Why a pair was not evaluated at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Disabled,
    UnknownTimezone,
}

/// What the sweep did for one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SweepOutcome {
    Skipped { reason: SkipReason },
    NotDue,
    Deferred { tier: Tier },
    AlreadySent,
    AlreadyLogged,
    Elapsed,
    /// Another sweep recorded today's reminder first.
    LostRace,
    Sent { tier: Tier, delivered: bool },
}

/// Counts per outcome for one sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub considered: usize,
    pub sent: usize,
    pub delivery_failures: usize,
    pub lost_races: usize,
    pub deferred: usize,
    pub not_due: usize,
    pub already_sent: usize,
    pub already_logged: usize,
    pub elapsed: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl SweepReport {
    fn record(&mut self, outcome: &SweepOutcome) {
        match outcome {
            SweepOutcome::Skipped { .. } => self.skipped += 1,
            SweepOutcome::NotDue => self.not_due += 1,
            SweepOutcome::Deferred { .. } => self.deferred += 1,
            SweepOutcome::AlreadySent => self.already_sent += 1,
            SweepOutcome::AlreadyLogged => self.already_logged += 1,
            SweepOutcome::Elapsed => self.elapsed += 1,
            SweepOutcome::LostRace => self.lost_races += 1,
            SweepOutcome::Sent { delivered, .. } => {
                self.sent += 1;
                if !delivered {
                    self.delivery_failures += 1;
                }
            }
        }
    }
}

/// The read-only evaluation of one pair at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct PairDecision {
    pub user_id: String,
    pub goal_id: String,
    pub timezone: String,
    pub local_date: NaiveDate,
    pub local_time: String,
    pub preference: ReminderPreference,
    pub logged_this_period: bool,
    pub plan: Option<DayPlan>,
    pub state: DayState,
}

#[derive(Serialize)]
struct SocialContext<'a> {
    group_name: Option<&'a str>,
    window_source: WindowSource,
}

/// Decides, per (user, goal), whether a reminder goes out right now.
pub struct ReminderScheduler<'a> {
    store: &'a Store,
    dispatcher: &'a dyn Dispatcher,
    config: &'a Config,
}

impl<'a> ReminderScheduler<'a> {
    pub fn new(store: &'a Store, dispatcher: &'a dyn Dispatcher, config: &'a Config) -> Self {
        Self {
            store,
            dispatcher,
            config,
        }
    }

    /// Evaluate every active pair (optionally one shard of users) at `now`.
    pub async fn run(&self, now: DateTime<Utc>, shard: Option<Shard>) -> Result<SweepReport> {
        let pairs = self.store.query_active_pairs()?;
        let mut report = SweepReport::default();

        for pair in pairs
            .iter()
            .filter(|p| shard.map_or(true, |s| s.contains(&p.user_id)))
        {
            report.considered += 1;
            match self.process_pair(pair, now).await {
                Ok(outcome) => report.record(&outcome),
                Err(e) => {
                    error!(
                        user_id = %pair.user_id,
                        goal_id = %pair.goal_id,
                        "Sweep failed for pair: {}",
                        e
                    );
                    report.errors += 1;
                }
            }
        }

        info!(
            shard = %shard.map_or_else(|| "all".to_string(), |s| s.to_string()),
            considered = report.considered,
            sent = report.sent,
            deferred = report.deferred,
            lost_races = report.lost_races,
            errors = report.errors,
            "Reminder sweep complete"
        );
        Ok(report)
    }

    /// Decide and, if a tier is due, record and dispatch it.
    pub async fn process_pair(&self, pair: &ActivePairRow, now: DateTime<Utc>) -> Result<SweepOutcome> {
        let tz = match parse_timezone(&pair.timezone) {
            Ok(tz) => tz,
            Err(e) => {
                warn!(user_id = %pair.user_id, "Skipping pair: {}", e);
                return Ok(SweepOutcome::Skipped {
                    reason: SkipReason::UnknownTimezone,
                });
            }
        };

        let decision = self.decide(pair, tz, now)?;
        let outcome = match decision.state {
            DayState::Eligible { tier } => return self.send(pair, &decision, tier, now).await,
            DayState::Deferred { tier } => SweepOutcome::Deferred { tier },
            DayState::NotDue => SweepOutcome::NotDue,
            DayState::Sent { .. } | DayState::Evaluated { .. } => SweepOutcome::AlreadySent,
            DayState::DayElapsedWithoutEligibility if !decision.preference.is_active() => {
                SweepOutcome::Skipped {
                    reason: SkipReason::Disabled,
                }
            }
            DayState::DayElapsedWithoutEligibility if decision.logged_this_period => {
                SweepOutcome::AlreadyLogged
            }
            DayState::DayElapsedWithoutEligibility => SweepOutcome::Elapsed,
        };

        debug!(
            user_id = %pair.user_id,
            goal_id = %pair.goal_id,
            state = decision.state.label(),
            "No reminder sent"
        );
        Ok(outcome)
    }

    /// Compute a pair's state without side effects.
    pub fn decide(&self, pair: &ActivePairRow, tz: Tz, now: DateTime<Utc>) -> Result<PairDecision> {
        let local = to_local(now, tz);
        let today = local.date_naive();
        let minute = minute_of_day(local.time());

        let preference = PreferenceResolver::new(self.store).resolve(&pair.user_id, &pair.goal_id)?;
        let existing = self
            .store
            .reminder_for_day(&pair.user_id, &pair.goal_id, today)?;

        let (start, end) = period_bounds(pair.cadence, today);
        let logged_this_period = existing.is_none()
            && self
                .store
                .has_progress_between(&pair.user_id, &pair.goal_id, start, end)?;

        let plan = if preference.is_active() && existing.is_none() && !logged_this_period {
            Some(plan_day(
                self.window_for(pair, &preference, local.date_naive())?,
                &preference,
                &self.config.scheduler,
            ))
        } else {
            None
        };

        let state = day_state(&DayFacts {
            existing: existing.as_ref(),
            active: preference.is_active(),
            logged_this_period,
            plan: plan.as_ref(),
            quiet_hours: preference.quiet_hours,
            minute,
        });

        Ok(PairDecision {
            user_id: pair.user_id.clone(),
            goal_id: pair.goal_id.clone(),
            timezone: pair.timezone.clone(),
            local_date: today,
            local_time: format_minute(minute),
            preference,
            logged_this_period,
            plan,
            state,
        })
    }

    /// Fixed mode uses its hour; smart mode the inferred pattern.
    fn window_for(
        &self,
        pair: &ActivePairRow,
        preference: &ReminderPreference,
        day: NaiveDate,
    ) -> Result<ResolvedWindow> {
        use chrono::Datelike;

        match (preference.mode, preference.fixed_hour) {
            (ReminderMode::Fixed, Some(hour)) => Ok(ResolvedWindow::fixed(hour)),
            (ReminderMode::Fixed, None) => {
                warn!(
                    user_id = %pair.user_id,
                    goal_id = %pair.goal_id,
                    "Fixed mode without fixed_hour; using default window"
                );
                Ok(ResolvedWindow::default_window(&self.config.scheduler))
            }
            _ => Ok(resolve_window(
                self.store,
                &pair.user_id,
                &pair.goal_id,
                day.weekday(),
                &self.config.patterns,
                &self.config.scheduler,
            )?),
        }
    }

    async fn send(
        &self,
        pair: &ActivePairRow,
        decision: &PairDecision,
        tier: Tier,
        now: DateTime<Utc>,
    ) -> Result<SweepOutcome> {
        let window_source = decision
            .plan
            .as_ref()
            .map(|p| p.window.source)
            .unwrap_or(WindowSource::Default);
        let social_context = serde_json::to_string(&SocialContext {
            group_name: pair.group_name.as_deref(),
            window_source,
        })
        .map_err(anyhow::Error::from)?;

        let reminder = ReminderRow {
            id: Uuid::new_v4().to_string(),
            user_id: pair.user_id.clone(),
            goal_id: pair.goal_id.clone(),
            tier,
            sent_at: now,
            sent_at_local_date: decision.local_date,
            was_effective: None,
            user_timezone: pair.timezone.clone(),
            social_context: Some(social_context),
        };

        if !self.store.try_insert_reminder(&reminder)? {
            debug!(
                user_id = %pair.user_id,
                goal_id = %pair.goal_id,
                "Reminder already recorded for today by another sweep"
            );
            return Ok(SweepOutcome::LostRace);
        }

        let intent = DispatchIntent {
            reminder_id: reminder.id.clone(),
            user_id: pair.user_id.clone(),
            goal_id: pair.goal_id.clone(),
            goal_title: pair.goal_title.clone(),
            tier,
            local_date: decision.local_date,
            local_time: decision.local_time.clone(),
            timezone: pair.timezone.clone(),
            social_context: reminder.social_context.clone(),
            copy: suggested_copy(
                tier,
                &pair.goal_title,
                pair.group_name.as_deref(),
                decision.local_date,
            ),
        };

        let delivered = match self.dispatcher.dispatch(&intent).await {
            Ok(()) => true,
            Err(e) => {
                let failure = ReminderError::DeliveryFailure {
                    user_id: pair.user_id.clone(),
                    goal_id: pair.goal_id.clone(),
                    message: e.to_string(),
                };
                warn!("{}", failure);
                false
            }
        };

        info!(
            user_id = %pair.user_id,
            goal_id = %pair.goal_id,
            tier = tier.as_str(),
            local_time = %decision.local_time,
            delivered,
            "Reminder sent"
        );
        Ok(SweepOutcome::Sent { tier, delivered })
    }

    /// Evaluate a single (user, goal) by id, for inspection.
    pub fn inspect(&self, user_id: &str, goal_id: &str, now: DateTime<Utc>) -> Result<PairDecision> {
        let goal = self
            .store
            .get_goal(goal_id)?
            .ok_or_else(|| ReminderError::GoalNotFound {
                goal_id: goal_id.to_string(),
            })?;
        let timezone = self
            .store
            .user_timezone(user_id)?
            .ok_or_else(|| ReminderError::UserNotFound {
                user_id: user_id.to_string(),
            })?;
        let tz = parse_timezone(&timezone)?;

        let pair = ActivePairRow {
            user_id: user_id.to_string(),
            goal_id: goal.id,
            goal_title: goal.title,
            cadence: goal.cadence,
            group_name: goal.group_name,
            timezone,
        };
        self.decide(&pair, tz, now)
    }
}
