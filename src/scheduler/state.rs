// src/scheduler/state.rs — Per-day reminder state machine
//
// NotDue -> Eligible(tier) -> Sent(tier) -> Evaluated
// with Deferred(tier) while quiet hours hold an eligible tier back, and
// DayElapsedWithoutEligibility when the user logged first, reminders are
// off, or no tier remains today.

use serde::Serialize;

use crate::core::types::Tier;
use crate::preferences::QuietHours;
use crate::scheduler::tiers::DayPlan;
use crate::storage::store::ReminderRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DayState {
    NotDue,
    Eligible { tier: Tier },
    Deferred { tier: Tier },
    Sent { tier: Tier },
    Evaluated { tier: Tier, effective: bool },
    DayElapsedWithoutEligibility,
}

impl DayState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotDue => "not_due",
            Self::Eligible { .. } => "eligible",
            Self::Deferred { .. } => "deferred",
            Self::Sent { .. } => "sent",
            Self::Evaluated { .. } => "evaluated",
            Self::DayElapsedWithoutEligibility => "day_elapsed_without_eligibility",
        }
    }
}

/// Everything known about a (user, goal, local day) at evaluation time.
#[derive(Debug, Clone, Copy)]
pub struct DayFacts<'a> {
    pub existing: Option<&'a ReminderRow>,
    pub active: bool,
    pub logged_this_period: bool,
    pub plan: Option<&'a DayPlan>,
    pub quiet_hours: Option<QuietHours>,
    /// Minutes since local midnight.
    pub minute: u32,
}

pub fn day_state(facts: &DayFacts<'_>) -> DayState {
    if let Some(reminder) = facts.existing {
        return match reminder.was_effective {
            Some(effective) => DayState::Evaluated {
                tier: reminder.tier,
                effective,
            },
            None => DayState::Sent {
                tier: reminder.tier,
            },
        };
    }

    if !facts.active || facts.logged_this_period {
        return DayState::DayElapsedWithoutEligibility;
    }

    let Some(plan) = facts.plan else {
        return DayState::DayElapsedWithoutEligibility;
    };

    match plan.eligible_tier(facts.minute) {
        Some(tier) if facts.quiet_hours.is_some_and(|q| q.contains(facts.minute)) => {
            DayState::Deferred { tier }
        }
        Some(tier) => DayState::Eligible { tier },
        None if plan.next_after(facts.minute).is_some() => DayState::NotDue,
        None => DayState::DayElapsedWithoutEligibility,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Aggressiveness;
    use crate::infra::config::SchedulerConfig;
    use crate::patterns::ResolvedWindow;
    use crate::preferences::ReminderPreference;
    use crate::scheduler::tiers::plan_day;
    use chrono::{NaiveDate, Utc};

    fn plan_with(quiet: Option<QuietHours>, aggressiveness: Aggressiveness) -> DayPlan {
        let mut pref = ReminderPreference::defaults("u", "g");
        pref.quiet_hours = quiet;
        pref.aggressiveness = aggressiveness;
        plan_day(ResolvedWindow::fixed(8), &pref, &SchedulerConfig::default())
    }

    fn facts<'a>(plan: &'a DayPlan, minute: u32) -> DayFacts<'a> {
        DayFacts {
            existing: None,
            active: true,
            logged_this_period: false,
            plan: Some(plan),
            quiet_hours: None,
            minute,
        }
    }

    fn reminder(was_effective: Option<bool>) -> ReminderRow {
        ReminderRow {
            id: "r".into(),
            user_id: "u".into(),
            goal_id: "g".into(),
            tier: Tier::Supportive,
            sent_at: Utc::now(),
            sent_at_local_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            was_effective,
            user_timezone: "UTC".into(),
            social_context: None,
        }
    }

    #[test]
    fn test_progression_through_day() {
        let plan = plan_with(None, Aggressiveness::Balanced);
        assert_eq!(day_state(&facts(&plan, 7 * 60)), DayState::NotDue);
        assert_eq!(
            day_state(&facts(&plan, 8 * 60)),
            DayState::Eligible { tier: Tier::Gentle }
        );
        assert_eq!(
            day_state(&facts(&plan, 23 * 60)),
            DayState::Eligible {
                tier: Tier::LastChance
            }
        );
    }

    #[test]
    fn test_existing_row_wins() {
        let plan = plan_with(None, Aggressiveness::Balanced);
        let sent = reminder(None);
        let mut f = facts(&plan, 12 * 60);
        f.existing = Some(&sent);
        assert_eq!(
            day_state(&f),
            DayState::Sent {
                tier: Tier::Supportive
            }
        );

        let evaluated = reminder(Some(false));
        f.existing = Some(&evaluated);
        assert_eq!(
            day_state(&f),
            DayState::Evaluated {
                tier: Tier::Supportive,
                effective: false
            }
        );
    }

    #[test]
    fn test_logged_or_inactive_elapses_day() {
        let plan = plan_with(None, Aggressiveness::Balanced);
        let mut f = facts(&plan, 12 * 60);
        f.logged_this_period = true;
        assert_eq!(day_state(&f), DayState::DayElapsedWithoutEligibility);

        let mut f = facts(&plan, 12 * 60);
        f.active = false;
        assert_eq!(day_state(&f), DayState::DayElapsedWithoutEligibility);
    }

    #[test]
    fn test_quiet_hours_defer() {
        let quiet = QuietHours { start: 9, end: 12 };
        let plan = plan_with(Some(quiet), Aggressiveness::Balanced);
        let mut f = facts(&plan, 10 * 60);
        f.quiet_hours = Some(quiet);
        // Gentle fired at 08:00 naturally and is still owed, but 10:00 is quiet.
        assert_eq!(day_state(&f), DayState::Deferred { tier: Tier::Gentle });

        f.minute = 12 * 60;
        assert_eq!(
            day_state(&f),
            DayState::Eligible {
                tier: Tier::Supportive
            }
        );
    }
}
