// src/scheduler/tiers.rs — When each tier becomes eligible on a local day

use serde::Serialize;

use crate::core::types::{Aggressiveness, Tier};
use crate::infra::config::SchedulerConfig;
use crate::patterns::ResolvedWindow;
use crate::preferences::{QuietHours, ReminderPreference};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// One tier's timing for the day, in minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierSlot {
    pub tier: Tier,
    /// Where the tier would fall ignoring quiet hours.
    pub natural_minute: u32,
    /// When it may actually be sent; `None` if it cannot fire today.
    pub send_minute: Option<u32>,
}

/// A goal's tier schedule for one local day. Tiers suppressed by
/// aggressiveness are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlan {
    pub window: ResolvedWindow,
    pub slots: Vec<TierSlot>,
}

impl DayPlan {
    /// Most advanced tier whose send time has passed at `minute`.
    pub fn eligible_tier(&self, minute: u32) -> Option<Tier> {
        self.slots
            .iter()
            .filter(|s| s.send_minute.is_some_and(|m| m <= minute))
            .map(|s| s.tier)
            .max()
    }

    /// Earliest tier still ahead of `minute`.
    pub fn next_after(&self, minute: u32) -> Option<&TierSlot> {
        self.slots
            .iter()
            .filter(|s| s.send_minute.is_some_and(|m| m > minute))
            .min_by_key(|s| s.send_minute)
    }

    pub fn slot(&self, tier: Tier) -> Option<&TierSlot> {
        self.slots.iter().find(|s| s.tier == tier)
    }
}

/// Natural local minute for `last_chance`: the configured hour, or an hour
/// before quiet hours begin when they would swallow it.
pub fn last_chance_minute(quiet: Option<QuietHours>, config: &SchedulerConfig) -> u32 {
    let configured = config.last_chance_hour.min(23) as u32 * 60;
    match quiet {
        Some(q) if q.contains(configured) => q
            .start
            .checked_sub(1)
            .map_or(configured, |hour| hour as u32 * 60),
        _ => configured,
    }
}

/// Gap between `gentle` and `supportive`.
pub fn tier_gap_minutes(aggressiveness: Aggressiveness, config: &SchedulerConfig) -> u32 {
    match aggressiveness {
        Aggressiveness::Persistent => config.tier_gap_minutes / 2,
        Aggressiveness::Gentle | Aggressiveness::Balanced => config.tier_gap_minutes,
    }
}

/// Shift a natural time out of quiet hours. A time whose quiet window only
/// ends on the next day cannot fire today.
fn defer_past_quiet(natural: u32, quiet: Option<QuietHours>) -> Option<u32> {
    if natural >= MINUTES_PER_DAY {
        return None;
    }
    match quiet {
        Some(q) if q.contains(natural) => {
            let end = q.end_minute();
            (end > natural).then_some(end)
        }
        _ => Some(natural),
    }
}

/// Build the tier schedule anchored at the end of `window`.
pub fn plan_day(
    window: ResolvedWindow,
    pref: &ReminderPreference,
    config: &SchedulerConfig,
) -> DayPlan {
    let anchor = window.window.end as u32 * 60;
    let gap = tier_gap_minutes(pref.aggressiveness, config);

    let mut slots: Vec<TierSlot> = Tier::ALL
        .into_iter()
        .filter(|tier| pref.aggressiveness.allows(*tier))
        .map(|tier| {
            let natural = match tier {
                Tier::Gentle => anchor,
                Tier::Supportive => anchor + gap,
                Tier::LastChance => last_chance_minute(pref.quiet_hours, config),
            };
            TierSlot {
                tier,
                natural_minute: natural,
                send_minute: defer_past_quiet(natural, pref.quiet_hours),
            }
        })
        .collect();

    // last_chance never fires ahead of a reachable earlier tier.
    let latest_other = slots
        .iter()
        .filter(|s| s.tier != Tier::LastChance)
        .filter_map(|s| s.send_minute)
        .max();
    if let Some(last) = slots.iter_mut().find(|s| s.tier == Tier::LastChance) {
        last.send_minute = match (last.send_minute, latest_other) {
            (Some(own), Some(other)) => Some(own.max(other)),
            (own, _) => own,
        };
    }

    DayPlan { window, slots }
}

/// `HH:MM` for a minute of the day.
pub fn format_minute(minute: u32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::HourWindow;
    use crate::patterns::WindowSource;
    use pretty_assertions::assert_eq;

    fn window(start: u8, end: u8) -> ResolvedWindow {
        ResolvedWindow {
            window: HourWindow::new(start, end),
            source: WindowSource::General,
            confidence: Some(0.8),
        }
    }

    fn pref(aggressiveness: Aggressiveness, quiet: Option<QuietHours>) -> ReminderPreference {
        let mut p = ReminderPreference::defaults("u", "g");
        p.aggressiveness = aggressiveness;
        p.quiet_hours = quiet;
        p
    }

    fn send_times(plan: &DayPlan) -> Vec<(Tier, Option<String>)> {
        plan.slots
            .iter()
            .map(|s| (s.tier, s.send_minute.map(format_minute)))
            .collect()
    }

    #[test]
    fn test_balanced_morning_plan() {
        let plan = plan_day(
            window(7, 8),
            &pref(Aggressiveness::Balanced, None),
            &SchedulerConfig::default(),
        );
        assert_eq!(
            send_times(&plan),
            vec![
                (Tier::Gentle, Some("08:00".into())),
                (Tier::Supportive, Some("10:00".into())),
                (Tier::LastChance, Some("21:00".into())),
            ]
        );
    }

    #[test]
    fn test_persistent_halves_gap() {
        let plan = plan_day(
            window(7, 8),
            &pref(Aggressiveness::Persistent, None),
            &SchedulerConfig::default(),
        );
        assert_eq!(
            plan.slot(Tier::Supportive).unwrap().send_minute,
            Some(9 * 60)
        );
    }

    #[test]
    fn test_gentle_aggressiveness_only_last_chance() {
        let plan = plan_day(
            window(7, 8),
            &pref(Aggressiveness::Gentle, None),
            &SchedulerConfig::default(),
        );
        assert_eq!(plan.slots.len(), 1);
        assert_eq!(plan.slots[0].tier, Tier::LastChance);
        assert_eq!(plan.eligible_tier(12 * 60), None);
        assert_eq!(plan.eligible_tier(21 * 60), Some(Tier::LastChance));
    }

    #[test]
    fn test_last_chance_before_quiet_hours() {
        let quiet = QuietHours { start: 20, end: 7 };
        let plan = plan_day(
            window(7, 8),
            &pref(Aggressiveness::Balanced, Some(quiet)),
            &SchedulerConfig::default(),
        );
        assert_eq!(
            plan.slot(Tier::LastChance).unwrap().send_minute,
            Some(19 * 60)
        );

        let midnight = QuietHours { start: 0, end: 6 };
        assert_eq!(
            last_chance_minute(Some(midnight), &SchedulerConfig::default()),
            21 * 60
        );

        let late = QuietHours { start: 21, end: 7 };
        assert_eq!(
            last_chance_minute(Some(late), &SchedulerConfig::default()),
            20 * 60
        );

        let morning = QuietHours { start: 9, end: 11 };
        assert_eq!(
            last_chance_minute(Some(morning), &SchedulerConfig::default()),
            21 * 60
        );
    }

    #[test]
    fn test_lunch_quiet_hours_keep_last_chance_in_evening() {
        let lunch = QuietHours { start: 13, end: 14 };
        let plan = plan_day(
            window(18, 21),
            &pref(Aggressiveness::Balanced, Some(lunch)),
            &SchedulerConfig::default(),
        );
        let last = plan.slot(Tier::LastChance).unwrap();
        assert_eq!(last.natural_minute, 21 * 60);
        // Supportive lands at 23:00, so last_chance waits for it.
        assert_eq!(last.send_minute, Some(23 * 60));
        assert_eq!(plan.eligible_tier(12 * 60 + 5), None);
        assert_eq!(plan.eligible_tier(21 * 60), Some(Tier::Gentle));
        assert_eq!(plan.eligible_tier(23 * 60), Some(Tier::LastChance));
    }

    #[test]
    fn test_last_chance_not_ahead_of_earlier_tiers() {
        // Quiet 15:00-23:00 swallows the evening: gentle defers to 23:00,
        // last_chance would fall at 14:00.
        let quiet = QuietHours { start: 15, end: 23 };
        let plan = plan_day(
            window(18, 21),
            &pref(Aggressiveness::Balanced, Some(quiet)),
            &SchedulerConfig::default(),
        );
        let last = plan.slot(Tier::LastChance).unwrap();
        assert_eq!(last.natural_minute, 14 * 60);
        assert_eq!(last.send_minute, Some(23 * 60));
        assert_eq!(plan.eligible_tier(14 * 60 + 30), None);
        assert_eq!(plan.eligible_tier(23 * 60), Some(Tier::LastChance));
    }

    #[test]
    fn test_quiet_hours_defer_to_end_same_day() {
        // Fixed 06:00 with quiet hours until 07:00: gentle moves to 07:00.
        let quiet = QuietHours { start: 22, end: 7 };
        let plan = plan_day(
            ResolvedWindow::fixed(6),
            &pref(Aggressiveness::Balanced, Some(quiet)),
            &SchedulerConfig::default(),
        );
        let gentle = plan.slot(Tier::Gentle).unwrap();
        assert_eq!(gentle.natural_minute, 6 * 60);
        assert_eq!(gentle.send_minute, Some(7 * 60));
        assert_eq!(plan.eligible_tier(6 * 60 + 30), None);
        assert_eq!(plan.eligible_tier(7 * 60), Some(Tier::Gentle));
    }

    #[test]
    fn test_quiet_hours_wrapping_to_tomorrow_drop_tier() {
        let quiet = QuietHours { start: 22, end: 6 };
        let plan = plan_day(
            window(21, 23),
            &pref(Aggressiveness::Balanced, Some(quiet)),
            &SchedulerConfig::default(),
        );
        // Gentle at 23:00 sits in quiet hours that end tomorrow.
        assert_eq!(plan.slot(Tier::Gentle).unwrap().send_minute, None);
        // Supportive would be past midnight.
        assert_eq!(plan.slot(Tier::Supportive).unwrap().send_minute, None);
    }

    #[test]
    fn test_most_advanced_tier_wins_after_gap() {
        let plan = plan_day(
            window(7, 8),
            &pref(Aggressiveness::Balanced, None),
            &SchedulerConfig::default(),
        );
        assert_eq!(plan.eligible_tier(7 * 60 + 59), None);
        assert_eq!(plan.eligible_tier(8 * 60), Some(Tier::Gentle));
        assert_eq!(plan.eligible_tier(10 * 60), Some(Tier::Supportive));
        assert_eq!(plan.eligible_tier(22 * 60), Some(Tier::LastChance));
        assert_eq!(plan.next_after(8 * 60).map(|s| s.tier), Some(Tier::Supportive));
        assert!(plan.next_after(21 * 60).is_none());
    }
}
