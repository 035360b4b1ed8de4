// src/scheduler/copy.rs — Suggested notification text per tier

use chrono::{Datelike, NaiveDate};

use crate::core::types::Tier;

const GENTLE: &[&str] = &[
    "A quick nudge: have you logged {goal} today?",
    "Whenever you're ready, {goal} is waiting for today's check-in.",
    "Small steps count. Log {goal} when you get a moment.",
];

const SUPPORTIVE: &[&str] = &[
    "You've got this. There's still time to log {goal} today.",
    "Keeping the streak alive? {goal} hasn't been logged yet.",
    "A few minutes on {goal} now keeps the momentum going.",
];

const LAST_CHANCE: &[&str] = &[
    "Last call for today: log {goal} before the day ends.",
    "The day's almost over. Don't let {goal} slip!",
    "One more chance to check in on {goal} today.",
];

fn templates(tier: Tier) -> &'static [&'static str] {
    match tier {
        Tier::Gentle => GENTLE,
        Tier::Supportive => SUPPORTIVE,
        Tier::LastChance => LAST_CHANCE,
    }
}

/// Pick copy for a tier. The choice rotates with the local date so users
/// don't see the same line every day.
pub fn suggested_copy(
    tier: Tier,
    goal_title: &str,
    group_name: Option<&str>,
    local_date: NaiveDate,
) -> String {
    let options = templates(tier);
    let index = local_date.num_days_from_ce().unsigned_abs() as usize % options.len();
    let mut text = options[index].replace("{goal}", goal_title);

    if let Some(group) = group_name {
        match tier {
            Tier::Gentle => {}
            Tier::Supportive => text.push_str(&format!(" {group} is cheering you on.")),
            Tier::LastChance => text.push_str(&format!(" {group} is counting on you.")),
        }
    }
    text
}
