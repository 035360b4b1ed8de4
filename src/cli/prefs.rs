// src/cli/prefs.rs — Preference inspection and updates

use chrono::Utc;

use crate::api;
use crate::cli::PrefsAction;
use crate::core::types::ReminderMode;
use crate::infra::config::Config;
use crate::preferences::{PreferenceUpdate, ReminderPreference};

pub fn run_prefs(config: &Config, action: PrefsAction) -> anyhow::Result<()> {
    let db = super::open_database(config)?;

    match action {
        PrefsAction::List { user } => {
            let views = api::get_all_reminder_preferences(&db.store, &user)?;
            if views.is_empty() {
                println!("No active goals for user {}.", user);
                return Ok(());
            }
            for view in views {
                println!(
                    "{:<24} {:<32} {}",
                    view.goal_id,
                    view.goal_title,
                    describe(&view.preference)
                );
            }
        }
        PrefsAction::Show { user, goal } => {
            let detail = api::get_goal_reminder_preferences(&db.store, &user, &goal)?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        PrefsAction::Set {
            user,
            goal,
            mode,
            fixed_hour,
            aggressiveness,
            quiet_start,
            quiet_end,
            enabled,
            clear_quiet,
            clear_fixed_hour,
        } => {
            let update = PreferenceUpdate {
                enabled,
                mode,
                fixed_hour,
                aggressiveness,
                quiet_hours_start: quiet_start,
                quiet_hours_end: quiet_end,
                clear_fixed_hour,
                clear_quiet_hours: clear_quiet,
            };
            let detail =
                api::update_goal_reminder_preferences(&db.store, &user, &goal, &update, Utc::now())?;
            println!("Updated: {}", describe(&detail.preference));
        }
    }
    Ok(())
}

/// One-line summary, e.g. `smart, balanced, quiet 22-07`.
pub fn describe(pref: &ReminderPreference) -> String {
    if !pref.is_active() {
        return "disabled".to_string();
    }
    let mut parts = vec![match (pref.mode, pref.fixed_hour) {
        (ReminderMode::Fixed, Some(hour)) => format!("fixed {:02}:00", hour),
        (mode, _) => mode.as_str().to_string(),
    }];
    parts.push(pref.aggressiveness.as_str().to_string());
    if let Some(q) = pref.quiet_hours {
        parts.push(format!("quiet {:02}-{:02}", q.start, q.end));
    }
    if !pref.persisted {
        parts.push("(defaults)".to_string());
    }
    parts.join(", ")
}
