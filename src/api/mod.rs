// src/api/mod.rs — Operations exposed to the app's settings screens

pub mod types;

use chrono::{DateTime, Utc};

use crate::core::clock::parse_timezone;
use crate::infra::config::Config;
use crate::infra::errors::{ReminderError, Result};
use crate::patterns::PatternInferenceEngine;
use crate::preferences::{PreferenceResolver, PreferenceUpdate};
use crate::storage::store::Store;

pub use types::{BucketSummary, GoalPreferenceDetail, GoalPreferenceView, PatternSummary};

/// Effective preferences for every active goal the user participates in.
pub fn get_all_reminder_preferences(store: &Store, user_id: &str) -> Result<Vec<GoalPreferenceView>> {
    let resolver = PreferenceResolver::new(store);
    let mut views = Vec::new();
    for goal in store.query_goals_for_user(user_id)? {
        if goal.archived {
            continue;
        }
        views.push(GoalPreferenceView {
            preference: resolver.resolve(user_id, &goal.id)?,
            goal_id: goal.id,
            goal_title: goal.title,
        });
    }
    Ok(views)
}

pub fn get_goal_reminder_preferences(
    store: &Store,
    user_id: &str,
    goal_id: &str,
) -> Result<GoalPreferenceDetail> {
    let goal = store
        .get_goal(goal_id)?
        .ok_or_else(|| ReminderError::GoalNotFound {
            goal_id: goal_id.to_string(),
        })?;
    let preference = PreferenceResolver::new(store).resolve(user_id, goal_id)?;
    let rows = store.query_patterns(user_id, goal_id)?;

    Ok(GoalPreferenceDetail {
        goal_title: goal.title,
        preference,
        pattern: PatternSummary::from_rows(&rows),
    })
}

/// Validate and store a partial update; returns the new effective settings.
pub fn update_goal_reminder_preferences(
    store: &Store,
    user_id: &str,
    goal_id: &str,
    update: &PreferenceUpdate,
    now: DateTime<Utc>,
) -> Result<GoalPreferenceDetail> {
    PreferenceResolver::new(store).update(user_id, goal_id, update, now)?;
    get_goal_reminder_preferences(store, user_id, goal_id)
}

/// Re-run inference for one goal. `timezone` overrides the user's stored
/// zone; otherwise the stored one is used.
pub fn recalculate_goal_pattern(
    store: &Store,
    config: &Config,
    user_id: &str,
    goal_id: &str,
    timezone: Option<&str>,
    now: DateTime<Utc>,
) -> Result<PatternSummary> {
    if store.get_goal(goal_id)?.is_none() {
        return Err(ReminderError::GoalNotFound {
            goal_id: goal_id.to_string(),
        });
    }

    let tz_name = match timezone {
        Some(tz) => tz.to_string(),
        None => store
            .user_timezone(user_id)?
            .ok_or_else(|| ReminderError::UserNotFound {
                user_id: user_id.to_string(),
            })?,
    };
    let tz = parse_timezone(&tz_name)?;

    let engine = PatternInferenceEngine::new(store, &config.patterns);
    engine.recalculate(user_id, goal_id, tz, now)?;
    let rows = store.query_patterns(user_id, goal_id)?;
    PatternSummary::from_rows(&rows).ok_or_else(|| ReminderError::insufficient(user_id, goal_id))
}
