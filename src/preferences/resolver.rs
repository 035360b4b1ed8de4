// src/preferences/resolver.rs — Stored settings merged with defaults

use chrono::{DateTime, Utc};
use tracing::info;

use crate::infra::errors::{ReminderError, Result};
use crate::preferences::{PreferenceUpdate, ReminderPreference};
use crate::storage::store::Store;

pub struct PreferenceResolver<'a> {
    store: &'a Store,
}

impl<'a> PreferenceResolver<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// The stored row if present, else system defaults.
    pub fn resolve(&self, user_id: &str, goal_id: &str) -> anyhow::Result<ReminderPreference> {
        Ok(self
            .store
            .get_preference(user_id, goal_id)?
            .map(ReminderPreference::from)
            .unwrap_or_else(|| ReminderPreference::defaults(user_id, goal_id)))
    }

    /// Validate and persist a partial update. Invalid input writes nothing.
    pub fn update(
        &self,
        user_id: &str,
        goal_id: &str,
        update: &PreferenceUpdate,
        now: DateTime<Utc>,
    ) -> Result<ReminderPreference> {
        if self.store.get_goal(goal_id)?.is_none() {
            return Err(ReminderError::GoalNotFound {
                goal_id: goal_id.to_string(),
            });
        }

        let current = self.resolve(user_id, goal_id)?;
        let mut next = update.apply(&current)?;
        self.store.upsert_preference(&next.to_row(now))?;

        next.persisted = true;
        next.last_modified_at = Some(now);
        info!(
            user_id,
            goal_id,
            mode = next.mode.as_str(),
            aggressiveness = next.aggressiveness.as_str(),
            "Updated reminder preference"
        );
        Ok(next)
    }
}
