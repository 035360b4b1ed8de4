// tests/common/mod.rs — Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use smart_reminders::core::types::Cadence;
use smart_reminders::scheduler::{DispatchIntent, Dispatcher};
use smart_reminders::storage::Database;

/// Keeps every intent it is handed.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub sent: Mutex<Vec<DispatchIntent>>,
}

impl RecordingDispatcher {
    pub fn intents(&self) -> Vec<DispatchIntent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn dispatch(&self, intent: &DispatchIntent) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(intent.clone());
        Ok(())
    }
}

/// Always fails, like a push service that is down.
pub struct FailingDispatcher;

#[async_trait]
impl Dispatcher for FailingDispatcher {
    async fn dispatch(&self, _intent: &DispatchIntent) -> anyhow::Result<()> {
        anyhow::bail!("push service unavailable")
    }
}

/// In-memory database with one user participating in one goal.
pub fn db_with_goal(user: &str, tz: &str, goal: &str, cadence: Cadence) -> Database {
    let db = Database::in_memory().unwrap();
    add_goal(&db, user, tz, goal, cadence);
    db
}

pub fn add_goal(db: &Database, user: &str, tz: &str, goal: &str, cadence: Cadence) {
    db.store.upsert_user(user, tz).unwrap();
    db.store
        .insert_goal(goal, &format!("Goal {goal}"), cadence, None)
        .unwrap();
    db.store.add_participant(user, goal).unwrap();
}

/// A UTC instant for a wall-clock time in `tz`.
pub fn local(tz: &str, y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    let tz: Tz = tz.parse().unwrap();
    tz.with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

/// Record a progress log at a local wall-clock time.
pub fn log_at(db: &Database, id: &str, user: &str, goal: &str, tz: &str, at: (i32, u32, u32, u32, u32)) {
    let (y, m, d, h, min) = at;
    let instant = local(tz, y, m, d, h, min);
    let local_date = chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap();
    db.store
        .insert_progress_log(id, user, goal, instant, local_date)
        .unwrap();
}
