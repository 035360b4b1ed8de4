// src/storage/store.rs — SQLite operations

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::core::clock::{format_date, DATE_FORMAT};
use crate::core::types::{Aggressiveness, Cadence, DayBucket, ReminderMode, Tier};

/// Low-level SQLite operations for all reminder data.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    // -- Users --

    pub fn upsert_user(&self, id: &str, timezone: &str) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, timezone) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET timezone = excluded.timezone",
            params![id, timezone],
        )?;
        Ok(())
    }

    pub fn user_timezone(&self, id: &str) -> anyhow::Result<Option<String>> {
        let tz = self
            .conn
            .query_row(
                "SELECT timezone FROM users WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(tz)
    }

    // -- Goals --

    pub fn insert_goal(
        &self,
        id: &str,
        title: &str,
        cadence: Cadence,
        group_name: Option<&str>,
    ) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO goals (id, title, cadence, group_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, title, cadence.as_str(), group_name, ts(&Utc::now())],
        )?;
        Ok(())
    }

    pub fn set_goal_archived(&self, id: &str, archived: bool) -> anyhow::Result<()> {
        self.conn.execute(
            "UPDATE goals SET archived = ?1 WHERE id = ?2",
            params![archived, id],
        )?;
        Ok(())
    }

    pub fn get_goal(&self, id: &str) -> anyhow::Result<Option<GoalRow>> {
        let goal = self
            .conn
            .query_row(
                "SELECT id, title, cadence, archived, group_name FROM goals WHERE id = ?1",
                params![id],
                map_goal,
            )
            .optional()?;
        Ok(goal)
    }

    pub fn add_participant(&self, user_id: &str, goal_id: &str) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO goal_participants (user_id, goal_id, joined_at)
             VALUES (?1, ?2, ?3)",
            params![user_id, goal_id, ts(&Utc::now())],
        )?;
        Ok(())
    }

    /// Non-archived goals the user participates in, by title.
    pub fn query_goals_for_user(&self, user_id: &str) -> anyhow::Result<Vec<GoalRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.id, g.title, g.cadence, g.archived, g.group_name
             FROM goals g JOIN goal_participants p ON p.goal_id = g.id
             WHERE p.user_id = ?1 AND g.archived = 0
             ORDER BY g.title",
        )?;
        let rows = stmt.query_map(params![user_id], map_goal)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Pairs the sweep must consider: goal not archived, reminders not
    /// switched off. A missing preference row counts as enabled.
    pub fn query_active_pairs(&self) -> anyhow::Result<Vec<ActivePairRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.user_id, p.goal_id, g.title, g.cadence, g.group_name, u.timezone
             FROM goal_participants p
             JOIN goals g ON g.id = p.goal_id
             JOIN users u ON u.id = p.user_id
             LEFT JOIN reminder_preferences rp
                ON rp.user_id = p.user_id AND rp.goal_id = p.goal_id
             WHERE g.archived = 0
               AND COALESCE(rp.enabled, 1) = 1
               AND COALESCE(rp.mode, 'smart') != 'disabled'
             ORDER BY p.user_id, p.goal_id",
        )?;
        let rows = stmt.query_map([], |row| {
            let cadence: String = row.get(3)?;
            Ok(ActivePairRow {
                user_id: row.get(0)?,
                goal_id: row.get(1)?,
                goal_title: row.get(2)?,
                cadence: Cadence::parse(&cadence).ok_or_else(|| bad_value(3, &cadence))?,
                group_name: row.get(4)?,
                timezone: row.get(5)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // -- Progress logs --

    pub fn insert_progress_log(
        &self,
        id: &str,
        user_id: &str,
        goal_id: &str,
        logged_at: DateTime<Utc>,
        local_date: NaiveDate,
    ) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO progress_logs (id, user_id, goal_id, logged_at, local_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, user_id, goal_id, ts(&logged_at), format_date(local_date)],
        )?;
        Ok(())
    }

    /// Log instants for a pair at or after `since`, oldest first.
    pub fn query_progress_since(
        &self,
        user_id: &str,
        goal_id: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<DateTime<Utc>>> {
        let mut stmt = self.conn.prepare(
            "SELECT logged_at FROM progress_logs
             WHERE user_id = ?1 AND goal_id = ?2 AND logged_at >= ?3
             ORDER BY logged_at",
        )?;
        let rows = stmt.query_map(params![user_id, goal_id, ts(&since)], |row| {
            let raw: String = row.get(0)?;
            parse_ts(0, &raw)
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Whether any log exists with a local date in `[start, end]`.
    pub fn has_progress_between(
        &self,
        user_id: &str,
        goal_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<bool> {
        let found: bool = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM progress_logs
                WHERE user_id = ?1 AND goal_id = ?2
                  AND local_date >= ?3 AND local_date <= ?4
             )",
            params![user_id, goal_id, format_date(start), format_date(end)],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    // -- Logging patterns --

    pub fn upsert_pattern(&self, pattern: &PatternRow) -> anyhow::Result<()> {
        upsert_pattern_on(&self.conn, pattern)
    }

    /// Upsert `patterns` and delete every other bucket of the pair in one
    /// transaction. Returns how many stale buckets were removed.
    pub fn replace_patterns(
        &self,
        user_id: &str,
        goal_id: &str,
        patterns: &[PatternRow],
    ) -> anyhow::Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for pattern in patterns {
            upsert_pattern_on(&tx, pattern)?;
        }

        let keep: Vec<String> = patterns
            .iter()
            .map(|p| p.bucket.to_storage().to_string())
            .collect();
        let removed = if keep.is_empty() {
            tx.execute(
                "DELETE FROM logging_patterns WHERE user_id = ?1 AND goal_id = ?2",
                params![user_id, goal_id],
            )?
        } else {
            tx.execute(
                &format!(
                    "DELETE FROM logging_patterns
                     WHERE user_id = ?1 AND goal_id = ?2 AND day_of_week NOT IN ({})",
                    keep.join(", ")
                ),
                params![user_id, goal_id],
            )?
        };
        tx.commit()?;
        Ok(removed)
    }

    pub fn query_pattern(
        &self,
        user_id: &str,
        goal_id: &str,
        bucket: DayBucket,
    ) -> anyhow::Result<Option<PatternRow>> {
        let pattern = self
            .conn
            .query_row(
                "SELECT user_id, goal_id, day_of_week, typical_hour_start, typical_hour_end,
                 confidence_score, sample_size, last_calculated_at
                 FROM logging_patterns
                 WHERE user_id = ?1 AND goal_id = ?2 AND day_of_week = ?3",
                params![user_id, goal_id, bucket.to_storage()],
                map_pattern,
            )
            .optional()?;
        Ok(pattern)
    }

    /// All buckets for a pair, general first then Monday..Sunday.
    pub fn query_patterns(&self, user_id: &str, goal_id: &str) -> anyhow::Result<Vec<PatternRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, goal_id, day_of_week, typical_hour_start, typical_hour_end,
             confidence_score, sample_size, last_calculated_at
             FROM logging_patterns
             WHERE user_id = ?1 AND goal_id = ?2
             ORDER BY day_of_week",
        )?;
        let rows = stmt.query_map(params![user_id, goal_id], map_pattern)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Pairs whose general pattern is confident enough to keep fresh but
    /// was last calculated before `before`.
    pub fn query_stale_patterns(
        &self,
        min_confidence: f64,
        before: DateTime<Utc>,
    ) -> anyhow::Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, goal_id FROM logging_patterns
             WHERE day_of_week = ?1 AND confidence_score >= ?2 AND last_calculated_at < ?3
             ORDER BY last_calculated_at",
        )?;
        let rows = stmt.query_map(
            params![DayBucket::General.to_storage(), min_confidence, ts(&before)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // -- Reminder history --

    /// Insert unless a reminder already exists for the same
    /// (user, goal, local date). Returns `false` when another writer won.
    pub fn try_insert_reminder(&self, reminder: &ReminderRow) -> anyhow::Result<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO reminder_history (id, user_id, goal_id, tier, sent_at,
             sent_at_local_date, was_effective, user_timezone, social_context)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(user_id, goal_id, sent_at_local_date) DO NOTHING",
            params![
                reminder.id,
                reminder.user_id,
                reminder.goal_id,
                reminder.tier.as_str(),
                ts(&reminder.sent_at),
                format_date(reminder.sent_at_local_date),
                reminder.was_effective,
                reminder.user_timezone,
                reminder.social_context
            ],
        )?;
        Ok(inserted == 1)
    }

    pub fn reminder_for_day(
        &self,
        user_id: &str,
        goal_id: &str,
        local_date: NaiveDate,
    ) -> anyhow::Result<Option<ReminderRow>> {
        let reminder = self
            .conn
            .query_row(
                &format!(
                    "SELECT {REMINDER_COLUMNS} FROM reminder_history
                     WHERE user_id = ?1 AND goal_id = ?2 AND sent_at_local_date = ?3"
                ),
                params![user_id, goal_id, format_date(local_date)],
                map_reminder,
            )
            .optional()?;
        Ok(reminder)
    }

    /// Most recent reminders for a pair, newest first.
    pub fn query_reminders(
        &self,
        user_id: &str,
        goal_id: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<ReminderRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REMINDER_COLUMNS} FROM reminder_history
             WHERE user_id = ?1 AND goal_id = ?2
             ORDER BY sent_at_local_date DESC LIMIT ?3"
        ))?;
        let rows = stmt.query_map(params![user_id, goal_id, limit], map_reminder)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn query_unevaluated_reminders(&self) -> anyhow::Result<Vec<ReminderRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REMINDER_COLUMNS} FROM reminder_history
             WHERE was_effective IS NULL
             ORDER BY sent_at"
        ))?;
        let rows = stmt.query_map([], map_reminder)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Set `was_effective` only if it is still NULL. Returns whether the
    /// row changed.
    pub fn mark_reminder_effectiveness(&self, id: &str, effective: bool) -> anyhow::Result<bool> {
        let changed = self.conn.execute(
            "UPDATE reminder_history SET was_effective = ?1
             WHERE id = ?2 AND was_effective IS NULL",
            params![effective, id],
        )?;
        Ok(changed == 1)
    }

    /// Outcomes of the most recent evaluated reminders, newest first.
    pub fn query_recent_outcomes(
        &self,
        user_id: &str,
        goal_id: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<bool>> {
        let mut stmt = self.conn.prepare(
            "SELECT was_effective FROM reminder_history
             WHERE user_id = ?1 AND goal_id = ?2 AND was_effective IS NOT NULL
             ORDER BY sent_at_local_date DESC LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![user_id, goal_id, limit], |row| row.get(0))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn query_evaluated_pairs(&self) -> anyhow::Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT user_id, goal_id FROM reminder_history
             WHERE was_effective IS NOT NULL
             ORDER BY user_id, goal_id",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // -- Reminder preferences --

    pub fn get_preference(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> anyhow::Result<Option<PreferenceRow>> {
        let pref = self
            .conn
            .query_row(
                "SELECT user_id, goal_id, enabled, mode, fixed_hour, aggressiveness,
                 quiet_hours_start, quiet_hours_end, last_modified_at
                 FROM reminder_preferences WHERE user_id = ?1 AND goal_id = ?2",
                params![user_id, goal_id],
                map_preference,
            )
            .optional()?;
        Ok(pref)
    }

    pub fn upsert_preference(&self, pref: &PreferenceRow) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO reminder_preferences (user_id, goal_id, enabled, mode, fixed_hour,
             aggressiveness, quiet_hours_start, quiet_hours_end, last_modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(user_id, goal_id) DO UPDATE SET
                enabled = excluded.enabled,
                mode = excluded.mode,
                fixed_hour = excluded.fixed_hour,
                aggressiveness = excluded.aggressiveness,
                quiet_hours_start = excluded.quiet_hours_start,
                quiet_hours_end = excluded.quiet_hours_end,
                last_modified_at = excluded.last_modified_at",
            params![
                pref.user_id,
                pref.goal_id,
                pref.enabled,
                pref.mode.as_str(),
                pref.fixed_hour,
                pref.aggressiveness.as_str(),
                pref.quiet_hours_start,
                pref.quiet_hours_end,
                ts(&pref.last_modified_at)
            ],
        )?;
        Ok(())
    }

    /// Get a reference to the underlying connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

// -- Column codecs --

const REMINDER_COLUMNS: &str = "id, user_id, goal_id, tier, sent_at, sent_at_local_date, \
                                was_effective, user_timezone, social_context";

fn upsert_pattern_on(conn: &Connection, pattern: &PatternRow) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO logging_patterns (user_id, goal_id, day_of_week,
         typical_hour_start, typical_hour_end, confidence_score, sample_size,
         last_calculated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(user_id, goal_id, day_of_week) DO UPDATE SET
            typical_hour_start = excluded.typical_hour_start,
            typical_hour_end = excluded.typical_hour_end,
            confidence_score = excluded.confidence_score,
            sample_size = excluded.sample_size,
            last_calculated_at = excluded.last_calculated_at",
        params![
            pattern.user_id,
            pattern.goal_id,
            pattern.bucket.to_storage(),
            pattern.typical_hour_start,
            pattern.typical_hour_end,
            pattern.confidence_score,
            pattern.sample_size,
            ts(&pattern.last_calculated_at)
        ],
    )?;
    Ok(())
}

fn ts(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn bad_value(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("unrecognised value '{value}'").into(),
    )
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_date_col(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_goal(row: &Row<'_>) -> rusqlite::Result<GoalRow> {
    let cadence: String = row.get(2)?;
    Ok(GoalRow {
        id: row.get(0)?,
        title: row.get(1)?,
        cadence: Cadence::parse(&cadence).ok_or_else(|| bad_value(2, &cadence))?,
        archived: row.get(3)?,
        group_name: row.get(4)?,
    })
}

fn map_pattern(row: &Row<'_>) -> rusqlite::Result<PatternRow> {
    let day_of_week: i32 = row.get(2)?;
    let calculated: String = row.get(7)?;
    Ok(PatternRow {
        user_id: row.get(0)?,
        goal_id: row.get(1)?,
        bucket: DayBucket::from_storage(day_of_week)
            .ok_or_else(|| bad_value(2, &day_of_week.to_string()))?,
        typical_hour_start: row.get(3)?,
        typical_hour_end: row.get(4)?,
        confidence_score: row.get(5)?,
        sample_size: row.get(6)?,
        last_calculated_at: parse_ts(7, &calculated)?,
    })
}

fn map_reminder(row: &Row<'_>) -> rusqlite::Result<ReminderRow> {
    let tier: String = row.get(3)?;
    let sent_at: String = row.get(4)?;
    let local_date: String = row.get(5)?;
    Ok(ReminderRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        goal_id: row.get(2)?,
        tier: Tier::parse(&tier).ok_or_else(|| bad_value(3, &tier))?,
        sent_at: parse_ts(4, &sent_at)?,
        sent_at_local_date: parse_date_col(5, &local_date)?,
        was_effective: row.get(6)?,
        user_timezone: row.get(7)?,
        social_context: row.get(8)?,
    })
}

fn map_preference(row: &Row<'_>) -> rusqlite::Result<PreferenceRow> {
    let mode: String = row.get(3)?;
    let aggressiveness: String = row.get(5)?;
    let modified: String = row.get(8)?;
    Ok(PreferenceRow {
        user_id: row.get(0)?,
        goal_id: row.get(1)?,
        enabled: row.get(2)?,
        mode: ReminderMode::parse(&mode).ok_or_else(|| bad_value(3, &mode))?,
        fixed_hour: row.get(4)?,
        aggressiveness: Aggressiveness::parse(&aggressiveness)
            .ok_or_else(|| bad_value(5, &aggressiveness))?,
        quiet_hours_start: row.get(6)?,
        quiet_hours_end: row.get(7)?,
        last_modified_at: parse_ts(8, &modified)?,
    })
}

// -- Row types --

#[derive(Debug, Clone)]
pub struct GoalRow {
    pub id: String,
    pub title: String,
    pub cadence: Cadence,
    pub archived: bool,
    pub group_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ActivePairRow {
    pub user_id: String,
    pub goal_id: String,
    pub goal_title: String,
    pub cadence: Cadence,
    pub group_name: Option<String>,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternRow {
    pub user_id: String,
    pub goal_id: String,
    pub bucket: DayBucket,
    pub typical_hour_start: u8,
    pub typical_hour_end: u8,
    pub confidence_score: f64,
    pub sample_size: u32,
    pub last_calculated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRow {
    pub id: String,
    pub user_id: String,
    pub goal_id: String,
    pub tier: Tier,
    pub sent_at: DateTime<Utc>,
    pub sent_at_local_date: NaiveDate,
    pub was_effective: Option<bool>,
    pub user_timezone: String,
    pub social_context: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceRow {
    pub user_id: String,
    pub goal_id: String,
    pub enabled: bool,
    pub mode: ReminderMode,
    pub fixed_hour: Option<u8>,
    pub aggressiveness: Aggressiveness,
    pub quiet_hours_start: Option<u8>,
    pub quiet_hours_end: Option<u8>,
    pub last_modified_at: DateTime<Utc>,
}
