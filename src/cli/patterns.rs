// src/cli/patterns.rs — recalc, rescan and plan commands

use chrono::Utc;

use crate::api::{self, BucketSummary};
use crate::infra::config::Config;
use crate::infra::errors::ReminderError;
use crate::patterns::PatternInferenceEngine;
use crate::scheduler::tiers::format_minute;
use crate::scheduler::{LogDispatcher, ReminderScheduler};

pub fn run_recalc(config: &Config, user: &str, goal: &str, tz: Option<&str>) -> anyhow::Result<()> {
    let db = super::open_database(config)?;

    match api::recalculate_goal_pattern(&db.store, config, user, goal, tz, Utc::now()) {
        Ok(summary) => {
            if let Some(general) = &summary.general {
                print_bucket(general);
            }
            for bucket in &summary.weekdays {
                print_bucket(bucket);
            }
            Ok(())
        }
        Err(ReminderError::InsufficientData { .. }) => {
            println!("Not enough logs to infer a pattern; smart reminders use the default window.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_bucket(b: &BucketSummary) {
    println!(
        "  {:<8} {:02}:00-{:02}:00  confidence {:.2}  ({} logs)",
        b.bucket, b.typical_hour_start, b.typical_hour_end, b.confidence_score, b.sample_size
    );
}

pub fn run_rescan(config: &Config) -> anyhow::Result<()> {
    let db = super::open_database(config)?;
    let engine = PatternInferenceEngine::new(&db.store, &config.patterns);
    let report = engine.rescan_stale(Utc::now())?;
    println!(
        "Recalculated {} stale patterns ({} insufficient, {} failed).",
        report.recalculated, report.insufficient, report.failed
    );
    Ok(())
}

pub fn run_plan(config: &Config, user: &str, goal: &str) -> anyhow::Result<()> {
    let db = super::open_database(config)?;
    let scheduler = ReminderScheduler::new(&db.store, &LogDispatcher, config);
    let decision = scheduler.inspect(user, goal, Utc::now())?;

    println!(
        "{} {} ({})",
        decision.local_date, decision.local_time, decision.timezone
    );
    println!("Preference: {}", super::prefs::describe(&decision.preference));

    match &decision.plan {
        Some(plan) => {
            println!(
                "Window:     {:02}:00-{:02}:00 ({:?}{})",
                plan.window.window.start,
                plan.window.window.end,
                plan.window.source,
                plan.window
                    .confidence
                    .map(|c| format!(", confidence {:.2}", c))
                    .unwrap_or_default()
            );
            for slot in &plan.slots {
                let when = match slot.send_minute {
                    Some(m) if m != slot.natural_minute => {
                        format!("{} (deferred from {})", format_minute(m), format_minute(slot.natural_minute))
                    }
                    Some(m) => format_minute(m),
                    None => "not today".to_string(),
                };
                println!("  {:<12} {}", slot.tier.as_str(), when);
            }
        }
        None if decision.logged_this_period => println!("Already logged this period."),
        None => {}
    }

    println!("State:      {}", decision.state.label());
    Ok(())
}
