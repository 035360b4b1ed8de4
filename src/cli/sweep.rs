// src/cli/sweep.rs — sweep, evaluate and daemon commands

use chrono::Utc;

use crate::effectiveness::EffectivenessTracker;
use crate::infra::config::Config;
use crate::infra::daemon;
use crate::scheduler::{dispatch, ReminderScheduler, Shard};

fn parse_shard(shard: Option<&str>) -> anyhow::Result<Option<Shard>> {
    shard.map(Shard::parse).transpose()
}

pub async fn run_sweep(config: &Config, shard: Option<&str>) -> anyhow::Result<()> {
    let shard = parse_shard(shard)?;
    let db = super::open_database(config)?;
    let dispatcher = dispatch::from_config(&config.dispatch)?;

    let report = ReminderScheduler::new(&db.store, dispatcher.as_ref(), config)
        .run(Utc::now(), shard)
        .await?;

    println!("Considered:        {}", report.considered);
    println!(
        "Sent:              {} ({} delivery failures)",
        report.sent, report.delivery_failures
    );
    println!("Deferred:          {}", report.deferred);
    println!("Not due yet:       {}", report.not_due);
    println!("Already sent:      {}", report.already_sent);
    println!("Already logged:    {}", report.already_logged);
    println!("No tier left:      {}", report.elapsed);
    println!("Lost races:        {}", report.lost_races);
    println!("Skipped:           {}", report.skipped);
    if report.errors > 0 {
        println!("Errors:            {}", report.errors);
    }
    Ok(())
}

pub fn run_evaluate(config: &Config) -> anyhow::Result<()> {
    let db = super::open_database(config)?;
    let tracker = EffectivenessTracker::new(&db.store, &config.effectiveness);
    let report = tracker.evaluate(Utc::now())?;

    println!(
        "Evaluated {} of {} pending reminders: {} effective, {} not.",
        report.effective + report.ineffective,
        report.pending,
        report.effective,
        report.ineffective
    );
    if report.unknown_timezone > 0 {
        println!(
            "{} left pending (unknown timezone).",
            report.unknown_timezone
        );
    }

    let candidates = tracker.recalculation_candidates()?;
    if !candidates.is_empty() {
        println!();
        println!("Goals whose reminders keep missing:");
        for c in candidates {
            println!(
                "  {} / {}: {}/{} effective",
                c.user_id, c.goal_id, c.effective, c.evaluated
            );
        }
    }
    Ok(())
}

pub async fn run_daemon(config: &Config, shard: Option<&str>) -> anyhow::Result<()> {
    let shard = parse_shard(shard)?;
    let db = super::open_database(config)?;
    let dispatcher = dispatch::from_config(&config.dispatch)?;
    daemon::run_daemon(&db.store, config, dispatcher.as_ref(), shard).await
}
