// src/infra/daemon.rs — Periodic sweep, evaluation and pattern maintenance
//
// One tick: dispatch sweep, effectiveness evaluation, recalculation of
// goals whose reminders keep missing, then the stale-pattern re-scan.

use std::time::Duration;

use chrono::Utc;

use crate::effectiveness::EffectivenessTracker;
use crate::infra::config::Config;
use crate::patterns::PatternInferenceEngine;
use crate::scheduler::{Dispatcher, ReminderScheduler, Shard};
use crate::storage::store::Store;

/// Run until Ctrl-C, ticking every `scheduler.sweep_interval_minutes`.
pub async fn run_daemon(
    store: &Store,
    config: &Config,
    dispatcher: &dyn Dispatcher,
    shard: Option<Shard>,
) -> anyhow::Result<()> {
    let minutes = config.scheduler.sweep_interval_minutes.max(1) as u64;
    tracing::info!(interval_minutes = minutes, "Reminder daemon starting...");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // The first tick fires immediately so a fresh start sweeps at once.
    let mut interval = tokio::time::interval(Duration::from_secs(minutes * 60));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    println!("Daemon running. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                run_cycle(store, config, dispatcher, shard).await;
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    println!("Daemon stopped.");
    Ok(())
}

/// One maintenance cycle. Each stage logs its own failure and the next
/// stage still runs.
pub async fn run_cycle(
    store: &Store,
    config: &Config,
    dispatcher: &dyn Dispatcher,
    shard: Option<Shard>,
) {
    let now = Utc::now();

    let scheduler = ReminderScheduler::new(store, dispatcher, config);
    if let Err(e) = scheduler.run(now, shard).await {
        tracing::error!("Sweep failed: {}", e);
    }

    let tracker = EffectivenessTracker::new(store, &config.effectiveness);
    if let Err(e) = tracker.evaluate(now) {
        tracing::error!("Effectiveness evaluation failed: {}", e);
    }

    let engine = PatternInferenceEngine::new(store, &config.patterns);
    match tracker.recalculation_candidates() {
        Ok(candidates) => {
            for stats in candidates {
                tracing::info!(
                    user_id = %stats.user_id,
                    goal_id = %stats.goal_id,
                    rate = stats.rate.unwrap_or_default(),
                    "Low reminder effectiveness; recalculating pattern"
                );
                if let Err(e) = engine.recalculate_for_user(&stats.user_id, &stats.goal_id, now) {
                    tracing::debug!(user_id = %stats.user_id, goal_id = %stats.goal_id, "Recalculation skipped: {}", e);
                }
            }
        }
        Err(e) => tracing::error!("Recalculation candidates query failed: {}", e),
    }

    match engine.rescan_stale(now) {
        Ok(report) => tracing::debug!(
            recalculated = report.recalculated,
            insufficient = report.insufficient,
            failed = report.failed,
            "Stale pattern re-scan complete"
        ),
        Err(e) => tracing::error!("Stale pattern re-scan failed: {}", e),
    }
}
