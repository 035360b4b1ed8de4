// tests/patterns_test.rs — Integration test: inference, fallback and re-scan

mod common;

use chrono::{Duration, TimeZone, Utc, Weekday};

use common::{db_with_goal, local, log_at};
use smart_reminders::core::types::{Cadence, DayBucket};
use smart_reminders::infra::config::Config;
use smart_reminders::infra::errors::ReminderError;
use smart_reminders::patterns::{resolve_window, PatternInferenceEngine, WindowSource};
use smart_reminders::storage::store::PatternRow;

const PARIS: &str = "Europe/Paris";

#[test]
fn test_no_logs_is_insufficient_data() {
    let db = db_with_goal("u1", PARIS, "g1", Cadence::Daily);
    let config = Config::default();
    let engine = PatternInferenceEngine::new(&db.store, &config.patterns);

    let err = engine
        .recalculate_for_user("u1", "g1", Utc::now())
        .unwrap_err();
    assert!(matches!(err, ReminderError::InsufficientData { .. }));
    assert!(db.store.query_patterns("u1", "g1").unwrap().is_empty());

    // Callers fall back to the default evening window.
    let window = resolve_window(
        &db.store,
        "u1",
        "g1",
        Weekday::Tue,
        &config.patterns,
        &config.scheduler,
    )
    .unwrap();
    assert_eq!(window.source, WindowSource::Default);
    assert_eq!((window.window.start, window.window.end), (18, 21));
}

#[test]
fn test_three_samples_give_usable_window() {
    let db = db_with_goal("u1", PARIS, "g1", Cadence::Daily);
    log_at(&db, "p1", "u1", "g1", PARIS, (2025, 5, 5, 7, 0));
    log_at(&db, "p2", "u1", "g1", PARIS, (2025, 5, 6, 7, 30));
    log_at(&db, "p3", "u1", "g1", PARIS, (2025, 5, 7, 8, 0));

    let config = Config::default();
    let engine = PatternInferenceEngine::new(&db.store, &config.patterns);
    let rows = engine
        .recalculate_for_user("u1", "g1", local(PARIS, 2025, 5, 8, 12, 0))
        .unwrap();

    assert_eq!(rows.len(), 1);
    let general = &rows[0];
    assert_eq!(general.bucket, DayBucket::General);
    assert_eq!(general.sample_size, 3);
    assert!(general.confidence_score > 0.3);
    assert!(general.typical_hour_start >= 6);
    assert!(general.typical_hour_end <= 9);
}

#[test]
fn test_weekday_bucket_preferred_when_reliable() {
    let db = db_with_goal("u1", PARIS, "g1", Cadence::Daily);
    // Weekday mornings, Saturday afternoons.
    let mut n = 0;
    for week in 0..4 {
        for (day, hour) in [(5, 7), (6, 7), (7, 7), (10, 15)] {
            n += 1;
            log_at(&db, &format!("p{n}"), "u1", "g1", PARIS, (2025, 5, day + week * 7, hour, 20));
        }
    }

    let config = Config::default();
    let engine = PatternInferenceEngine::new(&db.store, &config.patterns);
    engine
        .recalculate_for_user("u1", "g1", local(PARIS, 2025, 6, 2, 0, 0))
        .unwrap();

    let saturday = resolve_window(
        &db.store,
        "u1",
        "g1",
        Weekday::Sat,
        &config.patterns,
        &config.scheduler,
    )
    .unwrap();
    assert_eq!(saturday.source, WindowSource::Weekday);
    assert_eq!((saturday.window.start, saturday.window.end), (15, 16));

    // No Thursday logs, and the mixed general bucket is too spread out to
    // trust, so Thursday gets the default window.
    let thursday = resolve_window(
        &db.store,
        "u1",
        "g1",
        Weekday::Thu,
        &config.patterns,
        &config.scheduler,
    )
    .unwrap();
    assert_eq!(thursday.source, WindowSource::Default);
}

#[test]
fn test_rescan_refreshes_stale_confident_patterns() {
    let db = db_with_goal("u1", PARIS, "g1", Cadence::Daily);
    let now = Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0).unwrap();
    for d in 12..=16 {
        log_at(&db, &format!("p{d}"), "u1", "g1", PARIS, (2025, 5, d, 19, 30));
    }
    db.store
        .upsert_pattern(&PatternRow {
            user_id: "u1".into(),
            goal_id: "g1".into(),
            bucket: DayBucket::General,
            typical_hour_start: 7,
            typical_hour_end: 8,
            confidence_score: 0.6,
            sample_size: 10,
            last_calculated_at: now - Duration::days(30),
        })
        .unwrap();

    let config = Config::default();
    let engine = PatternInferenceEngine::new(&db.store, &config.patterns);
    let report = engine.rescan_stale(now).unwrap();
    assert_eq!(report.recalculated, 1);

    let general = db
        .store
        .query_pattern("u1", "g1", DayBucket::General)
        .unwrap()
        .unwrap();
    assert_eq!(general.typical_hour_start, 19);
    assert_eq!(general.last_calculated_at, now);

    // Fresh now, so a second pass has nothing to do.
    assert_eq!(engine.rescan_stale(now).unwrap().recalculated, 0);
}

#[test]
fn test_aged_out_weekday_bucket_is_dropped() {
    let db = db_with_goal("u1", PARIS, "g1", Cadence::Daily);
    let config = Config::default();
    let engine = PatternInferenceEngine::new(&db.store, &config.patterns);

    // Three Saturday afternoons in January.
    for (n, day) in [4, 11, 18].into_iter().enumerate() {
        log_at(&db, &format!("jan{n}"), "u1", "g1", PARIS, (2025, 1, day, 15, 0));
    }
    engine
        .recalculate_for_user("u1", "g1", local(PARIS, 2025, 1, 20, 12, 0))
        .unwrap();
    assert!(db
        .store
        .query_pattern("u1", "g1", DayBucket::Weekday(Weekday::Sat))
        .unwrap()
        .is_some());

    // By June the January logs are outside the lookback and the user logs
    // on weekday mornings instead.
    for (n, day) in [2, 3, 4, 5].into_iter().enumerate() {
        log_at(&db, &format!("jun{n}"), "u1", "g1", PARIS, (2025, 6, day, 7, 15));
    }
    let rows = engine
        .recalculate_for_user("u1", "g1", local(PARIS, 2025, 6, 6, 12, 0))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].bucket, DayBucket::General);

    let stored: Vec<DayBucket> = db
        .store
        .query_patterns("u1", "g1")
        .unwrap()
        .iter()
        .map(|row| row.bucket)
        .collect();
    assert_eq!(stored, vec![DayBucket::General]);

    let saturday = resolve_window(
        &db.store,
        "u1",
        "g1",
        Weekday::Sat,
        &config.patterns,
        &config.scheduler,
    )
    .unwrap();
    assert_eq!(saturday.source, WindowSource::General);
    assert_eq!((saturday.window.start, saturday.window.end), (7, 8));
}

#[test]
fn test_history_aging_out_clears_patterns() {
    let db = db_with_goal("u1", PARIS, "g1", Cadence::Daily);
    let config = Config::default();
    let engine = PatternInferenceEngine::new(&db.store, &config.patterns);
    for d in 5..=7 {
        log_at(&db, &format!("p{d}"), "u1", "g1", PARIS, (2025, 5, d, 7, 30));
    }
    engine
        .recalculate_for_user("u1", "g1", local(PARIS, 2025, 5, 8, 12, 0))
        .unwrap();
    assert_eq!(db.store.query_patterns("u1", "g1").unwrap().len(), 1);

    let err = engine
        .recalculate_for_user("u1", "g1", local(PARIS, 2025, 11, 1, 12, 0))
        .unwrap_err();
    assert!(matches!(err, ReminderError::InsufficientData { .. }));
    assert!(db.store.query_patterns("u1", "g1").unwrap().is_empty());
}
