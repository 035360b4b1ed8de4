// src/core/mod.rs — Domain types and local-time helpers

pub mod clock;
pub mod types;

pub use types::{Aggressiveness, Cadence, DayBucket, HourWindow, ReminderMode, Tier};
