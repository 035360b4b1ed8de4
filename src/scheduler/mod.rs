// src/scheduler/mod.rs — Tier timing, day state and the dispatch sweep

pub mod copy;
pub mod dispatch;
pub mod state;
pub mod sweep;
pub mod tiers;

pub use dispatch::{DispatchIntent, Dispatcher, LogDispatcher, WebhookDispatcher};
pub use state::{day_state, DayFacts, DayState};
pub use sweep::{PairDecision, ReminderScheduler, Shard, SkipReason, SweepOutcome, SweepReport};
pub use tiers::{plan_day, DayPlan, TierSlot};
