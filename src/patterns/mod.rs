// src/patterns/mod.rs — Logging-time pattern learning

pub mod inference;
pub mod stats;
pub mod window;

pub use inference::{infer_buckets, PatternInferenceEngine, RescanReport};
pub use window::{resolve_window, ResolvedWindow, WindowSource};
