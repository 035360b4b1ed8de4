// src/lib.rs — Library root for smart-reminders

pub mod api;
pub mod cli;
pub mod core;
pub mod effectiveness;
pub mod infra;
pub mod patterns;
pub mod preferences;
pub mod scheduler;
pub mod storage;
