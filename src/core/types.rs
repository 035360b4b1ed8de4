// src/core/types.rs — Reminder domain types

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Urgency level of a reminder. Ordering follows urgency, so `max()` over
/// eligible tiers picks the most advanced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Gentle,
    Supportive,
    LastChance,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Gentle, Tier::Supportive, Tier::LastChance];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gentle => "gentle",
            Self::Supportive => "supportive",
            Self::LastChance => "last_chance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gentle" => Some(Self::Gentle),
            "supportive" => Some(Self::Supportive),
            "last_chance" => Some(Self::LastChance),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the trigger point for a goal's reminders is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderMode {
    /// Use the inferred logging pattern.
    #[default]
    Smart,
    /// Use the user's `fixed_hour`.
    Fixed,
    /// Never schedule.
    Disabled,
}

impl ReminderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smart => "smart",
            Self::Fixed => "fixed",
            Self::Disabled => "disabled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "smart" => Some(Self::Smart),
            "fixed" => Some(Self::Fixed),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// Which tiers are reachable and how tightly they are spaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggressiveness {
    /// Only `last_chance` fires.
    Gentle,
    #[default]
    Balanced,
    /// All tiers, inter-tier gap halved.
    Persistent,
}

impl Aggressiveness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gentle => "gentle",
            Self::Balanced => "balanced",
            Self::Persistent => "persistent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gentle" => Some(Self::Gentle),
            "balanced" => Some(Self::Balanced),
            "persistent" => Some(Self::Persistent),
            _ => None,
        }
    }

    /// Whether a tier can ever fire under this setting.
    pub fn allows(&self, tier: Tier) -> bool {
        match self {
            Self::Gentle => tier == Tier::LastChance,
            Self::Balanced | Self::Persistent => true,
        }
    }
}

/// The period a goal's progress is counted over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// Day-of-week grouping for logging patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayBucket {
    /// All days combined.
    General,
    Weekday(Weekday),
}

/// Storage value for [`DayBucket::General`]; SQLite cannot key on NULL.
const GENERAL_SENTINEL: i32 = -1;

impl DayBucket {
    pub fn to_storage(self) -> i32 {
        match self {
            Self::General => GENERAL_SENTINEL,
            Self::Weekday(day) => day.num_days_from_monday() as i32,
        }
    }

    pub fn from_storage(value: i32) -> Option<Self> {
        match value {
            GENERAL_SENTINEL => Some(Self::General),
            0 => Some(Self::Weekday(Weekday::Mon)),
            1 => Some(Self::Weekday(Weekday::Tue)),
            2 => Some(Self::Weekday(Weekday::Wed)),
            3 => Some(Self::Weekday(Weekday::Thu)),
            4 => Some(Self::Weekday(Weekday::Fri)),
            5 => Some(Self::Weekday(Weekday::Sat)),
            6 => Some(Self::Weekday(Weekday::Sun)),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::General => "general".into(),
            Self::Weekday(day) => day.to_string().to_lowercase(),
        }
    }
}

/// A local-time hour window `[start, end]`, both in `0..=23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start: u8,
    pub end: u8,
}

impl HourWindow {
    pub fn new(start: u8, end: u8) -> Self {
        Self {
            start: start.min(23),
            end: end.min(23),
        }
    }

    /// A single trigger point, as used by fixed mode.
    pub fn point(hour: u8) -> Self {
        Self::new(hour, hour)
    }
}
