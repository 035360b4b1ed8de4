// src/preferences/update.rs — Partial preference updates and validation

use serde::Deserialize;

use crate::core::types::{Aggressiveness, ReminderMode};
use crate::infra::errors::{ReminderError, Result};
use crate::preferences::{QuietHours, ReminderPreference};

/// Fields a caller may change. Enum values arrive as text so unknown
/// values can be rejected with a clear message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferenceUpdate {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub fixed_hour: Option<i64>,
    #[serde(default)]
    pub aggressiveness: Option<String>,
    #[serde(default)]
    pub quiet_hours_start: Option<i64>,
    #[serde(default)]
    pub quiet_hours_end: Option<i64>,
    /// Remove the stored fixed hour.
    #[serde(default)]
    pub clear_fixed_hour: bool,
    /// Remove quiet hours entirely.
    #[serde(default)]
    pub clear_quiet_hours: bool,
}

fn hour(field: &str, value: i64) -> Result<u8> {
    if (0..=23).contains(&value) {
        Ok(value as u8)
    } else {
        Err(ReminderError::invalid(format!(
            "{field} must be between 0 and 23, got {value}"
        )))
    }
}

impl PreferenceUpdate {
    /// Merge onto `current`, validating the result as a whole. Nothing is
    /// returned unless every field is acceptable.
    pub fn apply(&self, current: &ReminderPreference) -> Result<ReminderPreference> {
        let mut next = current.clone();

        if let Some(enabled) = self.enabled {
            next.enabled = enabled;
        }

        if let Some(ref mode) = self.mode {
            next.mode = ReminderMode::parse(mode.trim())
                .ok_or_else(|| ReminderError::invalid(format!("unknown mode '{mode}'")))?;
        }

        if let Some(ref level) = self.aggressiveness {
            next.aggressiveness = Aggressiveness::parse(level.trim()).ok_or_else(|| {
                ReminderError::invalid(format!("unknown aggressiveness '{level}'"))
            })?;
        }

        if self.clear_fixed_hour && self.fixed_hour.is_some() {
            return Err(ReminderError::invalid(
                "fixed_hour cannot be both set and cleared",
            ));
        }
        if self.clear_fixed_hour {
            next.fixed_hour = None;
        }
        if let Some(value) = self.fixed_hour {
            next.fixed_hour = Some(hour("fixed_hour", value)?);
        }

        let touches_quiet = self.quiet_hours_start.is_some() || self.quiet_hours_end.is_some();
        if self.clear_quiet_hours && touches_quiet {
            return Err(ReminderError::invalid(
                "quiet hours cannot be both set and cleared",
            ));
        }
        if self.clear_quiet_hours {
            next.quiet_hours = None;
        }
        if touches_quiet {
            let start = match self.quiet_hours_start {
                Some(v) => Some(hour("quiet_hours_start", v)?),
                None => current.quiet_hours.map(|q| q.start),
            };
            let end = match self.quiet_hours_end {
                Some(v) => Some(hour("quiet_hours_end", v)?),
                None => current.quiet_hours.map(|q| q.end),
            };
            next.quiet_hours = match (start, end) {
                (Some(start), Some(end)) if start == end => {
                    return Err(ReminderError::invalid(
                        "quiet_hours_start and quiet_hours_end must differ",
                    ));
                }
                (Some(start), Some(end)) => Some(QuietHours { start, end }),
                _ => {
                    return Err(ReminderError::invalid(
                        "quiet_hours_start and quiet_hours_end must be set together",
                    ));
                }
            };
        }

        if next.mode == ReminderMode::Fixed && next.fixed_hour.is_none() {
            return Err(ReminderError::invalid("fixed mode requires fixed_hour"));
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ReminderPreference {
        ReminderPreference::defaults("u", "g")
    }

    fn rejects(update: PreferenceUpdate) -> String {
        match update.apply(&base()) {
            Err(ReminderError::InvalidPreference(msg)) => msg,
            other => panic!("expected InvalidPreference, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_fixed_update() {
        let next = PreferenceUpdate {
            mode: Some("fixed".into()),
            fixed_hour: Some(9),
            aggressiveness: Some("persistent".into()),
            ..Default::default()
        }
        .apply(&base())
        .unwrap();
        assert_eq!(next.mode, ReminderMode::Fixed);
        assert_eq!(next.fixed_hour, Some(9));
        assert_eq!(next.aggressiveness, Aggressiveness::Persistent);
    }

    #[test]
    fn test_rejects_out_of_range_hours() {
        assert!(rejects(PreferenceUpdate {
            fixed_hour: Some(24),
            ..Default::default()
        })
        .contains("fixed_hour"));
        assert!(rejects(PreferenceUpdate {
            quiet_hours_start: Some(-1),
            quiet_hours_end: Some(7),
            ..Default::default()
        })
        .contains("quiet_hours_start"));
    }

    #[test]
    fn test_rejects_unknown_enums() {
        assert!(rejects(PreferenceUpdate {
            mode: Some("sometimes".into()),
            ..Default::default()
        })
        .contains("mode"));
        assert!(rejects(PreferenceUpdate {
            aggressiveness: Some("pushy".into()),
            ..Default::default()
        })
        .contains("aggressiveness"));
    }

    #[test]
    fn test_fixed_mode_requires_hour() {
        rejects(PreferenceUpdate {
            mode: Some("fixed".into()),
            ..Default::default()
        });
    }

    #[test]
    fn test_half_set_quiet_hours_rejected() {
        rejects(PreferenceUpdate {
            quiet_hours_start: Some(22),
            ..Default::default()
        });
    }

    #[test]
    fn test_quiet_hours_partial_update_keeps_other_bound() {
        let mut current = base();
        current.quiet_hours = Some(QuietHours { start: 22, end: 7 });
        let next = PreferenceUpdate {
            quiet_hours_end: Some(8),
            ..Default::default()
        }
        .apply(&current)
        .unwrap();
        assert_eq!(next.quiet_hours, Some(QuietHours { start: 22, end: 8 }));
    }

    #[test]
    fn test_clear_quiet_hours() {
        let mut current = base();
        current.quiet_hours = Some(QuietHours { start: 22, end: 7 });
        let next = PreferenceUpdate {
            clear_quiet_hours: true,
            ..Default::default()
        }
        .apply(&current)
        .unwrap();
        assert!(next.quiet_hours.is_none());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let update: PreferenceUpdate =
            serde_json::from_str(r#"{"aggressiveness": "gentle"}"#).unwrap();
        assert!(update.mode.is_none());
        let next = update.apply(&base()).unwrap();
        assert_eq!(next.aggressiveness, Aggressiveness::Gentle);
    }
}
