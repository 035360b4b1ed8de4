// src/core/clock.rs — Local-time helpers (IANA timezones, periods)

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::core::types::Cadence;
use crate::infra::errors::{ReminderError, Result};

/// Storage format for local calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an IANA timezone name such as `Europe/Berlin`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ReminderError::UnknownTimezone(name.to_string()))
}

/// The local wall-clock view of an instant.
pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    instant.with_timezone(&tz)
}

/// The local calendar date of an instant.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    to_local(instant, tz).date_naive()
}

/// Hours since local midnight, with minutes as a fraction.
pub fn fractional_hour(time: NaiveTime) -> f64 {
    time.hour() as f64 + time.minute() as f64 / 60.0 + time.second() as f64 / 3600.0
}

/// Minutes since local midnight.
pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(s, DATE_FORMAT)?)
}

/// Inclusive first and last local date of the period containing `date`.
///
/// Weeks start on Monday.
pub fn period_bounds(cadence: Cadence, date: NaiveDate) -> (NaiveDate, NaiveDate) {
    match cadence {
        Cadence::Daily => (date, date),
        Cadence::Weekly => {
            let offset = date.weekday().num_days_from_monday() as u64;
            let start = date - Days::new(offset);
            (start, start + Days::new(6))
        }
        Cadence::Monthly => {
            let start = date.with_day(1).unwrap_or(date);
            let next_month = if start.month() == 12 {
                NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
            };
            let end = next_month
                .and_then(|d| d.pred_opt())
                .unwrap_or(start);
            (start, end)
        }
    }
}
