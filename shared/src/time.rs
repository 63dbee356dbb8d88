use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use crate::types::{DayOfWeek, OverrideKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid timezone: {0}")]
pub struct InvalidTimezone(pub String);

/// Source of "now" for past-time checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock of the evaluating process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, InvalidTimezone> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| InvalidTimezone(name.to_owned()))
}

/// Picks the first valid zone among `candidates`, in order, else `fallback`.
///
/// Invalid names are logged and skipped rather than failing the caller.
pub fn resolve_timezone<'a, I>(candidates: I, fallback: Tz) -> Tz
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    for name in candidates.into_iter().flatten() {
        match parse_timezone(name) {
            Ok(tz) => return tz,
            Err(e) => tracing::warn!(timezone = %name, "{e}, trying next candidate"),
        }
    }
    fallback
}

/// Calendar parts of an instant as seen on a local wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalParts {
    pub day_of_week: DayOfWeek,
    pub hour: u8,
    pub minute_of_day: u16,
    pub date: NaiveDate,
}

impl LocalParts {
    /// Decomposes `instant` in `tz`. The host's own zone never leaks in.
    pub fn in_zone(instant: DateTime<Utc>, tz: Tz) -> Self {
        Self::from_datetime(&instant.with_timezone(&tz))
    }

    /// Legacy path: decomposes `instant` on the evaluating host's local clock.
    ///
    /// Results differ between hosts; only used when no zone can be resolved at all.
    pub fn from_host_clock(instant: DateTime<Utc>) -> Self {
        Self::from_datetime(&instant.with_timezone(&Local))
    }

    fn from_datetime<T: TimeZone>(dt: &DateTime<T>) -> Self {
        let hour = dt.hour();
        Self {
            day_of_week: dt.weekday().into(),
            hour: hour as u8,
            minute_of_day: (hour * 60 + dt.minute()) as u16,
            date: dt.date_naive(),
        }
    }

    /// `YYYY-MM-DD`
    pub fn date_str(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Override key governing a slot that starts at these parts.
    pub fn override_key(&self) -> OverrideKey {
        OverrideKey::new(self.date, self.hour)
    }
}

/// Decomposes `instant` in the named zone, or on the host clock when `timezone` is `None`.
pub fn resolve_local_parts(
    instant: DateTime<Utc>,
    timezone: Option<&str>,
) -> Result<LocalParts, InvalidTimezone> {
    match timezone {
        Some(name) => Ok(LocalParts::in_zone(instant, parse_timezone(name)?)),
        None => Ok(LocalParts::from_host_clock(instant)),
    }
}
