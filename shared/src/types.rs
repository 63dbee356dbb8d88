use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

// region: Schedule Types

/// Day key of a weekly schedule. Sunday is index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub const ALL: [Self; 7] = [
        Self::Sunday,
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
    ];

    /// Sunday-based index, 0..=6.
    pub fn index(self) -> u8 {
        match self {
            Self::Sunday => 0,
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Sun => Self::Sunday,
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid clock time {0:?}, expected HH:MM between 00:00 and 24:00")]
pub struct ClockTimeError(pub String);

/// Wall-clock time of day stored as minutes since midnight.
///
/// Parsed from `"HH:MM"`. `"24:00"` is accepted so a day can close at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: Self = Self(0);
    pub const END_OF_DAY: Self = Self(24 * 60);

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        let total = u32::from(hour) * 60 + u32::from(minute);
        (minute < 60 && total <= 24 * 60).then(|| Self(total as u16))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = ClockTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ClockTimeError(s.to_owned());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(err());
        }
        let hour: u16 = h.parse().map_err(|_| err())?;
        let minute: u16 = m.parse().map_err(|_| err())?;
        Self::from_hm(hour, minute).ok_or_else(err)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ClockTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub enabled: bool,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(default)]
    pub breaks: Vec<BreakWindow>,
}

impl DaySchedule {
    /// An open day is usable only when its window is non-empty.
    pub fn is_well_formed(&self) -> bool {
        self.start_time < self.end_time
    }
}

/// Per-weekday open hours ("timesheet").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklySchedule {
    pub days: BTreeMap<DayOfWeek, DaySchedule>,
}

impl WeeklySchedule {
    pub fn get(&self, day: DayOfWeek) -> Option<&DaySchedule> {
        self.days.get(&day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid individual override key {0:?}, expected YYYY-MM-DD-H")]
pub struct OverrideKeyError(pub String);

/// Key of an individual override: local calendar date plus local hour of day.
///
/// The textual form is `YYYY-MM-DD-H` with an unpadded hour, e.g. `2024-06-10-9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OverrideKey {
    pub date: NaiveDate,
    pub hour: u8,
}

impl OverrideKey {
    pub fn new(date: NaiveDate, hour: u8) -> Self {
        Self { date, hour }
    }
}

impl FromStr for OverrideKey {
    type Err = OverrideKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || OverrideKeyError(s.to_owned());
        let (date, hour) = s.trim().rsplit_once('-').ok_or_else(err)?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| err())?;
        let hour: u8 = hour.parse().map_err(|_| err())?;
        if hour > 23 {
            return Err(err());
        }
        Ok(Self { date, hour })
    }
}

impl TryFrom<String> for OverrideKey {
    type Error = OverrideKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OverrideKey> for String {
    fn from(key: OverrideKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.date.format("%Y-%m-%d"), self.hour)
    }
}

/// One-off allow/deny flags per local date and hour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndividualOverrides {
    pub entries: BTreeMap<OverrideKey, bool>,
}

impl IndividualOverrides {
    pub fn get(&self, key: &OverrideKey) -> Option<bool> {
        self.entries.get(key).copied()
    }
}

/// Partial schedule owned by a single service provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOverrideLayer {
    #[serde(default)]
    pub weekly_schedule: Option<WeeklySchedule>,
    #[serde(default)]
    pub individual_overrides: Option<IndividualOverrides>,
}

/// Availability configuration record of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySettings {
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub auto_confirm: bool,
    #[serde(default)]
    pub weekly_schedule: WeeklySchedule,
    #[serde(default)]
    pub individual_overrides: IndividualOverrides,
    #[serde(default)]
    pub providers: HashMap<Uuid, ProviderOverrideLayer>,
}

// endregion: Schedule Types

// region: Booking Types

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Rescheduled,
}

impl BookingStatus {
    /// Cancelled bookings release their time range.
    pub fn occupies_time(self) -> bool {
        self != Self::Cancelled
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub event_type_id: Option<Uuid>,
    pub service_provider_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub invitee_name: String,
    pub invitee_email: Option<String>,
    pub invitee_phone: Option<String>,
    pub notes: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Busy interval reported by a third-party calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalBusyPeriod {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventType {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub duration_minutes: Option<i32>,
}

// endregion: Booking Types
