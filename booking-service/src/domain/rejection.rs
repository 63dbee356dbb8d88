use chrono::{DateTime, Utc};
use shared::types::{ClockTime, DayOfWeek, OverrideKey};
use thiserror::Error;
use uuid::Uuid;

use crate::error::BookingServiceError;

/// Why a proposed booking was refused.
///
/// Every variant is terminal and shown to the person booking; none is retried here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Requested start {start_at} is in the past")]
    PastTime { start_at: DateTime<Utc> },

    #[error("Bookings are not available on {day:?}")]
    DayDisabled { day: DayOfWeek },

    #[error("Requested time is outside working hours {start}-{end}")]
    OutsideHours { start: ClockTime, end: ClockTime },

    #[error("Requested time overlaps the break {start}-{end}")]
    BreakConflict { start: ClockTime, end: ClockTime },

    #[error("Bookings are blocked for {key}")]
    IndividualOverrideDenied { key: OverrideKey },

    #[error("Requested time overlaps an existing booking")]
    BookingConflict { booking_id: Option<Uuid> },

    #[error("Requested time overlaps a busy calendar period ({start_at} - {end_at})")]
    CalendarBusy {
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    },

    /// Configuration or booking store could not be read; the request fails closed.
    #[error("Booking data is temporarily unavailable: {0}")]
    Store(String),
}

impl Rejection {
    /// Stable reason code rendered by clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PastTime { .. } => "PAST_TIME",
            Self::DayDisabled { .. } => "DAY_DISABLED",
            Self::OutsideHours { .. } => "OUTSIDE_HOURS",
            Self::BreakConflict { .. } => "BREAK_CONFLICT",
            Self::IndividualOverrideDenied { .. } => "INDIVIDUAL_OVERRIDE_DENIED",
            Self::BookingConflict { .. } => "BOOKING_CONFLICT",
            Self::CalendarBusy { .. } => "CALENDAR_BUSY",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Store failures fail closed. A rejected insert means another booking got there first.
impl From<BookingServiceError> for Rejection {
    fn from(err: BookingServiceError) -> Self {
        match err {
            BookingServiceError::Conflict(_) => Self::BookingConflict { booking_id: None },
            BookingServiceError::Database(e) => {
                tracing::error!(error = %e, "Booking store query failed");
                Self::Store("Booking store is unavailable".into())
            }
            other => Self::Store(other.to_string()),
        }
    }
}
