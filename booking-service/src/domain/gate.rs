//! The booking decision, shared by both ingress paths and the slot list.
//!
//! Every check here is pure; the service fetches data and calls these in order.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use shared::time::LocalParts;
use shared::types::{Booking, ExternalBusyPeriod};

use crate::domain::conflict::{self, ConflictScope, Interval};
use crate::domain::feasibility::{self, SlotWindow};
use crate::domain::rejection::Rejection;
use crate::domain::schedule::EffectiveSchedule;

pub fn check_not_past(now: DateTime<Utc>, start_at: DateTime<Utc>) -> Result<(), Rejection> {
    if start_at < now {
        return Err(Rejection::PastTime { start_at });
    }
    Ok(())
}

/// Localizes the interval in `timezone` and runs the feasibility rules.
pub fn check_schedule(
    schedule: &EffectiveSchedule,
    timezone: Tz,
    interval: &Interval,
) -> Result<(), Rejection> {
    let parts = LocalParts::in_zone(interval.start, timezone);
    let slot = SlotWindow::new(parts, interval.duration_minutes());
    feasibility::evaluate(schedule, &slot)
}

pub use conflict::check_conflicts;

/// Everything a decision needs, already fetched.
pub struct GateInputs<'a> {
    pub schedule: &'a EffectiveSchedule,
    pub timezone: Tz,
    pub scope: ConflictScope,
    pub bookings: &'a [Booking],
    pub busy: &'a [ExternalBusyPeriod],
    pub now: DateTime<Utc>,
}

impl GateInputs<'_> {
    /// Full verdict for one interval: past time, then schedule, then conflicts.
    pub fn assess(&self, interval: &Interval) -> Result<(), Rejection> {
        check_not_past(self.now, interval.start)?;
        check_schedule(self.schedule, self.timezone, interval)?;
        check_conflicts(interval, self.bookings, self.busy, self.scope)
    }
}
