use chrono::{DateTime, Utc};
use shared::types::{Booking, ExternalBusyPeriod};
use uuid::Uuid;

use crate::domain::rejection::Rejection;

/// Half-open `[start, end)` interval. A zero-length interval is a point occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// A missing end makes the interval a single point at `start`.
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            start,
            end: end.unwrap_or(start),
        }
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn duration_minutes(&self) -> u32 {
        let secs = (self.end - self.start).num_seconds().max(0);
        u32::try_from((secs + 59) / 60).unwrap_or(u32::MAX)
    }
}

impl From<&Booking> for Interval {
    fn from(booking: &Booking) -> Self {
        Self::new(booking.start_at, booking.end_at)
    }
}

impl From<&ExternalBusyPeriod> for Interval {
    fn from(period: &ExternalBusyPeriod) -> Self {
        Self {
            start: period.start_at,
            end: period.end_at,
        }
    }
}

/// Which existing bookings compete with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictScope {
    /// Only bookings held by this provider.
    Provider(Uuid),
    /// Every booking of the workspace, whoever holds it.
    Workspace,
}

impl ConflictScope {
    pub fn for_provider(provider_id: Option<Uuid>) -> Self {
        provider_id.map_or(Self::Workspace, Self::Provider)
    }

    pub fn provider_id(self) -> Option<Uuid> {
        match self {
            Self::Provider(id) => Some(id),
            Self::Workspace => None,
        }
    }

    fn includes(self, booking: &Booking) -> bool {
        match self {
            Self::Provider(id) => booking.service_provider_id == Some(id),
            Self::Workspace => true,
        }
    }
}

pub fn find_booking_conflict<'a>(
    proposed: &Interval,
    bookings: &'a [Booking],
    scope: ConflictScope,
) -> Option<&'a Booking> {
    bookings.iter().find(|b| {
        b.status.occupies_time() && scope.includes(b) && proposed.overlaps(&Interval::from(*b))
    })
}

pub fn find_busy_conflict<'a>(
    proposed: &Interval,
    busy: &'a [ExternalBusyPeriod],
) -> Option<&'a ExternalBusyPeriod> {
    busy.iter().find(|p| proposed.overlaps(&Interval::from(*p)))
}

/// Existing bookings are checked before external calendar periods.
pub fn check_conflicts(
    proposed: &Interval,
    bookings: &[Booking],
    busy: &[ExternalBusyPeriod],
    scope: ConflictScope,
) -> Result<(), Rejection> {
    if let Some(existing) = find_booking_conflict(proposed, bookings, scope) {
        return Err(Rejection::BookingConflict {
            booking_id: Some(existing.id),
        });
    }
    if let Some(period) = find_busy_conflict(proposed, busy) {
        return Err(Rejection::CalendarBusy {
            start_at: period.start_at,
            end_at: period.end_at,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::BookingStatus;

    fn at(s: &str) -> DateTime<Utc> {
        format!("2024-06-10T{s}:00Z").parse().unwrap()
    }

    fn interval(start: &str, end: &str) -> Interval {
        Interval::new(at(start), Some(at(end)))
    }

    fn booking(provider: Option<Uuid>, start: &str, end: Option<&str>, status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            workspace_id: Uuid::nil(),
            event_type_id: None,
            service_provider_id: provider,
            department_id: None,
            contact_id: None,
            invitee_name: "Ada".into(),
            invitee_email: None,
            invitee_phone: None,
            notes: None,
            start_at: at(start),
            end_at: end.map(at),
            status,
            created_at: at("00:00"),
        }
    }

    #[test]
    fn overlap_is_half_open() {
        let a = interval("10:00", "10:30");
        assert!(a.overlaps(&interval("10:15", "10:45")));
        assert!(a.overlaps(&interval("09:00", "12:00")));
        assert!(!a.overlaps(&interval("10:30", "11:00")));
        assert!(!a.overlaps(&interval("09:30", "10:00")));
    }

    #[test]
    fn endless_booking_is_a_point() {
        let p = Uuid::new_v4();
        let bookings = [booking(Some(p), "10:00", None, BookingStatus::Confirmed)];
        let scope = ConflictScope::Provider(p);

        assert!(find_booking_conflict(&interval("09:45", "10:15"), &bookings, scope).is_some());
        // a point at the very start of the proposal does not overlap [10:00, 10:30)
        assert!(find_booking_conflict(&interval("10:00", "10:30"), &bookings, scope).is_none());
        assert!(find_booking_conflict(&interval("09:30", "10:00"), &bookings, scope).is_none());
    }

    #[test]
    fn provider_scope_ignores_other_providers() {
        let p = Uuid::new_v4();
        let q = Uuid::new_v4();
        let bookings = [booking(Some(p), "10:00", Some("10:30"), BookingStatus::Confirmed)];
        let proposed = interval("10:15", "10:45");

        assert!(find_booking_conflict(&proposed, &bookings, ConflictScope::Provider(p)).is_some());
        assert!(find_booking_conflict(&proposed, &bookings, ConflictScope::Provider(q)).is_none());
        assert!(find_booking_conflict(&proposed, &bookings, ConflictScope::Workspace).is_some());
    }

    #[test]
    fn cancelled_bookings_never_conflict() {
        let bookings = [booking(None, "10:00", Some("10:30"), BookingStatus::Cancelled)];
        let proposed = interval("10:00", "10:30");
        assert!(find_booking_conflict(&proposed, &bookings, ConflictScope::Workspace).is_none());
    }

    #[test]
    fn bookings_are_reported_before_calendar() {
        let bookings = [booking(None, "10:00", Some("10:30"), BookingStatus::Pending)];
        let busy = [ExternalBusyPeriod {
            start_at: at("10:00"),
            end_at: at("11:00"),
        }];
        let proposed = interval("10:15", "10:45");

        let err = check_conflicts(&proposed, &bookings, &busy, ConflictScope::Workspace).unwrap_err();
        assert_eq!(
            err,
            Rejection::BookingConflict {
                booking_id: Some(bookings[0].id)
            }
        );

        let err = check_conflicts(&proposed, &[], &busy, ConflictScope::Workspace).unwrap_err();
        assert!(matches!(err, Rejection::CalendarBusy { .. }));
        assert_eq!(
            check_conflicts(&interval("11:00", "11:30"), &bookings, &busy, ConflictScope::Workspace),
            Ok(())
        );
    }

    #[test]
    fn duration_rounds_up_to_whole_minutes() {
        let start = at("10:00");
        assert_eq!(Interval::new(start, None).duration_minutes(), 0);
        assert_eq!(interval("10:00", "10:45").duration_minutes(), 45);
        let odd = Interval::new(start, Some(start + chrono::Duration::seconds(61)));
        assert_eq!(odd.duration_minutes(), 2);
    }
}
