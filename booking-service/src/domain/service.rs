use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use shared::time::{Clock, SystemClock, resolve_timezone};
use shared::types::{AvailabilitySettings, Booking, BookingStatus, EventType, ExternalBusyPeriod};
use tokio_util::task::TaskTracker;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::booking::{
    BookingChannel, BookingEvaluation, BookingRequest, BookingStore, NewBooking,
    ValidBookingRequest,
};
use crate::domain::calendar::CalendarBusyProvider;
use crate::domain::config::BookingConfig;
use crate::domain::conflict::{ConflictScope, Interval};
use crate::domain::contact::{ContactDetails, ContactResolver};
use crate::domain::events::BookingEventSink;
use crate::domain::gate::{self, GateInputs};
use crate::domain::locks::BookingLocks;
use crate::domain::rejection::Rejection;
use crate::domain::schedule::merge_schedule;
use crate::domain::settings::ConfigurationStore;
use crate::domain::slots::{DaySlots, SlotQuery, generate_day_slots};
use crate::error::BookingServiceError;

/// External collaborators of the booking engine.
pub struct BookingPorts {
    pub settings: Arc<dyn ConfigurationStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub calendar: Arc<dyn CalendarBusyProvider>,
    pub contacts: Arc<dyn ContactResolver>,
    pub events: Arc<dyn BookingEventSink>,
}

/// Decides whether a requested time may become a booking, for every ingress path,
/// and previews the same decision for a whole day in the slot list.
pub struct BookingService {
    ports: BookingPorts,
    clock: Arc<dyn Clock>,
    locks: BookingLocks,
    config: BookingConfig,
    task_tracker: TaskTracker,
}

/// Reads issued concurrently for one decision.
struct Snapshot {
    settings: Result<Option<AvailabilitySettings>, BookingServiceError>,
    event_type: Result<Option<EventType>, BookingServiceError>,
    bookings: Result<Vec<Booking>, BookingServiceError>,
    busy: Vec<ExternalBusyPeriod>,
}

struct Decision {
    end_at: Option<DateTime<Utc>>,
    status: BookingStatus,
    timezone: Tz,
}

impl BookingService {
    pub fn new(ports: BookingPorts, config: BookingConfig) -> Self {
        Self {
            ports,
            clock: Arc::new(SystemClock),
            locks: BookingLocks::new(),
            config,
            task_tracker: TaskTracker::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn task_tracker(&self) -> &TaskTracker {
        &self.task_tracker
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    /// Runs the booking decision and, on acceptance, stores the booking.
    ///
    /// The decision and the insert happen under the workspace/provider lock, so two
    /// overlapping requests in this process never both pass. Contact resolution and the
    /// outbox event run afterwards in the background.
    #[tracing::instrument(skip(self, channel, request), fields(channel = channel.as_str()))]
    pub async fn create_booking(
        &self,
        workspace_id: Uuid,
        channel: BookingChannel,
        request: BookingRequest,
    ) -> Result<Booking, Rejection> {
        let request = request.validate(workspace_id)?;
        gate::check_not_past(self.clock.now(), request.start_at)?;

        let guard = self
            .locks
            .acquire(workspace_id, request.service_provider_id)
            .await;
        let outcome = async move {
            let decision = self.decide(&request).await?;
            let new_booking = NewBooking {
                workspace_id,
                event_type_id: request.event_type_id,
                service_provider_id: request.service_provider_id,
                department_id: request.department_id,
                invitee_name: request.invitee_name,
                invitee_email: request.invitee_email,
                invitee_phone: request.invitee_phone,
                notes: request.notes,
                start_at: request.start_at,
                end_at: decision.end_at,
                status: decision.status,
            };
            let booking = bounded(
                self.config.store_timeout(),
                "booking insert",
                self.ports.bookings.insert(new_booking),
            )
            .await?;
            Ok::<_, Rejection>((booking, decision.timezone))
        }
        .await;
        drop(guard);
        self.locks.prune();

        let (booking, timezone) = outcome?;
        tracing::info!(
            booking_id = %booking.id,
            status = ?booking.status,
            timezone = timezone.name(),
            "Booking accepted"
        );

        self.spawn_side_effects(booking.clone());
        Ok(booking)
    }

    /// Same decision as [`Self::create_booking`] without storing anything.
    #[tracing::instrument(skip(self, request))]
    pub async fn evaluate_booking(
        &self,
        workspace_id: Uuid,
        request: BookingRequest,
    ) -> Result<BookingEvaluation, Rejection> {
        let request = request.validate(workspace_id)?;
        gate::check_not_past(self.clock.now(), request.start_at)?;

        let decision = self.decide(&request).await?;
        Ok(BookingEvaluation {
            status: decision.status,
            start_at: request.start_at,
            end_at: decision.end_at,
            timezone: decision.timezone.name().to_owned(),
        })
    }

    /// Lists a local day's slots, each marked with the verdict the gate would give now.
    #[tracing::instrument(skip(self))]
    pub async fn list_slots(
        &self,
        workspace_id: Uuid,
        query: SlotQuery,
    ) -> Result<DaySlots, Rejection> {
        if workspace_id.is_nil() {
            return Err(Rejection::Validation("workspace_id is required".into()));
        }

        // Wide enough for any zone offset plus a day-long slot.
        let day_start = query.date.and_time(NaiveTime::MIN).and_utc();
        let window = Interval {
            start: day_start - chrono::Duration::days(1),
            end: day_start + chrono::Duration::days(2),
        };
        let snapshot = self
            .fetch(
                workspace_id,
                query.service_provider_id,
                query.event_type_id,
                window,
            )
            .await;

        let settings = require_settings(workspace_id, snapshot.settings)?;
        let event_type = require_event_type(query.event_type_id, snapshot.event_type)?;
        let duration_minutes = event_type
            .as_ref()
            .and_then(event_duration_minutes)
            .unwrap_or_else(|| self.config.slot_minutes())
            .min(24 * 60);

        let timezone = resolve_timezone(
            [query.timezone.as_deref(), settings.timezone.as_deref()],
            self.config.timezone(),
        );
        let schedule = merge_schedule(&settings, query.service_provider_id);
        let bookings = snapshot.bookings?;

        let inputs = GateInputs {
            schedule: &schedule,
            timezone,
            scope: ConflictScope::for_provider(query.service_provider_id),
            bookings: &bookings,
            busy: &snapshot.busy,
            now: self.clock.now(),
        };
        let slots = generate_day_slots(&inputs, query.date, duration_minutes);

        Ok(DaySlots {
            date: query.date,
            timezone: timezone.name().to_owned(),
            duration_minutes,
            slots,
        })
    }

    /// Settings, event type, existing bookings and calendar busy periods, read concurrently.
    async fn fetch(
        &self,
        workspace_id: Uuid,
        service_provider_id: Option<Uuid>,
        event_type_id: Option<Uuid>,
        window: Interval,
    ) -> Snapshot {
        let store_timeout = self.config.store_timeout();

        let settings = bounded(
            store_timeout,
            "availability settings",
            self.ports.settings.get_availability_settings(workspace_id),
        );
        let event_type = async {
            match event_type_id {
                Some(id) => {
                    bounded(
                        store_timeout,
                        "event type",
                        self.ports.settings.get_event_type(workspace_id, id),
                    )
                    .await
                }
                None => Ok(None),
            }
        };
        let bookings = bounded(
            store_timeout,
            "existing bookings",
            self.ports.bookings.list_bookings_for_range(
                workspace_id,
                service_provider_id,
                window.start,
                window.end,
            ),
        );
        let busy = self.fetch_busy(workspace_id, window);

        let (settings, event_type, bookings, busy) =
            tokio::join!(settings, event_type, bookings, busy);
        Snapshot {
            settings,
            event_type,
            bookings,
            busy,
        }
    }

    /// Best effort: any calendar failure skips the busy check.
    async fn fetch_busy(&self, workspace_id: Uuid, window: Interval) -> Vec<ExternalBusyPeriod> {
        let lookup = self
            .ports
            .calendar
            .get_busy_slots(workspace_id, window.start, window.end);
        match tokio::time::timeout(self.config.calendar_timeout(), lookup).await {
            Ok(Ok(busy)) => busy,
            Ok(Err(e)) => {
                tracing::warn!(%workspace_id, error = %e, "Calendar lookup failed, skipping busy check");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(%workspace_id, "Calendar lookup timed out, skipping busy check");
                Vec::new()
            }
        }
    }

    /// Settings, schedule, existing bookings, then calendar. First failure wins.
    #[tracing::instrument(skip(self, request), fields(workspace_id = %request.workspace_id))]
    async fn decide(&self, request: &ValidBookingRequest) -> Result<Decision, Rejection> {
        let lookaround = self.config.lookaround();
        let window = Interval {
            start: request.start_at - lookaround,
            end: request.start_at + lookaround,
        };
        let snapshot = self
            .fetch(
                request.workspace_id,
                request.service_provider_id,
                request.event_type_id,
                window,
            )
            .await;

        let settings = require_settings(request.workspace_id, snapshot.settings)?;
        let event_type = require_event_type(request.event_type_id, snapshot.event_type)?;

        let end_at = request.end_at.or_else(|| {
            event_type
                .as_ref()
                .and_then(event_duration_minutes)
                .map(|minutes| request.start_at + chrono::Duration::minutes(i64::from(minutes)))
        });
        let interval = Interval::new(request.start_at, end_at);

        let timezone = resolve_timezone(
            [
                request.client_timezone.as_deref(),
                settings.timezone.as_deref(),
            ],
            self.config.timezone(),
        );
        let schedule = merge_schedule(&settings, request.service_provider_id);
        gate::check_schedule(&schedule, timezone, &interval)?;

        let (bookings, busy) = if interval.end > window.end {
            // the prefetched window stops before this booking ends
            let wider = Interval {
                start: window.start,
                end: interval.end,
            };
            tracing::debug!(until = %wider.end, "Booking outlasts the prefetch window, reading again");
            let (bookings, busy) = tokio::join!(
                bounded(
                    self.config.store_timeout(),
                    "existing bookings",
                    self.ports.bookings.list_bookings_for_range(
                        request.workspace_id,
                        request.service_provider_id,
                        wider.start,
                        wider.end,
                    ),
                ),
                self.fetch_busy(request.workspace_id, wider),
            );
            (bookings?, busy)
        } else {
            (snapshot.bookings?, snapshot.busy)
        };
        gate::check_conflicts(
            &interval,
            &bookings,
            &busy,
            ConflictScope::for_provider(request.service_provider_id),
        )?;

        let status = if settings.auto_confirm {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        };
        Ok(Decision {
            end_at,
            status,
            timezone,
        })
    }

    /// Contact resolution and the outbox event. Failures are logged; the booking stands.
    fn spawn_side_effects(&self, booking: Booking) {
        let contacts = Arc::clone(&self.ports.contacts);
        let bookings = Arc::clone(&self.ports.bookings);
        let events = Arc::clone(&self.ports.events);
        let max_attempts = self.config.side_effects.max_attempts;

        let booking_id = booking.id;
        let span = tracing::info_span!("booking_side_effects", %booking_id);
        self.task_tracker.spawn(
            async move {
                let workspace_id = booking.workspace_id;
                let details = ContactDetails {
                    name: booking.invitee_name.clone(),
                    email: booking.invitee_email.clone(),
                    phone: booking.invitee_phone.clone(),
                };

                match with_retry(max_attempts, "resolve contact", || {
                    contacts.find_or_create(workspace_id, details.clone())
                })
                .await
                {
                    Ok(contact_id) => {
                        if let Err(e) = with_retry(max_attempts, "link contact", || {
                            bookings.link_contact(booking_id, contact_id)
                        })
                        .await
                        {
                            tracing::error!(%contact_id, "Failed to link contact: {e}");
                        }
                    }
                    Err(e) => tracing::error!("Failed to resolve contact: {e}"),
                }

                if let Err(e) = with_retry(max_attempts, "record booking event", || {
                    events.booking_accepted(booking.clone())
                })
                .await
                {
                    tracing::error!("Failed to record booking event: {e}");
                }
            }
            .instrument(span),
        );
    }
}

fn require_settings(
    workspace_id: Uuid,
    fetched: Result<Option<AvailabilitySettings>, BookingServiceError>,
) -> Result<AvailabilitySettings, Rejection> {
    fetched?.ok_or_else(|| {
        Rejection::Validation(format!("Workspace {workspace_id} has no availability settings"))
    })
}

fn require_event_type(
    event_type_id: Option<Uuid>,
    fetched: Result<Option<EventType>, BookingServiceError>,
) -> Result<Option<EventType>, Rejection> {
    let Some(id) = event_type_id else {
        return Ok(None);
    };
    fetched?
        .map(Some)
        .ok_or_else(|| Rejection::Validation(format!("Unknown event type {id}")))
}

fn event_duration_minutes(event_type: &EventType) -> Option<u32> {
    event_type
        .duration_minutes
        .and_then(|m| u32::try_from(m).ok())
        .filter(|m| *m > 0)
}

async fn bounded<T>(
    limit: Duration,
    what: &'static str,
    fut: impl Future<Output = Result<T, BookingServiceError>>,
) -> Result<T, BookingServiceError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| BookingServiceError::Timeout(what))?
}

/// Retries with exponential backoff starting at 100ms.
async fn with_retry<T, F, Fut>(
    max_attempts: u32,
    what: &str,
    mut op: F,
) -> Result<T, BookingServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BookingServiceError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                tracing::warn!(attempt, max_attempts, error = %e, "{what} failed, retrying");
                tokio::time::sleep(Duration::from_millis(100 * 2u64.pow(attempt - 1))).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
