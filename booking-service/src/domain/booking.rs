use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{Booking, BookingStatus};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::rejection::Rejection;
use crate::error::BookingServiceError;

/// Which ingress path a request came through. Both reach the same decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingChannel {
    Dashboard,
    Embed,
}

impl BookingChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Embed => "embed",
        }
    }
}

/// Booking request body as sent by the dashboard or the embed widget.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookingRequest {
    pub service_provider_id: Option<Uuid>,
    pub event_type_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    /// IANA zone of the person booking, e.g. `Europe/Paris`.
    pub client_timezone: Option<String>,
    pub invitee_name: Option<String>,
    pub invitee_email: Option<String>,
    pub invitee_phone: Option<String>,
    pub notes: Option<String>,
}

/// A request whose required fields are present and consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBookingRequest {
    pub workspace_id: Uuid,
    pub service_provider_id: Option<Uuid>,
    pub event_type_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub client_timezone: Option<String>,
    pub invitee_name: String,
    pub invitee_email: Option<String>,
    pub invitee_phone: Option<String>,
    pub notes: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl BookingRequest {
    pub fn validate(self, workspace_id: Uuid) -> Result<ValidBookingRequest, Rejection> {
        if workspace_id.is_nil() {
            return Err(Rejection::Validation("workspace_id is required".into()));
        }
        let start_at = self
            .start_at
            .ok_or_else(|| Rejection::Validation("start_at is required".into()))?;
        let invitee_name = non_blank(self.invitee_name)
            .ok_or_else(|| Rejection::Validation("invitee_name is required".into()))?;
        if let Some(end_at) = self.end_at
            && end_at < start_at
        {
            return Err(Rejection::Validation(
                "end_at must not be before start_at".into(),
            ));
        }

        Ok(ValidBookingRequest {
            workspace_id,
            service_provider_id: self.service_provider_id,
            event_type_id: self.event_type_id,
            department_id: self.department_id,
            start_at,
            end_at: self.end_at,
            client_timezone: non_blank(self.client_timezone),
            invitee_name,
            invitee_email: non_blank(self.invitee_email),
            invitee_phone: non_blank(self.invitee_phone),
            notes: non_blank(self.notes),
        })
    }
}

/// Row to insert once a request has been accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub workspace_id: Uuid,
    pub event_type_id: Option<Uuid>,
    pub service_provider_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub invitee_name: String,
    pub invitee_email: Option<String>,
    pub invitee_phone: Option<String>,
    pub notes: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub status: BookingStatus,
}

/// Response body for an accepted booking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingAccepted {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
}

impl From<&Booking> for BookingAccepted {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            status: booking.status,
            start_at: booking.start_at,
            end_at: booking.end_at,
        }
    }
}

/// Outcome of a dry run: what would be stored if the request were submitted now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookingEvaluation {
    pub status: BookingStatus,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    /// Zone the request was evaluated in.
    pub timezone: String,
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Bookings overlapping `[start, end)`, any status. A provider narrows to that provider's bookings.
    async fn list_bookings_for_range(
        &self,
        workspace_id: Uuid,
        service_provider_id: Option<Uuid>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, BookingServiceError>;

    /// Fails with [`BookingServiceError::Conflict`] when the row overlaps a stored booking
    /// of the same provider.
    async fn insert(&self, booking: NewBooking) -> Result<Booking, BookingServiceError>;

    async fn link_contact(
        &self,
        booking_id: Uuid,
        contact_id: Uuid,
    ) -> Result<(), BookingServiceError>;
}
