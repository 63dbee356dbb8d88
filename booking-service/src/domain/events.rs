use async_trait::async_trait;
use shared::types::Booking;

use crate::error::BookingServiceError;

pub const BOOKING_ACCEPTED: &str = "booking.accepted";

/// Records booking events for downstream delivery (notifications, webhooks).
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait BookingEventSink: Send + Sync {
    async fn booking_accepted(&self, booking: Booking) -> Result<(), BookingServiceError>;
}
