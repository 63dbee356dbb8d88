use async_trait::async_trait;
use shared::types::Booking;
use sqlx::PgPool;
use sqlx::types::Json;

use crate::{
    domain::events::{BOOKING_ACCEPTED, BookingEventSink},
    error::BookingServiceError,
};

/// Outbox writer. Delivery happens elsewhere by polling `booking_events`.
pub struct PgBookingEventSink {
    pool: PgPool,
}

impl PgBookingEventSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingEventSink for PgBookingEventSink {
    #[tracing::instrument(skip(self, booking), fields(booking_id = %booking.id))]
    async fn booking_accepted(&self, booking: Booking) -> Result<(), BookingServiceError> {
        sqlx::query(
            r#"
            INSERT INTO booking_events (booking_id, kind, payload)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(booking.id)
        .bind(BOOKING_ACCEPTED)
        .bind(Json(&booking))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
