use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::types::Booking;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::booking::{BookingStore, NewBooking},
    error::BookingServiceError,
};

/// SQLSTATE raised by the `bookings_no_overlap` exclusion constraint.
const EXCLUSION_VIOLATION: &str = "23P01";

const BOOKING_COLUMNS: &str = "id, workspace_id, event_type_id, service_provider_id, department_id, \
     contact_id, invitee_name, invitee_email, invitee_phone, notes, start_at, end_at, status, created_at";

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_exclusion_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(EXCLUSION_VIOLATION))
}

#[async_trait]
impl BookingStore for PgBookingStore {
    #[tracing::instrument(skip(self))]
    async fn list_bookings_for_range(
        &self,
        workspace_id: Uuid,
        service_provider_id: Option<Uuid>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, BookingServiceError> {
        let sql = format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE workspace_id = $1
              AND ($2::uuid IS NULL OR service_provider_id = $2)
              AND start_at < $4
              AND COALESCE(end_at, start_at) >= $3
            ORDER BY start_at
            "#
        );
        let output = sqlx::query_as::<_, Booking>(&sql)
            .bind(workspace_id)
            .bind(service_provider_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(count = output.len(), "Loaded bookings for range");
        Ok(output)
    }

    #[tracing::instrument(skip(self, booking), fields(workspace_id = %booking.workspace_id))]
    async fn insert(&self, booking: NewBooking) -> Result<Booking, BookingServiceError> {
        let sql = format!(
            r#"
            INSERT INTO bookings (
                workspace_id, event_type_id, service_provider_id, department_id,
                invitee_name, invitee_email, invitee_phone, notes, start_at, end_at, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {BOOKING_COLUMNS}
            "#
        );
        let output = sqlx::query_as::<_, Booking>(&sql)
            .bind(booking.workspace_id)
            .bind(booking.event_type_id)
            .bind(booking.service_provider_id)
            .bind(booking.department_id)
            .bind(&booking.invitee_name)
            .bind(&booking.invitee_email)
            .bind(&booking.invitee_phone)
            .bind(&booking.notes)
            .bind(booking.start_at)
            .bind(booking.end_at)
            .bind(booking.status)
            .fetch_one(&self.pool)
            .await;

        match output {
            Ok(row) => Ok(row),
            Err(e) if is_exclusion_violation(&e) => {
                tracing::info!(start_at = %booking.start_at, "Insert lost the race to an overlapping booking");
                Err(BookingServiceError::Conflict(
                    "Requested time overlaps an existing booking".into(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn link_contact(
        &self,
        booking_id: Uuid,
        contact_id: Uuid,
    ) -> Result<(), BookingServiceError> {
        let output = sqlx::query(
            r#"
            UPDATE bookings
            SET contact_id = $2
            WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .bind(contact_id)
        .execute(&self.pool)
        .await?;

        if output.rows_affected() == 0 {
            return Err(BookingServiceError::NotFound(format!(
                "Booking {booking_id} not found"
            )));
        }

        Ok(())
    }
}
