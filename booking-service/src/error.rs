use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::responses::ApiResponse;
use thiserror::Error;

use crate::domain::rejection::Rejection;

/// Infrastructure-level errors for the booking service.
///
/// Never returned to HTTP callers directly: the service turns them into a
/// [`Rejection`] (a store failure or a booking conflict) before answering.
#[derive(Debug, Error)]
pub enum BookingServiceError {
    /// Requested resource was not found.
    #[error("Not Found: {0}")]
    NotFound(String),

    /// A write collided with an existing row (e.g. the booking overlap constraint).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A store call did not answer within its deadline.
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    /// Database query or connection error.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PastTime { .. }
            | Self::DayDisabled { .. }
            | Self::OutsideHours { .. }
            | Self::BreakConflict { .. }
            | Self::IndividualOverrideDenied { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BookingConflict { .. } | Self::CalendarBusy { .. } => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        if status.is_server_error() {
            tracing::error!(reason = self.code(), error = %self, %status, "Booking store failure");
        } else {
            tracing::info!(reason = self.code(), error = %self, %status, "Booking rejected");
        }

        let body = ApiResponse::<()>::rejected(self.code(), self.to_string(), self.is_retryable());
        (status, axum::Json(body)).into_response()
    }
}
