use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::types::ExternalBusyPeriod;
use thiserror::Error;
use uuid::Uuid;

/// Calendar failures never reject a booking; they are logged and the check is skipped.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Calendar service unavailable: {0}")]
    Unavailable(String),

    #[error("Calendar service returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Calendar circuit breaker is open")]
    CircuitOpen,
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait CalendarBusyProvider: Send + Sync {
    async fn get_busy_slots(
        &self,
        workspace_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ExternalBusyPeriod>, CalendarError>;
}
