use async_trait::async_trait;
use shared::types::{AvailabilitySettings, EventType};
use uuid::Uuid;

use crate::error::BookingServiceError;

/// Read side of workspace configuration.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// `None` when the workspace has no settings record.
    async fn get_availability_settings(
        &self,
        workspace_id: Uuid,
    ) -> Result<Option<AvailabilitySettings>, BookingServiceError>;

    async fn get_event_type(
        &self,
        workspace_id: Uuid,
        event_type_id: Uuid,
    ) -> Result<Option<EventType>, BookingServiceError>;
}
