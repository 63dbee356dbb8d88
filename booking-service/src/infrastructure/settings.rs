use async_trait::async_trait;
use shared::types::{AvailabilitySettings, EventType};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{domain::settings::ConfigurationStore, error::BookingServiceError};

/// Settings are stored as one JSONB document per workspace and decoded into the
/// typed schedule on read, so malformed documents fail here rather than in the gate.
pub struct PgConfigurationStore {
    pool: PgPool,
}

impl PgConfigurationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigurationStore for PgConfigurationStore {
    #[tracing::instrument(skip(self))]
    async fn get_availability_settings(
        &self,
        workspace_id: Uuid,
    ) -> Result<Option<AvailabilitySettings>, BookingServiceError> {
        let output = sqlx::query_scalar::<_, Json<AvailabilitySettings>>(
            r#"
            SELECT settings
            FROM workspace_availability_settings
            WHERE workspace_id = $1
            "#,
        )
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output.map(|Json(settings)| settings))
    }

    #[tracing::instrument(skip(self))]
    async fn get_event_type(
        &self,
        workspace_id: Uuid,
        event_type_id: Uuid,
    ) -> Result<Option<EventType>, BookingServiceError> {
        let output = sqlx::query_as::<_, EventType>(
            r#"
            SELECT id, workspace_id, name, duration_minutes
            FROM event_types
            WHERE id = $1 AND workspace_id = $2
            "#,
        )
        .bind(event_type_id)
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }
}
