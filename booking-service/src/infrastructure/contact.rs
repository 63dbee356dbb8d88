use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::contact::{ContactDetails, ContactResolver},
    error::BookingServiceError,
};

pub struct PgContactResolver {
    pool: PgPool,
}

impl PgContactResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactResolver for PgContactResolver {
    #[tracing::instrument(skip(self, details))]
    async fn find_or_create(
        &self,
        workspace_id: Uuid,
        details: ContactDetails,
    ) -> Result<Uuid, BookingServiceError> {
        let existing = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM contacts
            WHERE workspace_id = $1
              AND (
                ($2::text IS NOT NULL AND lower(email) = lower($2))
                OR ($2::text IS NULL AND $3::text IS NOT NULL AND phone = $3)
              )
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(workspace_id)
        .bind(&details.email)
        .bind(&details.phone)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(id) = existing {
            tracing::debug!(contact_id = %id, "Matched existing contact");
            return Ok(id);
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO contacts (workspace_id, name, email, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(workspace_id)
        .bind(&details.name)
        .bind(&details.email)
        .bind(&details.phone)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(contact_id = %id, "Created contact");
        Ok(id)
    }
}
