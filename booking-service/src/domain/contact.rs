use async_trait::async_trait;
use uuid::Uuid;

use crate::error::BookingServiceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait ContactResolver: Send + Sync {
    /// Matches on email, then phone, within the workspace; creates the contact otherwise.
    async fn find_or_create(
        &self,
        workspace_id: Uuid,
        details: ContactDetails,
    ) -> Result<Uuid, BookingServiceError>;
}
