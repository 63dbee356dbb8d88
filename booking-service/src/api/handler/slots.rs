use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use shared::responses::ApiResponse;
use uuid::Uuid;

use crate::{
    api::state::BookingAppState,
    domain::{
        rejection::Rejection,
        slots::{DaySlots, SlotQuery},
    },
};

#[utoipa::path(
    get,
    path = "/api/v1/workspaces/{workspace_id}/slots",
    tag = "Slots",
    operation_id = "list_slots",
    params(
        ("workspace_id" = Uuid, Path, description = "Workspace ID"),
        SlotQuery
    ),
    responses(
        (status = 200, description = "Slots of the local day", body = ApiResponse<DaySlots>),
        (status = 400, description = "Invalid query"),
        (status = 503, description = "Booking data unavailable, retry later")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_slots(
    State(state): State<Arc<BookingAppState>>,
    Path(workspace_id): Path<Uuid>,
    query: Result<Query<SlotQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<DaySlots>>, Rejection> {
    let Query(query) = query.map_err(|e| Rejection::Validation(e.body_text()))?;
    let slots = state
        .booking_service
        .list_slots(workspace_id, query)
        .await?;

    Ok(Json(ApiResponse::ok(slots)))
}
