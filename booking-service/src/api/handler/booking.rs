use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use shared::responses::ApiResponse;
use uuid::Uuid;

use crate::{
    api::state::BookingAppState,
    domain::{
        booking::{BookingAccepted, BookingChannel, BookingEvaluation, BookingRequest},
        rejection::Rejection,
    },
};

fn read_body(body: Result<Json<BookingRequest>, JsonRejection>) -> Result<BookingRequest, Rejection> {
    body.map(|Json(req)| req)
        .map_err(|e| Rejection::Validation(e.body_text()))
}

async fn submit(
    state: &BookingAppState,
    workspace_id: Uuid,
    channel: BookingChannel,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<BookingAccepted>>), Rejection> {
    let request = read_body(body)?;
    let booking = state
        .booking_service
        .create_booking(workspace_id, channel, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(BookingAccepted::from(&booking))),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/workspaces/{workspace_id}/bookings",
    tag = "Bookings",
    operation_id = "create_booking",
    params(("workspace_id" = Uuid, Path, description = "Workspace ID")),
    request_body = BookingRequest,
    responses(
        (status = 201, description = "Booking accepted", body = ApiResponse<BookingAccepted>),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Overlaps a booking or a busy calendar period"),
        (status = 422, description = "Outside the workspace's availability or in the past"),
        (status = 503, description = "Booking data unavailable, retry later")
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn create_booking(
    State(state): State<Arc<BookingAppState>>,
    Path(workspace_id): Path<Uuid>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Rejection> {
    submit(&state, workspace_id, BookingChannel::Dashboard, body).await
}

#[utoipa::path(
    post,
    path = "/api/v1/embed/{workspace_id}/bookings",
    tag = "Embed",
    operation_id = "create_embed_booking",
    params(("workspace_id" = Uuid, Path, description = "Workspace ID")),
    request_body = BookingRequest,
    responses(
        (status = 201, description = "Booking accepted", body = ApiResponse<BookingAccepted>),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Overlaps a booking or a busy calendar period"),
        (status = 422, description = "Outside the workspace's availability or in the past"),
        (status = 429, description = "Rate limited"),
        (status = 503, description = "Booking data unavailable, retry later")
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn create_embed_booking(
    State(state): State<Arc<BookingAppState>>,
    Path(workspace_id): Path<Uuid>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Rejection> {
    submit(&state, workspace_id, BookingChannel::Embed, body).await
}

#[utoipa::path(
    post,
    path = "/api/v1/workspaces/{workspace_id}/bookings/evaluate",
    tag = "Bookings",
    operation_id = "evaluate_booking",
    params(("workspace_id" = Uuid, Path, description = "Workspace ID")),
    request_body = BookingRequest,
    responses(
        (status = 200, description = "Request would be accepted", body = ApiResponse<BookingEvaluation>),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Overlaps a booking or a busy calendar period"),
        (status = 422, description = "Outside the workspace's availability or in the past")
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn evaluate_booking(
    State(state): State<Arc<BookingAppState>>,
    Path(workspace_id): Path<Uuid>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<BookingEvaluation>>, Rejection> {
    let request = read_body(body)?;
    let evaluation = state
        .booking_service
        .evaluate_booking(workspace_id, request)
        .await?;

    Ok(Json(ApiResponse::ok(evaluation)))
}
