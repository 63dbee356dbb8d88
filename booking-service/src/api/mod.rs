use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::api::{
    handler::{booking, slots},
    state::BookingAppState,
};

pub mod handler;
pub mod state;

/// Routes used by the authenticated dashboard.
pub fn dashboard_routes() -> Router<Arc<BookingAppState>> {
    Router::new()
        .route(
            "/api/v1/workspaces/{workspace_id}/bookings",
            post(booking::create_booking),
        )
        .route(
            "/api/v1/workspaces/{workspace_id}/bookings/evaluate",
            post(booking::evaluate_booking),
        )
        .route(
            "/api/v1/workspaces/{workspace_id}/slots",
            get(slots::list_slots),
        )
}

/// Routes used by the public embed widget.
pub fn embed_routes() -> Router<Arc<BookingAppState>> {
    Router::new().route(
        "/api/v1/embed/{workspace_id}/bookings",
        post(booking::create_embed_booking),
    )
}
