use axum::{
    Router,
    routing::{get, patch},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, booking_history, booking_stats, cancel_booking, check_conflict, create_booking,
    get_booking, list_all_bookings, list_my_bookings, update_booking_dates, update_status,
};

/// Creates the API router with all booking endpoints
///
/// Every endpoint except /health requires the `x-user-id` header.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/bookings", get(list_all_bookings).post(create_booking))
        .route("/bookings/mine", get(list_my_bookings))
        .route("/bookings/conflicts", get(check_conflict))
        .route(
            "/bookings/:id",
            get(get_booking)
                .put(update_booking_dates)
                .delete(cancel_booking),
        )
        .route("/bookings/:id/status", patch(update_status))
        .route("/bookings/:id/history", get(booking_history))
        .route("/stats/bookings", get(booking_stats))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
