use axum::{routing::get, Router};
use std::sync::Arc;
use tracing::info;

use crate::handlers::api::AppState;
use crate::handlers::health::health_check;
use crate::handlers::{attendees, meetings};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Health check is always available
    let health_route = Router::new().route("/health", get(health_check));

    let meeting_routes = Router::new()
        .route("/meetings", get(meetings::index).post(meetings::create))
        .route(
            "/meetings/:meeting_id",
            get(meetings::show).delete(meetings::destroy),
        )
        .route(
            "/meetings/:meeting_id/attendees",
            get(attendees::index).post(attendees::create),
        )
        .route(
            "/meetings/:meeting_id/attendees/:attendee_id",
            get(attendees::show).delete(attendees::destroy),
        );

    info!("Meeting and attendee routes enabled");

    health_route.merge(meeting_routes).with_state(app_state)
}
