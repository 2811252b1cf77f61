pub mod arrival;
pub mod debug;
pub mod distance;
pub mod itinerary;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/distance/matrix", post(distance::distance_matrix))
        .route("/distance/pair", post(distance::pair_distance))
        .route("/routes/optimize", post(itinerary::optimize_route))
        .route("/routes/time", post(itinerary::route_time))
        .route("/routes/geojson", post(itinerary::route_geojson))
        .route("/trips/analyze", post(itinerary::analyze_trip))
        .route("/trips/plan", post(itinerary::plan_trip))
        .route(
            "/sessions/{session_id}/arrivals/radius",
            post(arrival::arrival_radius),
        )
        .route(
            "/sessions/{session_id}/arrivals/check",
            post(arrival::check_arrival),
        )
        .route(
            "/sessions/{session_id}/arrivals/confirm",
            post(arrival::confirm_arrival),
        )
        .route(
            "/sessions/{session_id}/arrivals/resolve",
            post(arrival::resolve_arrival),
        )
        .route(
            "/sessions/{session_id}/learning",
            get(arrival::learning_stats).delete(arrival::reset_learning),
        )
        .route(
            "/sessions/{session_id}/learning/{category}",
            delete(arrival::reset_learning_category),
        )
        .route("/debug/health", get(debug::health_check))
        .with_state(state)
}
