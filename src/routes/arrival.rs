use crate::error::{AppError, Result};
use crate::models::arrival::{
    ArrivalCheckRequest, ConfirmArrivalRequest, LearningStatsResponse, RadiusRequest,
    RadiusResponse, ResolveRequest, ResolveResponse,
};
use crate::models::{ArrivalDecision, ArrivalRecord};
use crate::services::arrival::resolve_contiguous_pois;
use crate::services::session::validate_session_id;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// POST /sessions/{session_id}/arrivals/radius
pub async fn arrival_radius(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<RadiusRequest>,
) -> Result<Json<RadiusResponse>> {
    let manager = state.sessions.manager(&session_id).await?;
    let base = request
        .base_radius
        .unwrap_or(state.sessions.arrival_config().base_radius_m);
    let radius = manager.intelligent_radius_with_base(&request.place, request.user_speed, base)?;
    Ok(Json(RadiusResponse { radius }))
}

/// POST /sessions/{session_id}/arrivals/check
/// Score the current position against a place without recording anything
pub async fn check_arrival(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<ArrivalCheckRequest>,
) -> Result<Json<ArrivalDecision>> {
    let manager = state.sessions.manager(&session_id).await?;
    let decision = manager.should_confirm_arrival(
        &request.place,
        request.current_distance,
        request.user_speed,
        request.dwell_time_ms,
    )?;
    Ok(Json(decision))
}

/// POST /sessions/{session_id}/arrivals/confirm
/// Record a user-confirmed arrival as a learning sample
pub async fn confirm_arrival(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<ConfirmArrivalRequest>,
) -> Result<(StatusCode, Json<ArrivalRecord>)> {
    let manager = state.sessions.manager(&session_id).await?;
    let record = manager
        .record_confirmed_arrival(&request.place, request.confirmed_distance, request.user_speed)
        .await?;

    tracing::info!(
        session = %session_id,
        category = %record.category,
        "Arrival confirmed at '{}' ({:.1}m)",
        record.place_name,
        record.confirmed_distance
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /sessions/{session_id}/arrivals/resolve
pub async fn resolve_arrival(
    Path(session_id): Path<String>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>> {
    validate_session_id(&session_id)?;
    let place = resolve_contiguous_pois(&request.candidates, request.heading)?;
    Ok(Json(ResolveResponse { place }))
}

/// GET /sessions/{session_id}/learning
pub async fn learning_stats(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<LearningStatsResponse>> {
    let manager = state.sessions.manager(&session_id).await?;
    Ok(Json(LearningStatsResponse {
        categories: manager.learning_stats(),
    }))
}

/// DELETE /sessions/{session_id}/learning
pub async fn reset_learning(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode> {
    let manager = state.sessions.manager(&session_id).await?;
    manager.reset_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /sessions/{session_id}/learning/{category}
pub async fn reset_learning_category(
    State(state): State<Arc<AppState>>,
    Path((session_id, category)): Path<(String, String)>,
) -> Result<StatusCode> {
    let manager = state.sessions.manager(&session_id).await?;
    if manager.reset_category(&category).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "No learning data for category '{}'",
            category
        )))
    }
}
