use crate::error::{AppError, Result};
use crate::models::route::{
    DistanceMatrixResponse, PairDistanceRequest, PairDistanceResponse, PlacesRequest,
};
use crate::services::distance::{
    create_distance_matrix, estimate_travel_time, haversine_distance, travel_mode_for_distance,
};
use axum::Json;

/// POST /distance/matrix
/// Pairwise distances between every geocoded place
pub async fn distance_matrix(
    Json(request): Json<PlacesRequest>,
) -> Result<Json<DistanceMatrixResponse>> {
    let matrix = create_distance_matrix(&request.places)?;
    tracing::debug!(
        "Distance matrix: {} places in, {} rows out",
        request.places.len(),
        matrix.len()
    );
    Ok(Json(DistanceMatrixResponse { matrix }))
}

/// POST /distance/pair
/// Distance and travel time between two points. Without an explicit mode the
/// mode is chosen from the distance.
pub async fn pair_distance(
    Json(request): Json<PairDistanceRequest>,
) -> Result<Json<PairDistanceResponse>> {
    request.validate().map_err(AppError::InvalidInput)?;

    let distance_km = haversine_distance(&request.from, &request.to);
    let mode = request
        .mode
        .unwrap_or_else(|| travel_mode_for_distance(distance_km));

    Ok(Json(PairDistanceResponse {
        distance_km,
        travel_time_min: estimate_travel_time(distance_km, mode),
        transport_type: mode,
    }))
}
