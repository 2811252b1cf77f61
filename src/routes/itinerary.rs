use crate::error::Result;
use crate::models::route::{GeoJsonRouteRequest, OptimizedRouteResponse, PlacesRequest, RouteTime};
use crate::models::trip::{MultiDestinationAnalysis, MultiDestinationPlan};
use crate::services::multi_destination::{analyze_multi_destination, plan_multi_destination_route};
use crate::services::route_optimizer::{calculate_route_time, optimize_route_order, route_to_geojson};
use axum::Json;
use geojson::FeatureCollection;

/// POST /routes/optimize
/// Reorder places into a nearest-neighbor tour and time it
pub async fn optimize_route(
    Json(request): Json<PlacesRequest>,
) -> Result<Json<OptimizedRouteResponse>> {
    let places = optimize_route_order(&request.places)?;
    let time = calculate_route_time(&places)?;

    tracing::info!(
        places = places.len(),
        travel_min = time.travel_time_min,
        visit_min = time.visit_time_min,
        "Optimized route of {} places: {} min total",
        places.len(),
        time.total_time_min
    );

    Ok(Json(OptimizedRouteResponse { places, time }))
}

/// POST /routes/time
/// Time the places in the order given
pub async fn route_time(Json(request): Json<PlacesRequest>) -> Result<Json<RouteTime>> {
    Ok(Json(calculate_route_time(&request.places)?))
}

/// POST /routes/geojson
pub async fn route_geojson(
    Json(request): Json<GeoJsonRouteRequest>,
) -> Result<Json<FeatureCollection>> {
    let places = if request.optimize {
        optimize_route_order(&request.places)?
    } else {
        request.places
    };
    Ok(Json(route_to_geojson(&places)?))
}

/// POST /trips/analyze
pub async fn analyze_trip(
    Json(request): Json<PlacesRequest>,
) -> Result<Json<MultiDestinationAnalysis>> {
    let analysis = analyze_multi_destination(&request.places)?;
    tracing::debug!(
        groups = analysis.groups.len(),
        multi = analysis.is_multi_destination,
        "Trip analysis: max spread {:.1}km, recommend {}",
        analysis.max_distance_km,
        analysis.recommended_transport_mode
    );
    Ok(Json(analysis))
}

/// POST /trips/plan
/// Order destinations, then places within each destination
pub async fn plan_trip(Json(request): Json<PlacesRequest>) -> Result<Json<MultiDestinationPlan>> {
    Ok(Json(plan_multi_destination_route(&request.places)?))
}
