use crate::constants::*;
use crate::error::Result;
use crate::models::trip::{GroupSummary, MultiDestinationPlan, RouteSegment};
use crate::models::{
    Coordinates, GroupKey, MultiDestinationAnalysis, PlaceGroup, SavedPlace, TransportMode,
};
use crate::services::distance::haversine_distance;
use crate::services::route_optimizer::{calculate_route_time, optimize_route_order};
use geo::{Centroid, MultiPoint, Point};
use tracing::debug;

/// Group places by `(country, region)`, in order of first appearance.
pub fn group_places_by_geography(places: &[SavedPlace]) -> Result<Vec<PlaceGroup>> {
    let mut groups: Vec<PlaceGroup> = Vec::new();

    for place in places {
        // validates coordinates up front so centroids never see bad input
        place.coordinates()?;
        let key = group_key(place);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.places.push(place.clone()),
            None => groups.push(PlaceGroup {
                key,
                places: vec![place.clone()],
                center: None,
            }),
        }
    }

    for group in &mut groups {
        group.center = group_center(&group.places)?;
    }

    Ok(groups)
}

/// Structured country/region fields win; missing ones are taken from the
/// free-text destination name ("Region, ..., Country").
fn group_key(place: &SavedPlace) -> GroupKey {
    let (parsed_country, parsed_region) = place
        .destination_name
        .as_deref()
        .map(parse_destination_name)
        .unwrap_or_else(|| (UNKNOWN_LOCATION.to_string(), UNKNOWN_LOCATION.to_string()));

    let country = non_empty(place.country.as_deref()).unwrap_or(parsed_country);
    let region = non_empty(place.region.as_deref())
        .or_else(|| non_empty(place.city.as_deref()))
        .unwrap_or(parsed_region);

    GroupKey { country, region }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Returns `(country, region)`.
fn parse_destination_name(name: &str) -> (String, String) {
    let parts: Vec<&str> = name
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    match parts.as_slice() {
        [] => (UNKNOWN_LOCATION.to_string(), UNKNOWN_LOCATION.to_string()),
        [only] => (UNKNOWN_LOCATION.to_string(), only.to_string()),
        [first, .., last] => (last.to_string(), first.to_string()),
    }
}

fn group_center(places: &[SavedPlace]) -> Result<Option<Coordinates>> {
    let mut points: Vec<Point<f64>> = Vec::new();
    for place in places {
        if let Some(coords) = place.coordinates()? {
            points.push(coords.into());
        }
    }
    Ok(MultiPoint::from(points).centroid().map(Coordinates::from))
}

fn max_center_distance(groups: &[PlaceGroup]) -> f64 {
    let centers: Vec<Coordinates> = groups.iter().filter_map(|g| g.center).collect();
    let mut max_distance: f64 = 0.0;
    for (i, a) in centers.iter().enumerate() {
        for b in &centers[i + 1..] {
            max_distance = max_distance.max(haversine_distance(a, b));
        }
    }
    max_distance
}

/// First matching threshold wins.
pub fn recommend_transport_mode(max_distance_km: f64) -> TransportMode {
    if max_distance_km > DRIVE_RECOMMENDATION_KM {
        TransportMode::Drive
    } else if max_distance_km > TRANSIT_RECOMMENDATION_KM {
        TransportMode::Transit
    } else if max_distance_km > BIKE_RECOMMENDATION_KM {
        TransportMode::Bike
    } else {
        TransportMode::Walk
    }
}

/// Decide whether the trip covers several destinations and how to get
/// around.
pub fn analyze_multi_destination(places: &[SavedPlace]) -> Result<MultiDestinationAnalysis> {
    let groups = group_places_by_geography(places)?;
    Ok(analyze_groups(&groups))
}

fn analyze_groups(groups: &[PlaceGroup]) -> MultiDestinationAnalysis {
    let max_distance_km = max_center_distance(groups);
    let is_multi_destination =
        groups.len() > 1 || max_distance_km > MULTI_DESTINATION_DISTANCE_KM;
    let recommended_transport_mode = recommend_transport_mode(max_distance_km);

    let mut suggestions = Vec::new();
    if groups.len() > 1 {
        let names: Vec<String> = groups.iter().map(|g| g.key.to_string()).collect();
        suggestions.push(format!(
            "Trip spans {} regions: {}",
            groups.len(),
            names.join("; ")
        ));
    }
    if max_distance_km > MULTI_DESTINATION_DISTANCE_KM {
        suggestions.push(format!(
            "Destinations are up to {:.0} km apart; plan travel days between them",
            max_distance_km
        ));
    }
    if groups.len() > SPLIT_SUGGESTION_GROUP_COUNT {
        suggestions.push("Consider splitting into separate routes per destination".to_string());
    }
    if !is_multi_destination && !groups.is_empty() {
        suggestions.push(format!(
            "All places fit in a single route; getting around by {} works",
            recommended_transport_mode
        ));
    }

    debug!(
        groups = groups.len(),
        max_distance_km,
        is_multi_destination,
        "Analyzed trip geography"
    );

    MultiDestinationAnalysis {
        is_multi_destination,
        groups: groups.iter().map(GroupSummary::from).collect(),
        max_distance_km,
        recommended_transport_mode,
        suggestions,
    }
}

/// Visit destinations in nearest-neighbor order of their centers (starting
/// with the first destination), optimizing the route inside each one.
/// Destinations without any geocoded place go last.
pub fn plan_multi_destination_route(places: &[SavedPlace]) -> Result<MultiDestinationPlan> {
    let groups = group_places_by_geography(places)?;
    let analysis = analyze_groups(&groups);

    let mut remaining: Vec<usize> = (0..groups.len()).collect();
    let mut group_order: Vec<usize> = Vec::with_capacity(groups.len());

    if let Some(pos) = remaining.iter().position(|&i| groups[i].center.is_some()) {
        let mut current = remaining.remove(pos);
        group_order.push(current);
        loop {
            let Some(from) = groups[current].center else { break };
            let next = remaining
                .iter()
                .enumerate()
                .filter_map(|(pos, &i)| {
                    groups[i]
                        .center
                        .map(|c| (pos, haversine_distance(&from, &c)))
                })
                .fold(None, |best: Option<(usize, f64)>, (pos, d)| match best {
                    Some((_, best_d)) if best_d <= d => best,
                    _ => Some((pos, d)),
                });
            match next {
                Some((pos, _)) => {
                    current = remaining.remove(pos);
                    group_order.push(current);
                }
                None => break,
            }
        }
    }
    group_order.extend(remaining);

    let mut segments = Vec::with_capacity(group_order.len());
    for idx in group_order {
        let group = &groups[idx];
        let ordered = optimize_route_order(&group.places)?;
        let time = calculate_route_time(&ordered)?;
        segments.push(RouteSegment {
            key: group.key.clone(),
            places: ordered,
            time,
        });
    }

    let places = segments
        .iter()
        .flat_map(|s| s.places.iter().cloned())
        .collect();

    Ok(MultiDestinationPlan {
        segments,
        places,
        analysis,
    })
}
