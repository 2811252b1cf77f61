use crate::constants::{DEFAULT_VISIT_MINUTES, HIGH_PRIORITY_DISTANCE_FACTOR, MAX_VISIT_MINUTES};
use crate::error::Result;
use crate::models::{RouteTime, SavedPlace, TravelMode};
use crate::services::distance::{estimate_travel_time, haversine_distance, located_places};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;
use tracing::debug;

/// Order places with a greedy nearest-neighbor tour.
///
/// The tour starts at the first high-priority place (or the first place when
/// none is high priority). At every step the closest unvisited place is
/// chosen, with high-priority candidates' distances scaled by
/// [`HIGH_PRIORITY_DISTANCE_FACTOR`]. Ties go to the earlier input place.
///
/// Places without coordinates cannot be placed on the tour and are appended
/// after it in input order, so the result is always a permutation of the
/// input.
pub fn optimize_route_order(places: &[SavedPlace]) -> Result<Vec<SavedPlace>> {
    let located = located_places(places)?;
    if located.len() <= 1 {
        return Ok(places.to_vec());
    }

    let start = located
        .iter()
        .position(|(place, _)| place.is_high_priority())
        .unwrap_or(0);

    let mut visited = vec![false; located.len()];
    let mut order = Vec::with_capacity(places.len());
    let mut current = start;
    visited[current] = true;
    order.push(located[current].0.clone());

    while order.len() < located.len() {
        let from = located[current].1;
        let mut best: Option<(usize, f64)> = None;

        for (idx, (candidate, coords)) in located.iter().enumerate() {
            if visited[idx] {
                continue;
            }
            let mut distance = haversine_distance(&from, coords);
            if candidate.is_high_priority() {
                distance *= HIGH_PRIORITY_DISTANCE_FACTOR;
            }
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((idx, distance));
            }
        }

        let Some((next, _)) = best else { break };
        visited[next] = true;
        order.push(located[next].0.clone());
        current = next;
    }

    // located_places already rejected invalid coordinates
    let unresolved: Vec<SavedPlace> = places
        .iter()
        .filter(|p| matches!(p.coordinates(), Ok(None)))
        .cloned()
        .collect();
    if !unresolved.is_empty() {
        debug!(
            "{} place(s) without coordinates appended after optimized tour",
            unresolved.len()
        );
    }
    order.extend(unresolved);

    Ok(order)
}

/// Visit duration in minutes from a free-text estimate such as "2 hours",
/// "1.5 hours" or "45 min". Anything else counts as
/// [`DEFAULT_VISIT_MINUTES`]. Results are capped at [`MAX_VISIT_MINUTES`].
pub fn parse_visit_duration(text: &str) -> u32 {
    let lower = text.to_lowercase();
    let number = first_number(&lower);

    let minutes = if lower.contains("hour") {
        match number {
            Some(hours) => (hours * 60.0).round(),
            None => return DEFAULT_VISIT_MINUTES,
        }
    } else if lower.contains("min") {
        match number {
            Some(minutes) => minutes.trunc(),
            None => return DEFAULT_VISIT_MINUTES,
        }
    } else {
        return DEFAULT_VISIT_MINUTES;
    };

    if !minutes.is_finite() {
        return DEFAULT_VISIT_MINUTES;
    }
    minutes.min(MAX_VISIT_MINUTES as f64) as u32
}

fn first_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.trim_end_matches('.').parse().ok()
}

/// Travel and visit time for places visited in the given order.
///
/// Travel between consecutive geocoded places is estimated at walking
/// speed; every place contributes its parsed visit duration.
pub fn calculate_route_time(places: &[SavedPlace]) -> Result<RouteTime> {
    let located = located_places(places)?;

    let travel_time_min = located
        .windows(2)
        .map(|pair| {
            let distance = haversine_distance(&pair[0].1, &pair[1].1);
            estimate_travel_time(distance, TravelMode::Walking)
        })
        .fold(0u32, u32::saturating_add);

    let visit_time_min = places
        .iter()
        .map(|p| {
            p.estimated_time
                .as_deref()
                .map(parse_visit_duration)
                .unwrap_or(DEFAULT_VISIT_MINUTES)
        })
        .fold(0u32, u32::saturating_add);

    Ok(RouteTime {
        travel_time_min,
        visit_time_min,
        total_time_min: travel_time_min.saturating_add(visit_time_min),
    })
}

/// Ordered route as a GeoJSON feature collection: one point per geocoded
/// stop and, with two or more stops, a line through them.
pub fn route_to_geojson(places: &[SavedPlace]) -> Result<FeatureCollection> {
    let located = located_places(places)?;

    let mut features: Vec<Feature> = located
        .iter()
        .enumerate()
        .map(|(order, (place, coords))| {
            let mut properties = JsonObject::new();
            properties.insert("order".to_string(), json!(order + 1));
            properties.insert("id".to_string(), json!(place.id));
            properties.insert("name".to_string(), json!(place.name));
            properties.insert("category".to_string(), json!(place.category));
            if let Some(priority) = place.priority {
                properties.insert("priority".to_string(), json!(priority.to_string()));
            }

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![coords.lng, coords.lat]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    if located.len() >= 2 {
        let line = located
            .iter()
            .map(|(_, coords)| vec![coords.lng, coords.lat])
            .collect();
        let mut properties = JsonObject::new();
        properties.insert("kind".to_string(), json!("route"));
        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::LineString(line))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}
