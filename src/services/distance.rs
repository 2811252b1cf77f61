use crate::constants::{TRANSIT_MAX_DISTANCE_KM, WALKING_MAX_DISTANCE_KM};
use crate::error::Result;
use crate::models::{Coordinates, DistanceEntry, DistanceMatrixRow, SavedPlace, TravelMode};
use tracing::debug;

/// Great-circle distance in kilometers.
pub fn haversine_distance(a: &Coordinates, b: &Coordinates) -> f64 {
    a.distance_to(b)
}

/// Travel time in whole minutes at the mode's assumed average speed.
pub fn estimate_travel_time(distance_km: f64, mode: TravelMode) -> u32 {
    let hours = distance_km / mode.speed_kmh();
    (hours * 60.0).round().max(0.0) as u32
}

/// Mode used for a pair of places in the distance matrix.
pub fn travel_mode_for_distance(distance_km: f64) -> TravelMode {
    if distance_km <= WALKING_MAX_DISTANCE_KM {
        TravelMode::Walking
    } else if distance_km <= TRANSIT_MAX_DISTANCE_KM {
        TravelMode::Transit
    } else {
        TravelMode::Driving
    }
}

/// Distances from every geocoded place to every other geocoded place.
///
/// Places without coordinates are left out entirely. A single geocoded
/// place yields one row with no entries.
pub fn create_distance_matrix(places: &[SavedPlace]) -> Result<Vec<DistanceMatrixRow>> {
    let located = located_places(places)?;

    let matrix: Vec<DistanceMatrixRow> = located
        .iter()
        .enumerate()
        .map(|(i, (from_place, from))| {
            let distances_to = located
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, (to_place, to))| {
                    let distance_km = haversine_distance(from, to);
                    let mode = travel_mode_for_distance(distance_km);
                    DistanceEntry {
                        to_place_id: to_place.id.clone(),
                        from: *from,
                        to: *to,
                        distance_km,
                        travel_time_min: estimate_travel_time(distance_km, mode),
                        transport_type: mode,
                    }
                })
                .collect();

            DistanceMatrixRow {
                place_id: from_place.id.clone(),
                place_name: from_place.name.clone(),
                distances_to,
            }
        })
        .collect();

    debug!(
        "Built distance matrix for {} of {} places",
        matrix.len(),
        places.len()
    );

    Ok(matrix)
}

/// Geocoded places paired with their coordinates, in input order.
pub(crate) fn located_places(places: &[SavedPlace]) -> Result<Vec<(&SavedPlace, Coordinates)>> {
    let mut located = Vec::with_capacity(places.len());
    for place in places {
        if let Some(coords) = place.coordinates()? {
            located.push((place, coords));
        }
    }
    Ok(located)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn c(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    #[test]
    fn haversine_is_symmetric() {
        let pairs = [
            (c(48.8566, 2.3522), c(41.9028, 12.4964)),
            (c(-33.8688, 151.2093), c(35.6762, 139.6503)),
            (c(0.0, 179.9), c(0.0, -179.9)),
        ];
        for (a, b) in pairs {
            assert!((haversine_distance(&a, &b) - haversine_distance(&b, &a)).abs() < 1e-9);
        }
    }

    #[test]
    fn haversine_identity_is_zero() {
        let a = c(40.4168, -3.7038);
        assert_eq!(haversine_distance(&a, &a), 0.0);
    }

    #[test]
    fn one_km_at_equator() {
        let d = haversine_distance(&c(0.0, 0.0), &c(0.0, 0.009));
        assert!((d - 1.0).abs() < 0.01, "got {d}");
    }

    #[test]
    fn five_km_walk_is_one_hour() {
        assert_eq!(estimate_travel_time(5.0, TravelMode::Walking), 60);
        assert_eq!(estimate_travel_time(30.0, TravelMode::Driving), 60);
        assert_eq!(estimate_travel_time(10.0, TravelMode::Transit), 30);
        assert_eq!(estimate_travel_time(0.0, TravelMode::Walking), 0);
    }

    #[test]
    fn mode_thresholds_are_inclusive() {
        assert_eq!(travel_mode_for_distance(0.0), TravelMode::Walking);
        assert_eq!(travel_mode_for_distance(1.0), TravelMode::Walking);
        assert_eq!(travel_mode_for_distance(1.000_001), TravelMode::Transit);
        assert_eq!(travel_mode_for_distance(10.0), TravelMode::Transit);
        assert_eq!(travel_mode_for_distance(10.000_001), TravelMode::Driving);
    }

    #[test]
    fn empty_matrix() {
        assert!(create_distance_matrix(&[]).unwrap().is_empty());
    }

    #[test]
    fn single_place_has_no_outgoing_distances() {
        let places = vec![SavedPlace::new("a", "Only", "park").at(48.85, 2.35)];
        let matrix = create_distance_matrix(&places).unwrap();
        assert_eq!(matrix.len(), 1);
        assert!(matrix[0].distances_to.is_empty());
    }

    #[test]
    fn same_point_is_zero_minute_walk() {
        let places = vec![
            SavedPlace::new("a", "Here", "cafe").at(48.85, 2.35),
            SavedPlace::new("b", "Also here", "cafe").at(48.85, 2.35),
        ];
        let matrix = create_distance_matrix(&places).unwrap();
        let entry = &matrix[0].distances_to[0];
        assert_eq!(entry.distance_km, 0.0);
        assert_eq!(entry.transport_type, TravelMode::Walking);
        assert_eq!(entry.travel_time_min, 0);
    }

    #[test]
    fn matrix_assigns_modes_and_skips_unresolved() {
        let places = vec![
            SavedPlace::new("near", "Near", "museum").at(0.0, 0.001),
            SavedPlace::new("mid", "Mid", "museum").at(0.0, 0.05),
            SavedPlace::new("far", "Far", "museum").at(0.0, 0.5),
            SavedPlace::new("ghost", "Not geocoded", "museum"),
        ];
        let matrix = create_distance_matrix(&places).unwrap();
        assert_eq!(matrix.len(), 3);

        let from_near = &matrix[0];
        assert_eq!(from_near.distances_to.len(), 2);
        let to_mid = &from_near.distances_to[0];
        let to_far = &from_near.distances_to[1];
        assert_eq!(to_mid.to_place_id, "mid");
        assert_eq!(to_mid.transport_type, TravelMode::Transit);
        assert_eq!(to_far.transport_type, TravelMode::Driving);
        assert_eq!(
            to_far.travel_time_min,
            estimate_travel_time(to_far.distance_km, TravelMode::Driving)
        );
    }

    #[test]
    fn invalid_coordinates_are_rejected() {
        let places = vec![SavedPlace::new("bad", "Bad", "other").at(10.0, 200.0)];
        assert!(matches!(
            create_distance_matrix(&places),
            Err(AppError::InvalidInput(_))
        ));
    }
}
