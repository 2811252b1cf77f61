use crate::constants::*;
use crate::models::{Coordinates, SavedPlace};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mode used for pairwise travel-time estimates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Walking,
    Driving,
    Transit,
}

impl TravelMode {
    /// Assumed average speed for this mode.
    pub fn speed_kmh(&self) -> f64 {
        match self {
            TravelMode::Walking => WALKING_SPEED_KMH,
            TravelMode::Driving => DRIVING_SPEED_KMH,
            TravelMode::Transit => TRANSIT_SPEED_KMH,
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelMode::Walking => write!(f, "walking"),
            TravelMode::Driving => write!(f, "driving"),
            TravelMode::Transit => write!(f, "transit"),
        }
    }
}

impl FromStr for TravelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "walk" | "walking" => Ok(TravelMode::Walking),
            "drive" | "driving" | "car" => Ok(TravelMode::Driving),
            "transit" | "public_transport" => Ok(TravelMode::Transit),
            _ => Err(format!("Invalid travel mode: '{}'", s)),
        }
    }
}

/// Recommended way of getting around a whole trip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Walk,
    Bike,
    Transit,
    Drive,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Walk => write!(f, "walk"),
            TransportMode::Bike => write!(f, "bike"),
            TransportMode::Transit => write!(f, "transit"),
            TransportMode::Drive => write!(f, "drive"),
        }
    }
}

/// Distance and travel estimate from one place to another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistanceEntry {
    pub to_place_id: String,
    pub from: Coordinates,
    pub to: Coordinates,
    pub distance_km: f64,
    pub travel_time_min: u32,
    pub transport_type: TravelMode,
}

/// All outgoing distances for one place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistanceMatrixRow {
    pub place_id: String,
    pub place_name: String,
    pub distances_to: Vec<DistanceEntry>,
}

/// Time budget for visiting an ordered list of places.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RouteTime {
    pub travel_time_min: u32,
    pub visit_time_min: u32,
    pub total_time_min: u32,
}

// Request/Response types for API endpoints

#[derive(Debug, Deserialize)]
pub struct PlacesRequest {
    #[serde(default)]
    pub places: Vec<SavedPlace>,
}

#[derive(Debug, Deserialize)]
pub struct PairDistanceRequest {
    pub from: Coordinates,
    pub to: Coordinates,
    #[serde(default)]
    pub mode: Option<TravelMode>,
}

impl PairDistanceRequest {
    pub fn validate(&self) -> Result<(), String> {
        self.from.validate().map_err(|e| format!("from: {}", e))?;
        self.to.validate().map_err(|e| format!("to: {}", e))?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct PairDistanceResponse {
    pub distance_km: f64,
    pub travel_time_min: u32,
    pub transport_type: TravelMode,
}

#[derive(Debug, Serialize)]
pub struct DistanceMatrixResponse {
    pub matrix: Vec<DistanceMatrixRow>,
}

#[derive(Debug, Serialize)]
pub struct OptimizedRouteResponse {
    pub places: Vec<SavedPlace>,
    pub time: RouteTime,
}

#[derive(Debug, Deserialize)]
pub struct GeoJsonRouteRequest {
    #[serde(default)]
    pub places: Vec<SavedPlace>,
    #[serde(default)]
    pub optimize: bool,
}
