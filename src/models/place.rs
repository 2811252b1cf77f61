use crate::error::{AppError, Result};
use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// Known place types. Free-text labels that match none of these are
/// classified as [`PlaceCategory::Other`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    // Food & drink
    Restaurant,
    Cafe,
    Bar,

    // Sightseeing
    Museum,
    Attraction,
    Park,
    Beach,

    // Logistics
    Hotel,
    Shopping,
    TrainStation,
    Airport,

    Other,
}

impl PlaceCategory {
    /// Classify a free-text category label. Never fails.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(PlaceCategory::Other)
    }

    /// Allowed geofence radius range in meters, applied after learning and
    /// speed adjustment.
    pub fn radius_constraints(&self) -> (f64, f64) {
        match self {
            PlaceCategory::Restaurant => (15.0, 80.0),
            PlaceCategory::Cafe => (10.0, 60.0),
            PlaceCategory::Bar => (10.0, 60.0),
            PlaceCategory::Museum => (20.0, 150.0),
            PlaceCategory::Attraction => (20.0, 200.0),
            PlaceCategory::Park => (50.0, 300.0),
            PlaceCategory::Beach => (50.0, 400.0),
            PlaceCategory::Hotel => (20.0, 120.0),
            PlaceCategory::Shopping => (30.0, 250.0),
            PlaceCategory::TrainStation => (50.0, 300.0),
            PlaceCategory::Airport => (100.0, 500.0),
            PlaceCategory::Other => (10.0, 100.0),
        }
    }

    /// Fixed confidence adjustment added when deciding arrival.
    pub fn confidence_bonus(&self) -> f64 {
        match self {
            PlaceCategory::Restaurant => 0.05,
            PlaceCategory::Cafe => 0.05,
            PlaceCategory::Bar => 0.05,
            PlaceCategory::Museum => 0.1,
            PlaceCategory::Attraction => 0.0,
            PlaceCategory::Park => -0.05,
            PlaceCategory::Beach => -0.05,
            PlaceCategory::Hotel => 0.1,
            PlaceCategory::Shopping => 0.0,
            PlaceCategory::TrainStation => 0.1,
            PlaceCategory::Airport => 0.2,
            PlaceCategory::Other => 0.0,
        }
    }
}

impl fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlaceCategory::Restaurant => "restaurant",
            PlaceCategory::Cafe => "cafe",
            PlaceCategory::Bar => "bar",
            PlaceCategory::Museum => "museum",
            PlaceCategory::Attraction => "attraction",
            PlaceCategory::Park => "park",
            PlaceCategory::Beach => "beach",
            PlaceCategory::Hotel => "hotel",
            PlaceCategory::Shopping => "shopping",
            PlaceCategory::TrainStation => "train_station",
            PlaceCategory::Airport => "airport",
            PlaceCategory::Other => "other",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PlaceCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "restaurant" | "food" => Ok(PlaceCategory::Restaurant),
            "cafe" | "café" | "coffee" => Ok(PlaceCategory::Cafe),
            "bar" | "pub" | "nightlife" => Ok(PlaceCategory::Bar),
            "museum" | "gallery" => Ok(PlaceCategory::Museum),
            "attraction" | "landmark" | "monument" | "sightseeing" => {
                Ok(PlaceCategory::Attraction)
            }
            "park" | "garden" | "nature" => Ok(PlaceCategory::Park),
            "beach" => Ok(PlaceCategory::Beach),
            "hotel" | "accommodation" | "lodging" => Ok(PlaceCategory::Hotel),
            "shopping" | "mall" | "market" | "store" => Ok(PlaceCategory::Shopping),
            "train_station" | "station" | "transport" => Ok(PlaceCategory::TrainStation),
            "airport" => Ok(PlaceCategory::Airport),
            "other" => Ok(PlaceCategory::Other),
            _ => Err(format!("Invalid place category: {}", s)),
        }
    }
}

/// A point of interest bookmarked inside a trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedPlace {
    pub id: String,
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

fn default_category() -> String {
    "other".to_string()
}

impl SavedPlace {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        SavedPlace {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            lat: None,
            lng: None,
            priority: None,
            estimated_time: None,
            destination_name: None,
            country: None,
            region: None,
            city: None,
        }
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.lat = Some(lat);
        self.lng = Some(lng);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_estimated_time(mut self, estimated_time: impl Into<String>) -> Self {
        self.estimated_time = Some(estimated_time.into());
        self
    }

    pub fn with_destination(mut self, destination_name: impl Into<String>) -> Self {
        self.destination_name = Some(destination_name.into());
        self
    }

    /// Resolved coordinates of the place.
    ///
    /// Absent or `(0, 0)` coordinates mean the place has not been geocoded
    /// yet and yield `Ok(None)`. Out-of-range values are rejected.
    pub fn coordinates(&self) -> Result<Option<Coordinates>> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat == 0.0 && lng == 0.0 => Ok(None),
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng).map(Some).map_err(|e| {
                AppError::InvalidInput(format!("place '{}' ({}): {}", self.name, self.id, e))
            }),
            _ => Ok(None),
        }
    }

    pub fn place_category(&self) -> PlaceCategory {
        PlaceCategory::from_label(&self.category)
    }

    /// Key under which radius learning data for this place is stored.
    pub fn learning_key(&self) -> String {
        normalize_category_label(&self.category)
    }

    pub fn is_high_priority(&self) -> bool {
        self.priority == Some(Priority::High)
    }
}

/// Lowercased, trimmed category label; empty labels become "other".
pub fn normalize_category_label(label: &str) -> String {
    let normalized = label.trim().to_lowercase();
    if normalized.is_empty() {
        default_category()
    } else {
        normalized
    }
}
