use crate::models::{Coordinates, RouteTime, SavedPlace, TransportMode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic grouping key: `(country, region)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub country: String,
    pub region: String,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.region, self.country)
    }
}

/// Places sharing a [`GroupKey`]. Derived from the place list, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceGroup {
    pub key: GroupKey,
    pub places: Vec<SavedPlace>,
    /// Mean of member coordinates; `None` when no member is geocoded.
    pub center: Option<Coordinates>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupSummary {
    pub key: GroupKey,
    pub place_count: usize,
    pub center: Option<Coordinates>,
}

impl From<&PlaceGroup> for GroupSummary {
    fn from(group: &PlaceGroup) -> Self {
        GroupSummary {
            key: group.key.clone(),
            place_count: group.places.len(),
            center: group.center,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiDestinationAnalysis {
    pub is_multi_destination: bool,
    pub groups: Vec<GroupSummary>,
    /// Largest distance between any two group centers.
    pub max_distance_km: f64,
    pub recommended_transport_mode: TransportMode,
    /// Presentation hints; wording is not part of the contract.
    pub suggestions: Vec<String>,
}

/// One destination's leg of a multi-destination plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteSegment {
    pub key: GroupKey,
    pub places: Vec<SavedPlace>,
    pub time: RouteTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiDestinationPlan {
    pub segments: Vec<RouteSegment>,
    /// Concatenation of all segment orders.
    pub places: Vec<SavedPlace>,
    pub analysis: MultiDestinationAnalysis,
}
