use crate::constants::{LEARNING_THRESHOLD, MAX_LEARNING_SAMPLES};
use crate::models::{Coordinates, SavedPlace};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Learned arrival distances for one place category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RadiusLearningData {
    pub category: String,
    /// Oldest first, at most [`MAX_LEARNING_SAMPLES`] entries.
    pub confirmed_distances: Vec<f64>,
    /// Recency-weighted mean of `confirmed_distances`.
    pub average_distance: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

impl RadiusLearningData {
    pub fn new(category: impl Into<String>, now: OffsetDateTime) -> Self {
        RadiusLearningData {
            category: category.into(),
            confirmed_distances: Vec::new(),
            average_distance: 0.0,
            last_updated: now,
        }
    }

    /// Append a sample, evicting the oldest beyond the cap, and recompute the
    /// average.
    pub fn push(&mut self, distance_m: f64, now: OffsetDateTime) {
        self.confirmed_distances.push(distance_m);
        if self.confirmed_distances.len() > MAX_LEARNING_SAMPLES {
            let excess = self.confirmed_distances.len() - MAX_LEARNING_SAMPLES;
            self.confirmed_distances.drain(..excess);
        }
        self.average_distance = recency_weighted_mean(&self.confirmed_distances);
        self.last_updated = now;
    }

    pub fn sample_count(&self) -> usize {
        self.confirmed_distances.len()
    }

    /// Whether enough samples exist for the average to affect the radius.
    pub fn is_learned(&self) -> bool {
        self.sample_count() >= LEARNING_THRESHOLD
    }

    /// Repair an entry read back from storage. Drops invalid samples,
    /// enforces the cap and recomputes the average. Returns `false` when
    /// nothing usable remains.
    pub fn sanitize(&mut self) -> bool {
        let before = self.confirmed_distances.len();
        self.confirmed_distances
            .retain(|d| d.is_finite() && *d >= 0.0);
        if self.confirmed_distances.len() > MAX_LEARNING_SAMPLES {
            let excess = self.confirmed_distances.len() - MAX_LEARNING_SAMPLES;
            self.confirmed_distances.drain(..excess);
        }
        if self.confirmed_distances.len() != before {
            tracing::warn!(
                category = %self.category,
                "Discarded {} invalid or excess learning samples",
                before - self.confirmed_distances.len()
            );
        }
        self.average_distance = recency_weighted_mean(&self.confirmed_distances);
        !self.confirmed_distances.is_empty()
    }
}

/// Weighted mean where the i-th sample (0-indexed, oldest first) of N has
/// weight `(i + 1) / N`. Empty input yields 0.
pub fn recency_weighted_mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as f64;
    let (weighted_sum, total_weight) = samples.iter().enumerate().fold(
        (0.0, 0.0),
        |(sum, total), (i, d)| {
            let weight = (i as f64 + 1.0) / n;
            (sum + d * weight, total + weight)
        },
    );
    weighted_sum / total_weight
}

/// One confirmed arrival, as fed into the learning data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArrivalRecord {
    pub place_id: String,
    pub place_name: String,
    pub category: String,
    pub confirmed_distance: f64,
    pub user_speed: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Outcome of an arrival check, with the signals that contributed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArrivalDecision {
    pub confirmed: bool,
    pub confidence: f64,
    pub radius: f64,
    pub reasons: Vec<String>,
}

/// User position and travel direction used to choose between places that
/// are too close together to separate by distance alone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HeadingHint {
    pub position: Coordinates,
    /// Degrees clockwise from north.
    pub heading_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NearbyCandidate {
    pub place: SavedPlace,
    /// Current distance from the user, meters.
    pub distance_m: f64,
}

/// Per-category summary of the learning state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryLearningStats {
    pub category: String,
    pub sample_count: usize,
    pub average_distance: f64,
    pub learned: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

impl From<&RadiusLearningData> for CategoryLearningStats {
    fn from(data: &RadiusLearningData) -> Self {
        CategoryLearningStats {
            category: data.category.clone(),
            sample_count: data.sample_count(),
            average_distance: data.average_distance,
            learned: data.is_learned(),
            last_updated: data.last_updated,
        }
    }
}

// Request/Response types for API endpoints

#[derive(Debug, Deserialize)]
pub struct RadiusRequest {
    pub place: SavedPlace,
    #[serde(default)]
    pub user_speed: f64,
    #[serde(default)]
    pub base_radius: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RadiusResponse {
    pub radius: f64,
}

#[derive(Debug, Deserialize)]
pub struct ArrivalCheckRequest {
    pub place: SavedPlace,
    pub current_distance: f64,
    #[serde(default)]
    pub user_speed: f64,
    #[serde(default)]
    pub dwell_time_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmArrivalRequest {
    pub place: SavedPlace,
    pub confirmed_distance: f64,
    #[serde(default)]
    pub user_speed: f64,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub candidates: Vec<NearbyCandidate>,
    #[serde(default)]
    pub heading: Option<HeadingHint>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub place: Option<SavedPlace>,
}

#[derive(Debug, Serialize)]
pub struct LearningStatsResponse {
    pub categories: Vec<CategoryLearningStats>,
}
