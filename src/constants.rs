//! Stable application-wide constants.
//!
//! Values here are algorithm coefficients, fixed threshold tables and default
//! fallbacks for env-var-based configuration. Threshold tables are not
//! runtime-tunable; see [`ArrivalConfig`](crate::config::ArrivalConfig) for
//! the knobs that are.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- Geodesy ---

/// Mean Earth radius used by the Haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// --- Travel-time model (km/h) ---

pub const WALKING_SPEED_KMH: f64 = 5.0;
pub const DRIVING_SPEED_KMH: f64 = 30.0;
pub const TRANSIT_SPEED_KMH: f64 = 20.0;

// --- Distance matrix mode thresholds (km, inclusive upper bounds) ---

/// Pairs at or below this distance are walked.
pub const WALKING_MAX_DISTANCE_KM: f64 = 1.0;
/// Pairs at or below this distance (and above walking) use transit.
pub const TRANSIT_MAX_DISTANCE_KM: f64 = 10.0;

// --- Route optimizer ---

/// Multiplier applied to the distance of a high-priority candidate during
/// nearest-neighbor selection. Pulls important stops earlier in the tour.
pub const HIGH_PRIORITY_DISTANCE_FACTOR: f64 = 0.7;

/// Visit duration assumed when an `estimated_time` string cannot be parsed.
pub const DEFAULT_VISIT_MINUTES: u32 = 60;

/// Upper bound on a single parsed visit duration (one week).
pub const MAX_VISIT_MINUTES: u32 = 7 * 24 * 60;

// --- Multi-destination analysis (km, exclusive lower bounds) ---

/// Groups further apart than this are treated as separate destinations.
pub const MULTI_DESTINATION_DISTANCE_KM: f64 = 50.0;
pub const DRIVE_RECOMMENDATION_KM: f64 = 50.0;
pub const TRANSIT_RECOMMENDATION_KM: f64 = 10.0;
pub const BIKE_RECOMMENDATION_KM: f64 = 3.0;
/// Above this many groups the analysis suggests splitting the trip.
pub const SPLIT_SUGGESTION_GROUP_COUNT: usize = 3;
/// Label used when neither structured fields nor the destination name
/// yield a country or region.
pub const UNKNOWN_LOCATION: &str = "Unknown";

// --- Arrival radius learning ---

/// Default geofence radius (meters) before learning and speed adjustment.
pub const DEFAULT_BASE_RADIUS_M: f64 = 50.0;
/// Confirmed-distance samples kept per category (oldest evicted first).
pub const MAX_LEARNING_SAMPLES: usize = 50;
/// Samples needed before the learned average influences the radius.
pub const LEARNING_THRESHOLD: usize = 5;
/// Weight of the learned average when blending with the base radius.
pub const LEARNED_RADIUS_WEIGHT: f64 = 0.7;

// --- Speed multipliers (m/s upper bounds, exclusive) ---

pub const SPEED_STATIONARY_MS: f64 = 0.5;
pub const SPEED_WALKING_MS: f64 = 2.0;
pub const SPEED_CYCLING_MS: f64 = 8.0;
pub const MULTIPLIER_STATIONARY: f64 = 1.0;
pub const MULTIPLIER_WALKING: f64 = 1.1;
pub const MULTIPLIER_CYCLING: f64 = 1.3;
pub const MULTIPLIER_FAST: f64 = 1.5;

// --- Arrival confidence signals ---

pub const CONFIDENCE_WITHIN_RADIUS: f64 = 0.4;
pub const CONFIDENCE_SLOW_SPEED: f64 = 0.3;
pub const CONFIDENCE_MODERATE_SPEED: f64 = 0.2;
pub const SLOW_SPEED_MS: f64 = 1.0;
pub const MODERATE_SPEED_MS: f64 = 3.0;
pub const CONFIDENCE_LONG_DWELL: f64 = 0.2;
pub const CONFIDENCE_SHORT_DWELL: f64 = 0.1;
pub const LONG_DWELL_MS: u64 = 30_000;
pub const SHORT_DWELL_MS: u64 = 10_000;
/// Minimum confidence for auto-confirmation (distance must also be inside
/// the radius).
pub const CONFIRMATION_THRESHOLD: f64 = 0.6;

/// Candidates whose distance is within this many meters of the closest one
/// are considered contiguous and eligible for heading disambiguation.
pub const CONTIGUOUS_POI_THRESHOLD_M: f64 = 20.0;

// --- Persistence / sessions ---

/// Namespace prefix for persisted learning documents.
pub const DEFAULT_LEARNING_NAMESPACE: &str = "intelligent_arrival_learning";
/// Idle time after which a session's in-memory manager is dropped.
pub const DEFAULT_SESSION_IDLE_TTL_SECONDS: u64 = 3_600;
/// Maximum concurrently cached session managers.
pub const DEFAULT_MAX_SESSIONS: u64 = 10_000;
