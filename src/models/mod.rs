pub mod arrival;
pub mod coordinates;
pub mod place;
pub mod route;
pub mod trip;

pub use arrival::{ArrivalDecision, ArrivalRecord, HeadingHint, NearbyCandidate, RadiusLearningData};
pub use coordinates::Coordinates;
pub use place::{PlaceCategory, Priority, SavedPlace};
pub use route::{DistanceEntry, DistanceMatrixRow, RouteTime, TransportMode, TravelMode};
pub use trip::{GroupKey, MultiDestinationAnalysis, PlaceGroup};
