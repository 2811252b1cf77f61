use std::sync::Arc;
use tripsense::config::ArrivalConfig;
use tripsense::models::{Priority, SavedPlace};
use tripsense::services::session::SessionRegistry;
use tripsense::store::{KeyValueStore, MemoryStore};
use tripsense::AppState;

/// Router over an in-memory learning store
#[allow(dead_code)]
pub fn setup_test_app() -> axum::Router {
    setup_test_app_with_store(Arc::new(MemoryStore::new()))
}

#[allow(dead_code)]
pub fn setup_test_app_with_store(store: Arc<dyn KeyValueStore>) -> axum::Router {
    let sessions = SessionRegistry::new(store, ArrivalConfig::default(), 3600, 1000);
    tripsense::routes::create_router(Arc::new(AppState { sessions }))
}

/// Create a geocoded test place
#[allow(dead_code)]
pub fn create_test_place(id: &str, category: &str, lat: f64, lng: f64) -> SavedPlace {
    SavedPlace::new(id, format!("Test place {}", id), category).at(lat, lng)
}

#[allow(dead_code)]
pub fn create_priority_place(id: &str, lat: f64, lng: f64, priority: Priority) -> SavedPlace {
    create_test_place(id, "attraction", lat, lng).with_priority(priority)
}

/// A handful of Paris sights, with coordinates
#[allow(dead_code)]
pub fn paris_places() -> Vec<SavedPlace> {
    vec![
        create_test_place("louvre", "museum", 48.8606, 2.3376)
            .with_destination("Paris, France")
            .with_estimated_time("3 hours"),
        create_test_place("eiffel", "attraction", 48.8584, 2.2945)
            .with_destination("Paris, France")
            .with_estimated_time("2 hours"),
        create_test_place("notre-dame", "attraction", 48.8530, 2.3499)
            .with_destination("Paris, France")
            .with_estimated_time("1 hour"),
        create_test_place("orsay", "museum", 48.8600, 2.3266)
            .with_destination("Paris, France")
            .with_estimated_time("90 min"),
    ]
}

#[allow(dead_code)]
pub fn rome_places() -> Vec<SavedPlace> {
    vec![
        create_test_place("colosseum", "attraction", 41.8902, 12.4922)
            .with_destination("Rome, Italy")
            .with_estimated_time("2 hours"),
        create_test_place("pantheon", "attraction", 41.8986, 12.4769)
            .with_destination("Rome, Italy")
            .with_estimated_time("45 min"),
    ]
}

#[allow(dead_code)]
pub fn ids(places: &[SavedPlace]) -> Vec<String> {
    places.iter().map(|p| p.id.clone()).collect()
}
