use crate::config::ArrivalConfig;
use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::arrival::CategoryLearningStats;
use crate::models::place::normalize_category_label;
use crate::models::{
    ArrivalDecision, ArrivalRecord, HeadingHint, NearbyCandidate, RadiusLearningData, SavedPlace,
};
use crate::store::KeyValueStore;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

type LearningMap = BTreeMap<String, RadiusLearningData>;

/// Decides when a user has arrived at a saved place, with geofence radii
/// learned per place category from previously confirmed arrivals.
///
/// One manager serves one user session. Learning data lives in memory and
/// is written through to the injected store as a single JSON document
/// `{category: RadiusLearningData}` under `storage_key`.
pub struct ArrivalManager {
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    config: ArrivalConfig,
    learning: RwLock<LearningMap>,
    // serializes mutate + write so the store never receives an older snapshot
    // after a newer one
    persist_lock: Mutex<()>,
    // false while the stored document could not be read; nothing is written
    // until a read succeeds and the in-memory samples are merged into it
    synced: AtomicBool,
}

impl ArrivalManager {
    /// Load learning data from `store`. This never fails.
    ///
    /// Corrupted data is logged and treated as a cold start. A failed read
    /// starts the manager with empty learning data but without write access:
    /// the read is retried before the next mutation, so stored history is
    /// never overwritten with the empty map.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        storage_key: impl Into<String>,
        config: ArrivalConfig,
    ) -> Self {
        let storage_key = storage_key.into();

        let (learning, synced) = match store.get(&storage_key).await {
            Ok(Some(bytes)) => (decode_learning(&storage_key, &bytes), true),
            Ok(None) => {
                debug!("No learning data stored under {}", storage_key);
                (LearningMap::new(), true)
            }
            Err(e) => {
                warn!(
                    "Failed to read learning data for {}: {}. Starting without learning data.",
                    storage_key, e
                );
                (LearningMap::new(), false)
            }
        };

        info!(
            "Arrival manager ready for {} ({} learned categories, {} store)",
            storage_key,
            learning.len(),
            store.backend_name()
        );

        ArrivalManager {
            store,
            storage_key,
            config,
            learning: RwLock::new(learning),
            persist_lock: Mutex::new(()),
            synced: AtomicBool::new(synced),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    fn learning(&self) -> RwLockReadGuard<'_, LearningMap> {
        self.learning.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn learning_mut(&self) -> RwLockWriteGuard<'_, LearningMap> {
        self.learning.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the stored learning data has been read, so writes may go
    /// through to the store.
    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    /// Retry a failed initial read. On success, samples recorded since then
    /// are appended to the stored history. Must be called with
    /// `persist_lock` held.
    async fn ensure_synced(&self) -> bool {
        if self.is_synced() {
            return true;
        }

        match self.store.get(&self.storage_key).await {
            Ok(stored) => {
                let mut merged = stored
                    .map(|bytes| decode_learning(&self.storage_key, &bytes))
                    .unwrap_or_default();
                let pending = self.learning().clone();
                merge_samples(&mut merged, pending);
                *self.learning_mut() = merged;
                self.synced.store(true, Ordering::Release);
                info!("Recovered stored learning data for {}", self.storage_key);
                true
            }
            Err(e) => {
                warn!(
                    "Learning data for {} is still unreadable: {}",
                    self.storage_key, e
                );
                false
            }
        }
    }

    /// Record a confirmed arrival and persist the updated learning data.
    ///
    /// A failed write is logged and otherwise ignored: the sample stays in
    /// memory for this session. While the stored data is unreadable the
    /// sample is kept in memory only and merged once a read succeeds.
    #[instrument(skip(self, place), fields(place_id = %place.id, category = %place.category))]
    pub async fn record_confirmed_arrival(
        &self,
        place: &SavedPlace,
        confirmed_distance: f64,
        user_speed: f64,
    ) -> Result<ArrivalRecord> {
        validate_non_negative("confirmed_distance", confirmed_distance)?;
        validate_non_negative("user_speed", user_speed)?;

        let now = OffsetDateTime::now_utc();
        let record = ArrivalRecord {
            place_id: place.id.clone(),
            place_name: place.name.clone(),
            category: place.learning_key(),
            confirmed_distance,
            user_speed,
            timestamp: now,
        };

        let _guard = self.persist_lock.lock().await;
        let synced = self.ensure_synced().await;
        let snapshot = {
            let mut learning = self.learning_mut();
            let entry = learning
                .entry(record.category.clone())
                .or_insert_with(|| RadiusLearningData::new(record.category.clone(), now));
            entry.push(confirmed_distance, now);
            debug!(
                samples = entry.sample_count(),
                average = entry.average_distance,
                "Recorded confirmed arrival at {:.1}m",
                confirmed_distance
            );
            serde_json::to_vec(&*learning)
        };

        if !synced {
            warn!(
                "Not persisting learning data for {} until it can be read",
                self.storage_key
            );
            return Ok(record);
        }

        match snapshot {
            Ok(bytes) => {
                if let Err(e) = self.store.set(&self.storage_key, &bytes).await {
                    warn!("Failed to persist learning data for {}: {}", self.storage_key, e);
                }
            }
            Err(e) => warn!("Failed to serialize learning data: {}", e),
        }

        Ok(record)
    }

    /// Geofence radius for `place` in meters, using the configured base
    /// radius.
    pub fn intelligent_radius(&self, place: &SavedPlace, user_speed: f64) -> Result<f64> {
        self.intelligent_radius_with_base(place, user_speed, self.config.base_radius_m)
    }

    /// Blend the learned average (once enough samples exist) with
    /// `base_radius`, widen for speed, then clamp to the category's range.
    pub fn intelligent_radius_with_base(
        &self,
        place: &SavedPlace,
        user_speed: f64,
        base_radius: f64,
    ) -> Result<f64> {
        validate_non_negative("user_speed", user_speed)?;
        if !base_radius.is_finite() || base_radius <= 0.0 {
            return Err(AppError::InvalidInput(format!(
                "base_radius must be a positive number, got {}",
                base_radius
            )));
        }

        let learned_average = self
            .learning()
            .get(&place.learning_key())
            .filter(|data| data.is_learned())
            .map(|data| data.average_distance);

        let mut radius = match learned_average {
            Some(average) => {
                LEARNED_RADIUS_WEIGHT * average + (1.0 - LEARNED_RADIUS_WEIGHT) * base_radius
            }
            None => base_radius,
        };
        radius *= speed_multiplier(user_speed);

        let (min, max) = place.place_category().radius_constraints();
        Ok(radius.clamp(min, max))
    }

    /// Combine distance, speed, dwell time and category into a confidence
    /// score. Confirms only when the score reaches
    /// [`CONFIRMATION_THRESHOLD`] and the user is inside the radius.
    pub fn should_confirm_arrival(
        &self,
        place: &SavedPlace,
        current_distance: f64,
        user_speed: f64,
        dwell_time_ms: u64,
    ) -> Result<ArrivalDecision> {
        validate_non_negative("current_distance", current_distance)?;
        let radius = self.intelligent_radius(place, user_speed)?;

        let mut confidence = 0.0;
        let mut reasons = Vec::new();

        let within_radius = current_distance <= radius;
        if within_radius {
            confidence += CONFIDENCE_WITHIN_RADIUS;
            reasons.push(format!(
                "Within {:.0}m radius ({:.0}m away)",
                radius, current_distance
            ));
        } else {
            reasons.push(format!(
                "Outside {:.0}m radius ({:.0}m away)",
                radius, current_distance
            ));
        }

        if user_speed < SLOW_SPEED_MS {
            confidence += CONFIDENCE_SLOW_SPEED;
            reasons.push(format!("Nearly stationary ({:.1} m/s)", user_speed));
        } else if user_speed < MODERATE_SPEED_MS {
            confidence += CONFIDENCE_MODERATE_SPEED;
            reasons.push(format!("Moving slowly ({:.1} m/s)", user_speed));
        }

        if dwell_time_ms > LONG_DWELL_MS {
            confidence += CONFIDENCE_LONG_DWELL;
            reasons.push(format!("Stayed nearby for {}s", dwell_time_ms / 1000));
        } else if dwell_time_ms > SHORT_DWELL_MS {
            confidence += CONFIDENCE_SHORT_DWELL;
            reasons.push(format!("Lingering for {}s", dwell_time_ms / 1000));
        }

        let category = place.place_category();
        let bonus = category.confidence_bonus();
        if bonus != 0.0 {
            confidence += bonus;
            reasons.push(format!("Category '{}' adjustment {:+.2}", category, bonus));
        }

        if let Some(data) = self.learning().get(&place.learning_key()) {
            if data.is_learned() {
                reasons.push(format!(
                    "Radius learned from {} confirmed arrivals",
                    data.sample_count()
                ));
            }
        }

        let confidence = confidence.clamp(0.0, 1.0);
        let confirmed = confidence >= CONFIRMATION_THRESHOLD && within_radius;

        debug!(
            place_id = %place.id,
            confirmed,
            confidence,
            radius,
            current_distance,
            "Arrival check"
        );

        Ok(ArrivalDecision {
            confirmed,
            confidence,
            radius,
            reasons,
        })
    }

    /// Per-category learning summary, sorted by category.
    pub fn learning_stats(&self) -> Vec<CategoryLearningStats> {
        self.learning()
            .values()
            .map(CategoryLearningStats::from)
            .collect()
    }

    pub fn history_for(&self, category: &str) -> Option<RadiusLearningData> {
        self.learning()
            .get(&normalize_category_label(category))
            .cloned()
    }

    /// Forget one category. Returns whether anything was removed. Unlike
    /// recording, a failed write is reported to the caller and leaves the
    /// in-memory data untouched.
    pub async fn reset_category(&self, category: &str) -> Result<bool> {
        let key = normalize_category_label(category);
        let _guard = self.persist_lock.lock().await;
        if !self.ensure_synced().await {
            return Err(AppError::Storage(format!(
                "learning data for {} is unreadable; cannot reset '{}'",
                self.storage_key, key
            )));
        }

        let remaining = {
            let learning = self.learning();
            if !learning.contains_key(&key) {
                return Ok(false);
            }
            let mut remaining = learning.clone();
            remaining.remove(&key);
            remaining
        };

        let bytes = serde_json::to_vec(&remaining)?;
        self.store.set(&self.storage_key, &bytes).await?;
        *self.learning_mut() = remaining;
        info!("Reset learning data for category '{}'", key);
        Ok(true)
    }

    /// Forget every category. The stored document is deleted first; memory
    /// is only cleared once that succeeds.
    pub async fn reset_all(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        self.store.delete(&self.storage_key).await?;
        self.learning_mut().clear();
        self.synced.store(true, Ordering::Release);
        info!("Reset all learning data for {}", self.storage_key);
        Ok(())
    }
}

/// Radius multiplier compensating for GPS drift at higher speeds.
pub fn speed_multiplier(user_speed: f64) -> f64 {
    if user_speed < SPEED_STATIONARY_MS {
        MULTIPLIER_STATIONARY
    } else if user_speed < SPEED_WALKING_MS {
        MULTIPLIER_WALKING
    } else if user_speed < SPEED_CYCLING_MS {
        MULTIPLIER_CYCLING
    } else {
        MULTIPLIER_FAST
    }
}

/// Pick one place when several saved places are near the user at once.
///
/// Candidates are ranked by distance. When two or more lie within
/// [`CONTIGUOUS_POI_THRESHOLD_M`] of the closest and a heading hint is
/// given, the one whose bearing from the user best matches the heading
/// wins. Otherwise the closest candidate is returned.
pub fn resolve_contiguous_pois(
    candidates: &[NearbyCandidate],
    heading: Option<HeadingHint>,
) -> Result<Option<SavedPlace>> {
    let mut ranked: Vec<&NearbyCandidate> = candidates
        .iter()
        .filter(|c| c.distance_m.is_finite() && c.distance_m >= 0.0)
        .collect();
    ranked.sort_by(|a, b| {
        a.distance_m
            .partial_cmp(&b.distance_m)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let Some(closest) = ranked.first() else {
        return Ok(None);
    };

    let contiguous: Vec<&NearbyCandidate> = ranked
        .iter()
        .take_while(|c| c.distance_m - closest.distance_m <= CONTIGUOUS_POI_THRESHOLD_M)
        .copied()
        .collect();

    if contiguous.len() < 2 {
        return Ok(Some(closest.place.clone()));
    }

    let Some(hint) = heading else {
        debug!(
            "{} contiguous places and no heading; choosing closest '{}'",
            contiguous.len(),
            closest.place.name
        );
        return Ok(Some(closest.place.clone()));
    };

    hint.position
        .validate()
        .map_err(|e| AppError::InvalidInput(format!("heading position: {}", e)))?;
    if !hint.heading_deg.is_finite() {
        return Err(AppError::InvalidInput("heading_deg must be finite".to_string()));
    }
    let heading_deg = hint.heading_deg.rem_euclid(360.0);

    let mut best: Option<(&NearbyCandidate, f64)> = None;
    for candidate in &contiguous {
        let Some(coords) = candidate.place.coordinates()? else {
            continue;
        };
        let bearing = hint.position.bearing_to(&coords);
        let deviation = angular_difference(bearing, heading_deg);
        if best.map_or(true, |(_, d)| deviation < d) {
            best = Some((candidate, deviation));
        }
    }

    let chosen = match best {
        Some((candidate, deviation)) => {
            debug!(
                "Heading {:.0}° picks '{}' ({:.0}° off) among {} contiguous places",
                heading_deg,
                candidate.place.name,
                deviation,
                contiguous.len()
            );
            candidate.place.clone()
        }
        None => closest.place.clone(),
    };

    Ok(Some(chosen))
}

/// Smallest angle between two bearings, in `[0, 180]`.
fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

fn validate_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::InvalidInput(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Append `pending` samples, oldest first, onto the histories in `into`.
fn merge_samples(into: &mut LearningMap, pending: LearningMap) {
    for (category, data) in pending {
        let entry = into
            .entry(category.clone())
            .or_insert_with(|| RadiusLearningData::new(category, data.last_updated));
        for distance in data.confirmed_distances {
            entry.push(distance, data.last_updated);
        }
    }
}

/// Parse the stored document entry by entry so one corrupted category does
/// not discard the others.
fn decode_learning(storage_key: &str, bytes: &[u8]) -> LearningMap {
    let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_slice(bytes) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(
                "Learning data for {} is not valid JSON ({}); starting fresh",
                storage_key, e
            );
            return LearningMap::new();
        }
    };

    let mut learning = LearningMap::new();
    for (category, value) in raw {
        match serde_json::from_value::<RadiusLearningData>(value) {
            Ok(mut data) => {
                let key = normalize_category_label(&category);
                data.category = key.clone();
                if data.sanitize() {
                    learning.insert(key, data);
                } else {
                    warn!("Discarding empty learning entry for category '{}'", category);
                }
            }
            Err(e) => {
                warn!(
                    "Discarding corrupted learning entry for category '{}': {}",
                    category, e
                );
            }
        }
    }
    learning
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    async fn manager_with(store: Arc<dyn KeyValueStore>) -> ArrivalManager {
        ArrivalManager::load(store, "learning:test", ArrivalConfig::default()).await
    }

    async fn manager() -> ArrivalManager {
        manager_with(Arc::new(MemoryStore::new())).await
    }

    fn restaurant() -> SavedPlace {
        SavedPlace::new("r1", "Trattoria", "restaurant").at(41.9, 12.5)
    }

    /// Store whose every operation fails.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(AppError::Storage("disk on fire".to_string()))
        }
        async fn set(&self, _key: &str, _value: &[u8]) -> Result<()> {
            Err(AppError::Storage("disk on fire".to_string()))
        }
        async fn delete(&self, _key: &str) -> Result<()> {
            Err(AppError::Storage("disk on fire".to_string()))
        }
        async fn health_check(&self) -> bool {
            false
        }
        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    /// Memory-backed store whose reads fail a set number of times and whose
    /// writes can be switched off.
    struct FlakyStore {
        inner: Arc<MemoryStore>,
        failing_gets: AtomicUsize,
        writes_fail: AtomicBool,
    }

    impl FlakyStore {
        fn new(inner: Arc<MemoryStore>, failing_gets: usize) -> Self {
            FlakyStore {
                inner,
                failing_gets: AtomicUsize::new(failing_gets),
                writes_fail: AtomicBool::new(false),
            }
        }

        fn write_error(&self) -> Result<()> {
            if self.writes_fail.load(Ordering::SeqCst) {
                return Err(AppError::Storage("read-only".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            let failing = self
                .failing_gets
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if failing.is_ok() {
                return Err(AppError::Storage("connection reset".to_string()));
            }
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
            self.write_error()?;
            self.inner.set(key, value).await
        }
        async fn delete(&self, key: &str) -> Result<()> {
            self.write_error()?;
            self.inner.delete(key).await
        }
        async fn health_check(&self) -> bool {
            true
        }
        fn backend_name(&self) -> &'static str {
            "flaky"
        }
    }

    #[test]
    fn speed_multiplier_bands() {
        assert_eq!(speed_multiplier(0.0), 1.0);
        assert_eq!(speed_multiplier(0.49), 1.0);
        assert_eq!(speed_multiplier(0.5), 1.1);
        assert_eq!(speed_multiplier(1.99), 1.1);
        assert_eq!(speed_multiplier(2.0), 1.3);
        assert_eq!(speed_multiplier(7.99), 1.3);
        assert_eq!(speed_multiplier(8.0), 1.5);
    }

    #[test]
    fn angular_difference_wraps() {
        assert_eq!(angular_difference(350.0, 10.0), 20.0);
        assert_eq!(angular_difference(10.0, 350.0), 20.0);
        assert_eq!(angular_difference(90.0, 270.0), 180.0);
        assert_eq!(angular_difference(45.0, 45.0), 0.0);
    }

    #[tokio::test]
    async fn base_radius_without_learning() {
        let m = manager().await;
        let other = SavedPlace::new("o", "Somewhere", "other");
        assert_eq!(m.intelligent_radius(&other, 0.0).unwrap(), 50.0);
        assert!((m.intelligent_radius(&other, 1.0).unwrap() - 55.0).abs() < 1e-9);
        // 50 * 1.5 = 75, still inside the 10..100 range
        assert!((m.intelligent_radius(&other, 20.0).unwrap() - 75.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn learning_kicks_in_at_five_samples() {
        let m = manager().await;
        let place = SavedPlace::new("m", "Museum", "museum");
        for _ in 0..4 {
            m.record_confirmed_arrival(&place, 100.0, 0.2).await.unwrap();
        }
        assert_eq!(m.intelligent_radius(&place, 0.0).unwrap(), 50.0);

        m.record_confirmed_arrival(&place, 100.0, 0.2).await.unwrap();
        // 0.7 * 100 + 0.3 * 50 = 85
        assert!((m.intelligent_radius(&place, 0.0).unwrap() - 85.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn restaurant_radius_always_clamped() {
        let m = manager().await;
        let place = restaurant();
        for speed in [0.0, 1.0, 5.0, 30.0] {
            let r = m.intelligent_radius(&place, speed).unwrap();
            assert!((15.0..=80.0).contains(&r), "speed {speed}: {r}");
        }
        for _ in 0..10 {
            m.record_confirmed_arrival(&place, 5000.0, 0.0).await.unwrap();
        }
        for speed in [0.0, 1.0, 5.0, 30.0] {
            assert_eq!(m.intelligent_radius(&place, speed).unwrap(), 80.0);
        }
        let tiny_base = m.intelligent_radius_with_base(&place, 0.0, 0.001).unwrap();
        assert!((15.0..=80.0).contains(&tiny_base));

        m.reset_category("restaurant").await.unwrap();
        assert_eq!(m.intelligent_radius_with_base(&place, 0.0, 1.0).unwrap(), 15.0);
    }

    #[tokio::test]
    async fn history_capped_at_fifty_and_evicts_oldest() {
        let m = manager().await;
        let place = restaurant();
        for i in 0..51 {
            m.record_confirmed_arrival(&place, i as f64, 0.0).await.unwrap();
        }
        let data = m.history_for("restaurant").unwrap();
        assert_eq!(data.confirmed_distances.len(), 50);
        assert_eq!(data.confirmed_distances[0], 1.0);
    }

    #[tokio::test]
    async fn all_signals_cap_confidence_at_one() {
        let m = manager().await;
        let airport = SavedPlace::new("a", "Airport", "airport");
        // 0.4 + 0.3 + 0.2 + 0.2 = 1.1 before clamping
        let decision = m.should_confirm_arrival(&airport, 10.0, 0.0, 60_000).unwrap();
        assert_eq!(decision.confidence, 1.0);
        assert!(decision.confirmed);
        assert_eq!(decision.reasons.len(), 4);
    }

    #[tokio::test]
    async fn confident_but_outside_radius_is_not_confirmed() {
        let m = manager().await;
        let airport = SavedPlace::new("a", "Airport", "airport");
        // radius 100 (airport minimum); speed + dwell + bonus = 0.7
        let decision = m.should_confirm_arrival(&airport, 150.0, 0.0, 60_000).unwrap();
        assert!(decision.confidence >= 0.6);
        assert!(150.0 > decision.radius);
        assert!(!decision.confirmed);
    }

    #[tokio::test]
    async fn within_radius_but_moving_fast_is_not_confirmed() {
        let m = manager().await;
        let other = SavedPlace::new("o", "Spot", "other");
        let decision = m.should_confirm_arrival(&other, 5.0, 10.0, 0).unwrap();
        assert!((decision.confidence - 0.4).abs() < 1e-9);
        assert!(!decision.confirmed);
    }

    #[tokio::test]
    async fn park_penalty_and_dwell_bands() {
        let m = manager().await;
        let park = SavedPlace::new("p", "Park", "park");
        // 0.4 + 0.2 (speed < 3) + 0.1 (dwell > 10s) - 0.05
        let decision = m.should_confirm_arrival(&park, 20.0, 2.5, 15_000).unwrap();
        assert!((decision.confidence - 0.65).abs() < 1e-9);
        assert!(decision.confirmed);

        let decision = m.should_confirm_arrival(&park, 20.0, 2.5, 10_000).unwrap();
        assert!((decision.confidence - 0.55).abs() < 1e-9);
        assert!(!decision.confirmed);
    }

    #[tokio::test]
    async fn rejects_invalid_inputs() {
        let m = manager().await;
        let place = restaurant();
        assert!(m.should_confirm_arrival(&place, -1.0, 0.0, 0).is_err());
        assert!(m.intelligent_radius(&place, f64::NAN).is_err());
        assert!(m.record_confirmed_arrival(&place, f64::INFINITY, 0.0).await.is_err());
        assert!(m.intelligent_radius_with_base(&place, 0.0, 0.0).is_err());
    }

    #[tokio::test]
    async fn learning_persists_across_managers() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let first = manager_with(store.clone()).await;
        let place = SavedPlace::new("h", "Hotel", "hotel");
        for _ in 0..5 {
            first.record_confirmed_arrival(&place, 60.0, 0.0).await.unwrap();
        }
        let expected = first.intelligent_radius(&place, 0.0).unwrap();

        let second = manager_with(store).await;
        assert_eq!(second.intelligent_radius(&place, 0.0).unwrap(), expected);
        assert_eq!(second.learning_stats().len(), 1);
        assert!(second.learning_stats()[0].learned);
    }

    #[tokio::test]
    async fn corrupted_document_is_a_cold_start() {
        let store = Arc::new(MemoryStore::new());
        store.set("learning:test", b"{not json").await.unwrap();
        let m = manager_with(store).await;
        assert!(m.learning_stats().is_empty());
    }

    #[tokio::test]
    async fn corrupted_entry_is_discarded_others_kept() {
        let store = Arc::new(MemoryStore::new());
        let doc = serde_json::json!({
            "cafe": {
                "category": "cafe",
                "confirmed_distances": [10.0, 20.0],
                "average_distance": 16.6,
                "last_updated": "2026-01-01T00:00:00Z"
            },
            "bar": {"category": "bar", "confirmed_distances": "oops"}
        });
        store
            .set("learning:test", &serde_json::to_vec(&doc).unwrap())
            .await
            .unwrap();
        let m = manager_with(store).await;
        let stats = m.learning_stats();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].category, "cafe");
        assert_eq!(stats[0].sample_count, 2);
    }

    #[tokio::test]
    async fn storage_failures_do_not_break_learning() {
        let m = manager_with(Arc::new(BrokenStore)).await;
        let place = restaurant();
        for _ in 0..5 {
            m.record_confirmed_arrival(&place, 40.0, 0.0).await.unwrap();
        }
        assert_eq!(m.history_for("restaurant").unwrap().sample_count(), 5);
        assert!(m.reset_all().await.is_err());
        assert!(m.reset_category("restaurant").await.is_err());
        assert_eq!(m.history_for("restaurant").unwrap().sample_count(), 5);
    }

    #[tokio::test]
    async fn failed_reset_leaves_memory_matching_store() {
        let store = Arc::new(FlakyStore::new(Arc::new(MemoryStore::new()), 0));
        let m = manager_with(store.clone()).await;
        let cafe = SavedPlace::new("c1", "Bar", "cafe");
        for _ in 0..3 {
            m.record_confirmed_arrival(&restaurant(), 40.0, 0.0).await.unwrap();
        }
        m.record_confirmed_arrival(&cafe, 15.0, 0.0).await.unwrap();

        store.writes_fail.store(true, Ordering::SeqCst);
        assert!(m.reset_category("restaurant").await.is_err());
        assert_eq!(m.history_for("restaurant").unwrap().sample_count(), 3);
        assert!(m.reset_all().await.is_err());
        assert_eq!(m.learning_stats().len(), 2);

        store.writes_fail.store(false, Ordering::SeqCst);
        assert!(m.reset_category("restaurant").await.unwrap());
        let reloaded = manager_with(store).await;
        assert!(reloaded.history_for("restaurant").is_none());
        assert_eq!(reloaded.history_for("cafe").unwrap().sample_count(), 1);
    }

    #[tokio::test]
    async fn transient_read_failure_keeps_stored_history() {
        let inner = Arc::new(MemoryStore::new());
        {
            let seed = manager_with(inner.clone()).await;
            for _ in 0..10 {
                seed.record_confirmed_arrival(&restaurant(), 35.0, 0.0).await.unwrap();
            }
        }

        let flaky: Arc<dyn KeyValueStore> = Arc::new(FlakyStore::new(inner.clone(), 1));
        let m = manager_with(flaky).await;
        assert!(!m.is_synced());
        assert!(m.history_for("restaurant").is_none());

        let cafe = SavedPlace::new("c1", "Bar", "cafe");
        m.record_confirmed_arrival(&cafe, 12.0, 0.0).await.unwrap();
        assert!(m.is_synced());
        assert_eq!(m.history_for("restaurant").unwrap().sample_count(), 10);

        let reloaded = manager_with(inner).await;
        assert_eq!(reloaded.history_for("restaurant").unwrap().sample_count(), 10);
        assert_eq!(reloaded.history_for("cafe").unwrap().sample_count(), 1);
    }

    #[tokio::test]
    async fn unreadable_store_is_never_overwritten() {
        let inner = Arc::new(MemoryStore::new());
        {
            let seed = manager_with(inner.clone()).await;
            for _ in 0..10 {
                seed.record_confirmed_arrival(&restaurant(), 35.0, 0.0).await.unwrap();
            }
        }
        let before = inner.get("learning:test").await.unwrap();

        let flaky: Arc<dyn KeyValueStore> = Arc::new(FlakyStore::new(inner.clone(), usize::MAX));
        let m = manager_with(flaky).await;
        let cafe = SavedPlace::new("c1", "Bar", "cafe");
        m.record_confirmed_arrival(&cafe, 12.0, 0.0).await.unwrap();

        assert_eq!(m.history_for("cafe").unwrap().sample_count(), 1);
        assert!(!m.is_synced());
        assert_eq!(inner.get("learning:test").await.unwrap(), before);
    }

    #[tokio::test]
    async fn reset_category_persists() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let m = manager_with(store.clone()).await;
        m.record_confirmed_arrival(&restaurant(), 30.0, 0.0).await.unwrap();
        m.record_confirmed_arrival(&SavedPlace::new("c", "Cafe", "cafe"), 12.0, 0.0)
            .await
            .unwrap();

        assert!(m.reset_category("Restaurant").await.unwrap());
        assert!(!m.reset_category("restaurant").await.unwrap());

        let reloaded = manager_with(store).await;
        let categories: Vec<String> = reloaded
            .learning_stats()
            .into_iter()
            .map(|s| s.category)
            .collect();
        assert_eq!(categories, vec!["cafe".to_string()]);
    }

    fn candidate(id: &str, lat: f64, lng: f64, distance_m: f64) -> NearbyCandidate {
        NearbyCandidate {
            place: SavedPlace::new(id, id, "shopping").at(lat, lng),
            distance_m,
        }
    }

    #[test]
    fn resolve_empty_is_none() {
        assert!(resolve_contiguous_pois(&[], None).unwrap().is_none());
    }

    #[test]
    fn resolve_picks_closest_without_heading() {
        let candidates = vec![
            candidate("far", 0.0, 0.0003, 35.0),
            candidate("near", 0.0, -0.0003, 30.0),
        ];
        let chosen = resolve_contiguous_pois(&candidates, None).unwrap().unwrap();
        assert_eq!(chosen.id, "near");
    }

    #[test]
    fn resolve_uses_heading_for_contiguous_places() {
        // user at origin heading east; "west" is slightly closer
        let candidates = vec![
            candidate("west", 0.0, -0.0003, 30.0),
            candidate("east", 0.0, 0.0003, 35.0),
        ];
        let hint = HeadingHint {
            position: Coordinates::new(0.0, 0.0).unwrap(),
            heading_deg: 90.0,
        };
        let chosen = resolve_contiguous_pois(&candidates, Some(hint)).unwrap().unwrap();
        assert_eq!(chosen.id, "east");
    }

    #[test]
    fn resolve_ignores_heading_when_not_contiguous() {
        let candidates = vec![
            candidate("west", 0.0, -0.0003, 30.0),
            candidate("east", 0.0, 0.0008, 90.0),
        ];
        let hint = HeadingHint {
            position: Coordinates::new(0.0, 0.0).unwrap(),
            heading_deg: 90.0,
        };
        let chosen = resolve_contiguous_pois(&candidates, Some(hint)).unwrap().unwrap();
        assert_eq!(chosen.id, "west");
    }

    #[test]
    fn resolve_falls_back_when_contiguous_places_lack_coordinates() {
        let candidates = vec![
            NearbyCandidate {
                place: SavedPlace::new("a", "A", "other"),
                distance_m: 10.0,
            },
            NearbyCandidate {
                place: SavedPlace::new("b", "B", "other"),
                distance_m: 12.0,
            },
        ];
        let hint = HeadingHint {
            position: Coordinates::new(0.0, 0.0).unwrap(),
            heading_deg: 180.0,
        };
        let chosen = resolve_contiguous_pois(&candidates, Some(hint)).unwrap().unwrap();
        assert_eq!(chosen.id, "a");
    }
}
