use crate::config::ArrivalConfig;
use crate::error::{AppError, Result};
use crate::services::arrival::ArrivalManager;
use crate::store::KeyValueStore;
use moka::future::Cache;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

const MAX_SESSION_ID_LEN: usize = 128;

/// Live arrival managers, one per session, evicted after an idle period.
/// Eviction only drops the in-memory copy; learning data stays in the store
/// and is reloaded on the next request for that session.
///
/// A manager evicted while a request still holds it is handed back instead
/// of being reloaded, so one process never runs two managers writing the
/// same storage key.
pub struct SessionRegistry {
    managers: Cache<String, Arc<ArrivalManager>>,
    live: Mutex<HashMap<String, Weak<ArrivalManager>>>,
    store: Arc<dyn KeyValueStore>,
    config: ArrivalConfig,
    loads: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub active_sessions: u64,
    pub loads: u64,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        config: ArrivalConfig,
        idle_ttl_seconds: u64,
        max_sessions: u64,
    ) -> Self {
        let managers = Cache::builder()
            .time_to_idle(Duration::from_secs(idle_ttl_seconds))
            .max_capacity(max_sessions)
            .build();

        SessionRegistry {
            managers,
            live: Mutex::new(HashMap::new()),
            store,
            config,
            loads: AtomicU64::new(0),
        }
    }

    /// The manager for `session_id`, loading its learning data on first use.
    /// Concurrent first requests for one session share a single load.
    pub async fn manager(&self, session_id: &str) -> Result<Arc<ArrivalManager>> {
        validate_session_id(session_id)?;

        let store = self.store.clone();
        let storage_key = self.config.storage_key(session_id);
        let config = self.config.clone();

        let manager = self
            .managers
            .get_with(session_id.to_string(), async move {
                if let Some(manager) = self.still_live(session_id) {
                    tracing::debug!("Reusing in-flight arrival session {}", storage_key);
                    return manager;
                }
                self.loads.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Loading arrival session {}", storage_key);
                let manager = Arc::new(ArrivalManager::load(store, storage_key, config).await);
                self.track(session_id, &manager);
                manager
            })
            .await;

        Ok(manager)
    }

    fn live_managers(&self) -> std::sync::MutexGuard<'_, HashMap<String, Weak<ArrivalManager>>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A manager dropped from the cache but still referenced elsewhere.
    fn still_live(&self, session_id: &str) -> Option<Arc<ArrivalManager>> {
        self.live_managers().get(session_id).and_then(Weak::upgrade)
    }

    fn track(&self, session_id: &str, manager: &Arc<ArrivalManager>) {
        let mut live = self.live_managers();
        live.retain(|_, weak| weak.strong_count() > 0);
        live.insert(session_id.to_string(), Arc::downgrade(manager));
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn arrival_config(&self) -> &ArrivalConfig {
        &self.config
    }

    pub async fn stats(&self) -> SessionStats {
        self.managers.run_pending_tasks().await;
        SessionStats {
            active_sessions: self.managers.entry_count(),
            loads: self.loads.load(Ordering::Relaxed),
        }
    }
}

/// Session ids become part of a storage key (and a file name for the file
/// store), so only a conservative character set is accepted.
pub fn validate_session_id(session_id: &str) -> Result<()> {
    if session_id.is_empty() || session_id.len() > MAX_SESSION_ID_LEN {
        return Err(AppError::InvalidInput(format!(
            "session id must be 1-{} characters",
            MAX_SESSION_ID_LEN
        )));
    }
    if !session_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::InvalidInput(format!(
            "session id '{}' may only contain letters, digits, '-' and '_'",
            session_id
        )));
    }
    Ok(())
}
