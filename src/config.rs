use crate::constants::*;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
    Redis,
    Sqlite,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "file" => Ok(StoreBackend::File),
            "redis" => Ok(StoreBackend::Redis),
            "sqlite" => Ok(StoreBackend::Sqlite),
            _ => Err(format!(
                "Invalid store backend: {}. Use 'memory', 'file', 'redis' or 'sqlite'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    /// Directory for the file backend, database file for sqlite.
    pub store_path: String,
    pub redis_url: Option<String>,
    pub session_idle_ttl: u64,
    pub max_sessions: u64,
    pub arrival: ArrivalConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalConfig {
    /// Geofence radius (meters) used when a request does not supply one
    pub base_radius_m: f64,

    /// Prefix of the storage key holding a session's learning document
    pub learning_namespace: String,
}

impl Default for ArrivalConfig {
    fn default() -> Self {
        Self {
            base_radius_m: DEFAULT_BASE_RADIUS_M,
            learning_namespace: DEFAULT_LEARNING_NAMESPACE.to_string(),
        }
    }
}

impl ArrivalConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let base_radius_m: f64 = env::var("ARRIVAL_BASE_RADIUS_M")
            .unwrap_or_else(|_| defaults.base_radius_m.to_string())
            .parse()
            .map_err(|_| "Invalid ARRIVAL_BASE_RADIUS_M")?;

        if !base_radius_m.is_finite() || !(1.0..=1000.0).contains(&base_radius_m) {
            return Err("ARRIVAL_BASE_RADIUS_M must be between 1 and 1000 meters".to_string());
        }

        let learning_namespace =
            env::var("LEARNING_NAMESPACE").unwrap_or(defaults.learning_namespace);
        if learning_namespace.trim().is_empty() {
            return Err("LEARNING_NAMESPACE cannot be empty".to_string());
        }
        // the namespace is the prefix of every storage key and of file names
        if !learning_namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(
                "LEARNING_NAMESPACE may only contain letters, digits, '_' and '-'".to_string(),
            );
        }

        Ok(Self {
            base_radius_m,
            learning_namespace,
        })
    }

    /// Storage key for one session's learning document.
    pub fn storage_key(&self, session_id: &str) -> String {
        format!("{}:{}", self.learning_namespace, session_id)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            store_backend: env::var("STORE_BACKEND")
                .unwrap_or_else(|_| "memory".to_string())
                .parse()?,
            store_path: env::var("STORE_PATH").unwrap_or_else(|_| "./data".to_string()),
            redis_url: env::var("REDIS_URL").ok(),
            session_idle_ttl: env::var("SESSION_IDLE_TTL")
                .unwrap_or_else(|_| DEFAULT_SESSION_IDLE_TTL_SECONDS.to_string())
                .parse()
                .map_err(|_| "Invalid SESSION_IDLE_TTL")?,
            max_sessions: env::var("MAX_SESSIONS")
                .unwrap_or_else(|_| DEFAULT_MAX_SESSIONS.to_string())
                .parse()
                .map_err(|_| "Invalid MAX_SESSIONS")?,
            arrival: ArrivalConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
