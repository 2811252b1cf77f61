// Library exports for testing and reusability

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use error::{AppError, Result};

use services::session::SessionRegistry;

// App state for sharing across the application
pub struct AppState {
    pub sessions: SessionRegistry,
}
