use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tripsense::config::Config;
use tripsense::services::session::SessionRegistry;
use tripsense::store::build_store;
use tripsense::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripsense=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting TripSense API server");
    tracing::info!(
        backend = ?config.store_backend,
        base_radius_m = config.arrival.base_radius_m,
        "Configuration loaded successfully"
    );

    let store = build_store(&config).await?;
    tracing::info!("Learning store ready ({})", store.backend_name());

    let sessions = SessionRegistry::new(
        store,
        config.arrival.clone(),
        config.session_idle_ttl,
        config.max_sessions,
    );

    let state = Arc::new(AppState { sessions });

    // Build router with CORS and tracing
    let app = Router::new()
        .nest("/api/v1", tripsense::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
