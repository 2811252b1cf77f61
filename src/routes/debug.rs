use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /debug/health - Check if the learning store is reachable
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let store = state.sessions.store();
    let mut status = json!({
        "status": "ok",
        "checks": {
            "store_backend": store.backend_name(),
        }
    });

    if store.health_check().await {
        status["checks"]["store"] = json!("ok");
    } else {
        status["checks"]["store"] = json!({"error": "store unreachable"});
        status["status"] = json!("error");
    }

    let sessions = state.sessions.stats().await;
    status["checks"]["active_sessions"] = json!(sessions.active_sessions);
    status["checks"]["session_loads"] = json!(sessions.loads);

    Json(status)
}
