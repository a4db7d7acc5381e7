use axum::{extract::State, Json};
use engine::health::HealthSnapshot;
use serde_json::{json, Value};

use crate::state::AppState;

/// Liveness of this process only.
pub async fn liveness() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// Last polled health of the Ontology Service.
pub async fn backend_status(State(state): State<AppState>) -> Json<HealthSnapshot> {
    Json(state.health.latest())
}
