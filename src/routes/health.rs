//! Liveness endpoint for the measurements service.
//!
//! `GET /health` answers without touching the database, so orchestrators and
//! CI can tell "process up and serving" apart from "database reachable".
//! Exported to the gateway (`mod.rs`) as a subrouter, like every other
//! endpoint module here (EMBP).

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

// ---

async fn handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Subrouter for `/health`, generic over the gateway's state type so it
/// merges cleanly whatever the siblings share.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(handler))
}
