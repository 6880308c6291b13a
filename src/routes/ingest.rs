use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::errors::ApiError;
use crate::{store, validate};

// ---

pub fn router() -> Router<PgPool> {
    // ---
    Router::new().route("/ingest", post(handler))
}

/// Handle `POST /ingest`.
///
/// The body is validated as a whole before anything touches storage: one bad
/// field or measurement rejects the entire payload with field-level errors.
/// Accepted payloads are stored one reading per measurement entry.
async fn handler(
    State(pool): State<PgPool>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    // ---
    debug!("POST /ingest - validating payload");

    let readings = validate::validate_record(&body)?;

    for reading in &readings {
        store::insert(&pool, reading).await?;
    }

    info!(
        "POST /ingest - accepted {} reading(s) for device {}",
        readings.len(),
        readings[0].device_id
    );
    Ok((StatusCode::OK, Json(json!({}))))
}
