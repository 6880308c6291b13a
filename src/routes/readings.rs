use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;

use crate::aggregate::{self, FetchQuery};
use crate::errors::ApiError;
use crate::{store, RawRecord};

// ---

pub fn router() -> Router<PgPool> {
    // ---
    Router::new().route("/data", get(handler))
}

/// Handle `GET /data`: raw readings for one device over a time window.
///
/// Records come back in storage order, untouched. `since`/`before` are
/// exclusive; `before` defaults to the moment the request is evaluated.
async fn handler(
    Query(query): Query<FetchQuery>,
    State(pool): State<PgPool>,
) -> Result<Json<Vec<RawRecord>>, ApiError> {
    // ---
    let window = aggregate::resolve_window(&query, Utc::now())?;
    let readings = store::query_range(&pool, window.device_id, window.since, window.before).await?;

    info!(
        "GET /data - returning {} reading(s) for device {}",
        readings.len(),
        window.device_id
    );
    Ok(Json(readings.into_iter().map(RawRecord::from).collect()))
}
