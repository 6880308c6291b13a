use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;

use crate::aggregate::{self, FetchQuery};
use crate::errors::ApiError;
use crate::{store, RawRecord, SlotRecord};

// ---

pub fn router() -> Router<PgPool> {
    // ---
    Router::new().route("/summary", get(handler))
}

/// Handle `GET /summary`: readings for one device, optionally reduced into
/// hourly or daily slots.
///
/// Without `span` (or with `span=raw`) this behaves exactly like `/data`.
/// With `span=hour` or `span=day` each reading is assigned to its
/// calendar-aligned slot and every `(label, slot)` group is reduced with the
/// label's strategy: mean for temperature and humidity, sum for rainfall.
async fn handler(
    Query(query): Query<FetchQuery>,
    State(pool): State<PgPool>,
) -> Result<Response, ApiError> {
    // ---
    let window = aggregate::resolve_window(&query, Utc::now())?;
    let span = aggregate::resolve_span(&query)?;

    let readings = store::query_range(&pool, window.device_id, window.since, window.before).await?;

    let response = match span {
        None => {
            info!(
                "GET /summary - returning {} raw reading(s) for device {}",
                readings.len(),
                window.device_id
            );
            let records: Vec<RawRecord> = readings.into_iter().map(RawRecord::from).collect();
            Json(records).into_response()
        }
        Some(span) => {
            let slots: Vec<SlotRecord> = aggregate::aggregate(span, &readings);
            info!(
                "GET /summary - reduced {} reading(s) into {} slot(s) for device {}",
                readings.len(),
                slots.len(),
                window.device_id
            );
            Json(slots).into_response()
        }
    };

    Ok(response)
}
