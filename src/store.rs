//! Storage collaborator: persistence and range reads for readings.
//!
//! The core never talks to PostgreSQL directly; these two functions are the
//! whole storage contract it relies on.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Reading;

// ---

/// Persist one immutable reading. `ingested_at` is filled by the database.
pub async fn insert(pool: &PgPool, reading: &Reading) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        r#"
        INSERT INTO readings (device_id, recorded_at, label, value, lat, lng)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(reading.device_id)
    .bind(reading.recorded_at)
    .bind(reading.label)
    .bind(reading.value)
    .bind(reading.location.lat)
    .bind(reading.location.lng)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch all readings for a device with `recorded_at` strictly inside the
/// window (exclusive on both ends). Row order is whatever the database
/// returns; the contract guarantees none.
pub async fn query_range(
    pool: &PgPool,
    device_id: Uuid,
    since: Option<DateTime<Utc>>,
    before: DateTime<Utc>,
) -> Result<Vec<Reading>, sqlx::Error> {
    // ---
    match since {
        Some(since) => {
            sqlx::query_as::<_, Reading>(
                r#"
                SELECT label, value, recorded_at, device_id, lat, lng
                FROM readings
                WHERE device_id = $1 AND recorded_at > $2 AND recorded_at < $3
                "#,
            )
            .bind(device_id)
            .bind(since)
            .bind(before)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Reading>(
                r#"
                SELECT label, value, recorded_at, device_id, lat, lng
                FROM readings
                WHERE device_id = $1 AND recorded_at < $2
                "#,
            )
            .bind(device_id)
            .bind(before)
            .fetch_all(pool)
            .await
        }
    }
}
