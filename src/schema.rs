//! Database schema management for `measurements-api`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `readings` table and the indexes the fetch queries lean on.
/// Safe to call on every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // One row per accepted measurement; rows are immutable once written.
    // `ingested_at` records server-side arrival time and is never exposed
    // through the API.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS readings (
            id          BIGSERIAL PRIMARY KEY,
            device_id   UUID             NOT NULL,
            recorded_at TIMESTAMPTZ      NOT NULL,
            label       TEXT             NOT NULL,
            value       DOUBLE PRECISION NOT NULL,
            lat         DOUBLE PRECISION NOT NULL,
            lng         DOUBLE PRECISION NOT NULL,
            ingested_at TIMESTAMPTZ      NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Every fetch filters on (device_id, recorded_at)
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_readings_device_recorded
            ON readings (device_id, recorded_at);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_readings_label_recorded
            ON readings (label, recorded_at);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
