use axum::Router;
use sqlx::PgPool;

mod health;
mod ingest;
mod readings;
mod summary;

// ---

pub fn router(pool: PgPool) -> Router {
    // ---
    Router::new()
        .merge(ingest::router())
        .merge(readings::router())
        .merge(summary::router())
        .merge(health::router())
        .with_state(pool)
}
