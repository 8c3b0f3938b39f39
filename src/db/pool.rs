//! Connection pool construction.
//!
//! One long-lived `PgPool` is created at startup from the resolved connection
//! URL and passed explicitly into every tool handler. The pool owns connection
//! checkout, limits, and health checks; the tool layer adds no locking of its
//! own.

use crate::config::Config;
use crate::error::{DbError, DbResult};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// Open a connection pool against the given URL.
pub async fn connect(url: &str, config: &Config) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout_duration())
        .connect(url)
        .await
        .map_err(|e| {
            DbError::connection(
                format!("Failed to create connection pool: {e}"),
                "Check the connection string, credentials, and server availability",
            )
        })?;

    info!(
        max_connections = config.max_connections,
        "Connection pool created"
    );
    Ok(pool)
}

/// Liveness check executed before any tool call is accepted.
pub async fn ping(pool: &PgPool) -> DbResult<()> {
    sqlx::query("SELECT 1").execute(pool).await.map_err(|e| {
        DbError::connection(
            format!("Failed to connect to database: {e}"),
            "Verify the database is running and reachable",
        )
    })?;
    Ok(())
}
