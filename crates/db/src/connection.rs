//! Sqlite pool construction.
//!
//! The store sees short bursts of single-row writes (one receipt per upload,
//! one chat entry per answered question) and small point reads, so the pool
//! stays small and leans on WAL for read concurrency.

use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

pub type DbPool = sqlx::SqlitePool;

/// Session-level tuning applied to every new connection. `synchronous`
/// is relaxed to NORMAL because WAL already bounds the loss window to the
/// last checkpoint.
const CONNECTION_PRAGMAS: &[&str] = &[
    "PRAGMA foreign_keys = ON",
    "PRAGMA journal_mode = WAL",
    "PRAGMA synchronous = NORMAL",
    "PRAGMA busy_timeout = 5000",
];

const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
const MAX_POOL_SIZE: u32 = 16;

pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(database_url, DEFAULT_MAX_CONNECTIONS, DEFAULT_ACQUIRE_TIMEOUT_SECS)
        .await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.clamp(1, MAX_POOL_SIZE))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                for pragma in CONNECTION_PRAGMAS {
                    sqlx::query(pragma).execute(&mut *conn).await?;
                }
                Ok(())
            })
        })
        .connect(database_url)
        .await
}

#[cfg(test)]
mod tests {
    use super::{connect, connect_with_settings};

    #[tokio::test]
    async fn connections_carry_the_session_pragmas() {
        let pool = connect("sqlite::memory:").await.expect("pool should connect");

        let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .expect("read foreign_keys");
        assert_eq!(foreign_keys, 1);

        let busy_timeout: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
            .fetch_one(&pool)
            .await
            .expect("read busy_timeout");
        assert_eq!(busy_timeout, 5000);

        pool.close().await;
    }

    #[tokio::test]
    async fn degenerate_pool_settings_are_clamped() {
        let pool = connect_with_settings("sqlite::memory:", 0, 0)
            .await
            .expect("pool should connect even with zero settings");

        let one: i64 =
            sqlx::query_scalar("SELECT 1").fetch_one(&pool).await.expect("query should run");
        assert_eq!(one, 1);

        pool.close().await;
    }
}
