//! SQLite connection pool. The database file is created on first connect.

use crate::config::Settings;
use crate::error::{AppError, ConfigError};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// How long a write waits for another writer's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a pool with foreign keys enforced. In-memory URLs get a single long-lived
/// connection so every query sees the same database; file databases run in WAL
/// mode so reads proceed while a writer holds the lock.
pub async fn open_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, AppError> {
    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let mut opts = SqliteConnectOptions::from_str(database_url)
        .map_err(|_| ConfigError::InvalidSetting {
            key: "DATABASE_URL",
            value: database_url.to_string(),
        })?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);
    if !in_memory {
        opts = opts.journal_mode(SqliteJournalMode::Wal);
    }
    let mut pool_opts = SqlitePoolOptions::new().max_connections(max_connections);
    if in_memory {
        pool_opts = pool_opts
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>);
    }
    let pool = pool_opts.connect_with(opts).await?;
    tracing::info!(url = %database_url, "database pool open");
    Ok(pool)
}

pub async fn open_pool_from_settings(settings: &Settings) -> Result<SqlitePool, AppError> {
    open_pool(&settings.database_url, settings.max_connections).await
}

/// Round-trip a trivial query; used by the readiness probe.
pub async fn ping(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query("SELECT 1").fetch_optional(pool).await?;
    Ok(())
}
