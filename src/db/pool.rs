//! Connection pool for the SQLite record store
use anyhow::{Context, Result};
use derive_builder::Builder;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::{CONNECT_TIMEOUT, MAX_CONNECTIONS};

// Wrap the sqlx pool so callers don't depend on the driver's pool options.
#[derive(Debug, Clone)]
pub struct Pool {
    inner: sqlx::SqlitePool,
}

#[derive(Builder)]
pub struct PoolArgs {
    #[builder(setter(into))]
    url: String,
    #[builder(default = "MAX_CONNECTIONS")]
    max_connections: u32,
    #[builder(default = "false")]
    create_if_missing: bool,
}

pub async fn pool(args: PoolArgs) -> Result<Pool> {
    let PoolArgs {
        url,
        max_connections,
        create_if_missing,
    } = args;

    let connect_options = SqliteConnectOptions::from_str(&url)
        .with_context(|| format!("Invalid database URL: {}", url))?
        .create_if_missing(create_if_missing);

    let sqlite_pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect_with(connect_options)
        .await
        .context("Failed to create connection pool")?;

    tracing::info!(url = %url, max_connections, "connected to database");

    Ok(Pool { inner: sqlite_pool })
}

impl Pool {
    /// Create an in-memory SQLite pool for testing
    ///
    /// Every SQLite connection to `:memory:` opens its own database, so the
    /// pool is held to a single connection that never expires.
    #[cfg(test)]
    pub async fn sqlite_in_memory() -> Result<Self, sqlx::Error> {
        let sqlite_pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Ok(Pool { inner: sqlite_pool })
    }

    pub fn inner(&self) -> &sqlx::SqlitePool {
        &self.inner
    }

    /// Execute a query without results (DDL in tests and setup)
    pub async fn execute_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        sqlx::query(sql).execute(&self.inner).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_pool_creates_database_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("import.db");
        let args = PoolArgsBuilder::default()
            .url(format!("sqlite://{}", path.display()))
            .create_if_missing(true)
            .build()
            .unwrap();

        let pool = pool(args).await.unwrap();
        pool.execute_query("CREATE TABLE t (a TEXT)").await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_pool_missing_database_without_create() {
        let dir = TempDir::new().unwrap();
        let args = PoolArgsBuilder::default()
            .url(format!("sqlite://{}", dir.path().join("absent.db").display()))
            .build()
            .unwrap();

        assert!(pool(args).await.is_err());
    }

    #[tokio::test]
    async fn test_default_connection_limit() {
        let args = PoolArgsBuilder::default()
            .url("sqlite::memory:")
            .build()
            .unwrap();
        assert_eq!(args.max_connections, MAX_CONNECTIONS);
        assert!(!args.create_if_missing);
    }
}
