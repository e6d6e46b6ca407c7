use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager and the query layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds and checks the PostgreSQL pool backing the note store
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool using the configured URL and limits
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(pool: &PgPool) {
        pool.close().await;
        info!("Closed database pool");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_without_url_reports_missing_config() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 1,
            connection_timeout: 1,
        };

        let err = DatabaseManager::connect(&config).await.unwrap_err();
        assert!(matches!(err, DatabaseError::ConfigMissing("DATABASE_URL")));
    }
}
