use crate::models::{NewQueryRecord, QueryHistoryRecord};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when reading or writing query history
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only storage for computed queries
pub trait HistoryStore: Send + Sync + 'static {
    /// Persist one record in a single atomic write
    fn insert_query(
        &self,
        record: NewQueryRecord,
    ) -> impl Future<Output = Result<QueryHistoryRecord, StoreError>> + Send;

    /// Most recent records first, at most `limit` of them
    fn recent_queries(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<QueryHistoryRecord>, StoreError>> + Send;

    fn health_check(&self) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// PostgreSQL-backed query history
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(settings: &crate::config::DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!(
            "Connecting to PostgreSQL (max: {}, min: {} connections)",
            settings.max_connections,
            settings.min_connections
        );

        Self::new(
            &settings.url,
            settings.max_connections,
            settings.min_connections,
            Duration::from_secs(settings.acquire_timeout_secs),
            Duration::from_secs(settings.idle_timeout_secs),
        )
        .await
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn record_from_row(row: &PgRow) -> Result<QueryHistoryRecord, sqlx::Error> {
    Ok(QueryHistoryRecord {
        id: row.try_get("id")?,
        source: row.try_get("source")?,
        destination: row.try_get("destination")?,
        kilometers: row.try_get("kilometers")?,
        miles: row.try_get("miles")?,
        created_at: row.try_get("created_at")?,
    })
}

impl HistoryStore for PostgresClient {
    async fn insert_query(&self, record: NewQueryRecord) -> Result<QueryHistoryRecord, StoreError> {
        let query = r#"
            INSERT INTO query_history (source, destination, kilometers, miles)
            VALUES ($1, $2, $3, $4)
            RETURNING id, source, destination,
                      kilometers::float8 AS kilometers,
                      miles::float8 AS miles,
                      created_at
        "#;

        let row = sqlx::query(query)
            .bind(&record.source)
            .bind(&record.destination)
            .bind(record.kilometers)
            .bind(record.miles)
            .fetch_one(&self.pool)
            .await?;

        let stored = record_from_row(&row)?;

        tracing::debug!("Recorded query {}: {} -> {}", stored.id, stored.source, stored.destination);

        Ok(stored)
    }

    async fn recent_queries(&self, limit: u32) -> Result<Vec<QueryHistoryRecord>, StoreError> {
        let query = r#"
            SELECT id, source, destination,
                   kilometers::float8 AS kilometers,
                   miles::float8 AS miles,
                   created_at
            FROM query_history
            ORDER BY created_at DESC, id DESC
            LIMIT $1
        "#;

        let rows = sqlx::query(query)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Unavailable("pool closed".to_string());
        assert_eq!(err.to_string(), "Store unavailable: pool closed");
    }
}
