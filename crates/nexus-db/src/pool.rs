use crate::error::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::info;

pub type DbPool = Pool<Postgres>;

pub struct PoolConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

pub async fn create_pool(config: &PoolConfig) -> Result<DbPool> {
    info!("connecting to the gateway's Postgres database");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;
    info!("database connection verified");
    Ok(pool)
}

/// Compares the schema version recorded in `schema_version` against the
/// version this binary was built against, refusing to run against a
/// database it doesn't understand.
pub async fn check_schema_version(pool: &DbPool, expected: i32) -> Result<()> {
    let row: (i32,) = sqlx::query_as("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
        .fetch_one(pool)
        .await?;
    if row.0 != expected {
        return Err(crate::error::StoreError::Database(sqlx::Error::Protocol(
            format!("schema at version {}, binary expects {expected}", row.0),
        )));
    }
    Ok(())
}
