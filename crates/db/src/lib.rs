//! PostgreSQL persistence for the job catalog and statement execution
//! against target databases.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub mod models;
pub mod repositories;
pub mod store;
pub mod target;

pub use store::PgMetadataStore;
pub use target::PgTargetDatabase;

pub type DbPool = sqlx::PgPool;

/// Connection settings for the metadata catalog.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub database_url: String,
    /// Schema holding the catalog tables, applied via `search_path`.
    pub schema: Option<String>,
    pub max_connections: u32,
}

/// Connection settings for the database instructions run against.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub database_url: String,
}

/// Create a connection pool from a database URL, optionally pinning the
/// session `search_path` to `schema`.
///
/// Connects eagerly so an unreachable server fails here rather than on the
/// first query.
pub async fn create_pool(
    database_url: &str,
    schema: Option<&str>,
    max_connections: u32,
) -> Result<DbPool, sqlx::Error> {
    let mut options = PgConnectOptions::from_str(database_url)?;
    if let Some(schema) = schema {
        options = options.options([("search_path", schema)]);
    }
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Round-trip a trivial query to verify the connection works.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Create `schema` if missing.
///
/// Identifiers cannot be bound as parameters, so the name is quoted here.
pub async fn ensure_schema(pool: &DbPool, schema: &str) -> Result<(), sqlx::Error> {
    let statement = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema));
    sqlx::query(&statement).execute(pool).await?;
    Ok(())
}

/// Apply the catalog migrations in `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Double-quote a PostgreSQL identifier.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Whether a sqlx error means the server could not be reached or the pool
/// is unusable, as opposed to a query-level failure.
pub fn is_connection_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}
