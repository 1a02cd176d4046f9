//! Migrate command

use anyhow::{Context, Result};
use sqlorch_db::{create_pool, ensure_schema, run_migrations, CatalogConfig};

/// Create the metadata schema if needed and apply pending migrations
/// inside it.
pub async fn execute(config: &CatalogConfig) -> Result<()> {
    if let Some(schema) = config.schema.as_deref() {
        let bootstrap = create_pool(&config.database_url, None, 1)
            .await
            .context("connecting to metadata catalog")?;
        ensure_schema(&bootstrap, schema)
            .await
            .with_context(|| format!("creating schema '{schema}'"))?;
        bootstrap.close().await;
    }

    let pool = create_pool(&config.database_url, config.schema.as_deref(), 1)
        .await
        .context("connecting to metadata catalog")?;
    run_migrations(&pool).await.context("applying migrations")?;
    pool.close().await;

    tracing::info!(
        schema = config.schema.as_deref().unwrap_or("public"),
        "Catalog migrations applied"
    );
    Ok(())
}
