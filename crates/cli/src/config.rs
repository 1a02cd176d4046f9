use anyhow::{bail, Result};
use clap::Args;
use sqlorch_db::{CatalogConfig, TargetConfig};

/// Connection settings shared by every command.
///
/// | Flag                | Env Var                   | Default          |
/// |---------------------|---------------------------|------------------|
/// | `--catalog-url`     | `SQLORCH_CATALOG_URL`     | required         |
/// | `--target-url`      | `SQLORCH_TARGET_URL`      | the catalog URL  |
/// | `--schema`          | `SQLORCH_SCHEMA`          | `sqlorch`        |
/// | `--max-connections` | `SQLORCH_MAX_CONNECTIONS` | `5`              |
///
/// A `.env` file in the working directory is loaded before parsing.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// Metadata catalog database URL
    #[arg(long, env = "SQLORCH_CATALOG_URL", global = true, hide_env_values = true)]
    pub catalog_url: Option<String>,

    /// Target database URL instructions are executed against
    #[arg(long, env = "SQLORCH_TARGET_URL", global = true, hide_env_values = true)]
    pub target_url: Option<String>,

    /// Schema holding the catalog tables
    #[arg(long, env = "SQLORCH_SCHEMA", default_value = "sqlorch", global = true)]
    pub schema: String,

    /// Catalog connection pool size
    #[arg(long, env = "SQLORCH_MAX_CONNECTIONS", default_value_t = 5, global = true)]
    pub max_connections: u32,
}

impl ConnectionArgs {
    pub fn catalog(&self) -> Result<CatalogConfig> {
        let Some(database_url) = self.catalog_url.clone().filter(|u| !u.trim().is_empty()) else {
            bail!("catalog database URL not set (use --catalog-url or SQLORCH_CATALOG_URL)");
        };
        if self.schema.trim().is_empty() {
            bail!("metadata schema must not be empty");
        }
        if self.max_connections == 0 {
            bail!("max connections must be at least 1");
        }
        Ok(CatalogConfig {
            database_url,
            schema: Some(self.schema.clone()),
            max_connections: self.max_connections,
        })
    }

    pub fn target(&self) -> Result<TargetConfig> {
        let database_url = match self.target_url.clone().filter(|u| !u.trim().is_empty()) {
            Some(url) => url,
            None => self.catalog()?.database_url,
        };
        Ok(TargetConfig { database_url })
    }
}
