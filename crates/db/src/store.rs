//! [`MetadataStore`] over the PostgreSQL catalog.

use sqlorch_core::catalog::{
    AppendedInstructions, MetadataStore, NewInstruction, RunnableInstruction,
};
use sqlorch_core::error::CoreError;
use sqlorch_core::types::DbId;
use sqlorch_core::variables::TenantVariables;

use crate::repositories::{InstructionRepo, JobGroupRepo, JobRepo, TenantVariableRepo};
use crate::{create_pool, health_check, is_connection_error, CatalogConfig, DbPool};

/// Catalog access backed by a connection pool whose `search_path` points
/// at the metadata schema.
#[derive(Debug, Clone)]
pub struct PgMetadataStore {
    pool: DbPool,
}

impl PgMetadataStore {
    /// Connect to the catalog and verify the connection.
    pub async fn connect(config: &CatalogConfig) -> Result<Self, CoreError> {
        let pool = create_pool(
            &config.database_url,
            config.schema.as_deref(),
            config.max_connections,
        )
        .await
        .map_err(|e| CoreError::Connection(format!("metadata catalog: {e}")))?;
        health_check(&pool)
            .await
            .map_err(|e| CoreError::Connection(format!("metadata catalog: {e}")))?;
        tracing::info!(schema = config.schema.as_deref().unwrap_or("public"), "Catalog connected");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn lookup_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> CoreError {
    move |err| {
        if is_connection_error(&err) {
            CoreError::Connection(err.to_string())
        } else {
            CoreError::Lookup {
                operation,
                message: err.to_string(),
            }
        }
    }
}

fn write_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> CoreError {
    move |err| {
        if is_connection_error(&err) {
            CoreError::Connection(err.to_string())
        } else {
            CoreError::Persistence {
                operation,
                message: err.to_string(),
            }
        }
    }
}

impl MetadataStore for PgMetadataStore {
    async fn find_or_create_job_group(
        &self,
        name: &str,
        sequence_number: i32,
    ) -> Result<DbId, CoreError> {
        let group = JobGroupRepo::find_or_create(&self.pool, name, sequence_number)
            .await
            .map_err(write_error("find_or_create_job_group"))?;
        Ok(group.id)
    }

    async fn find_or_create_job(
        &self,
        group_id: DbId,
        name: &str,
        sequence_number: i32,
    ) -> Result<DbId, CoreError> {
        let job = JobRepo::find_or_create(&self.pool, group_id, name, sequence_number)
            .await
            .map_err(write_error("find_or_create_job"))?;
        if job.sequence_number != sequence_number {
            tracing::warn!(
                job = name,
                stored = job.sequence_number,
                requested = sequence_number,
                "Job already exists, keeping its stored sequence number",
            );
        }
        Ok(job.id)
    }

    async fn append_instructions(
        &self,
        job_id: DbId,
        instructions: &[NewInstruction],
    ) -> Result<AppendedInstructions, CoreError> {
        InstructionRepo::append(&self.pool, job_id, instructions)
            .await
            .map_err(write_error("append_instructions"))
    }

    async fn delete_instructions(&self, job_id: DbId) -> Result<u64, CoreError> {
        InstructionRepo::delete_for_job(&self.pool, job_id)
            .await
            .map_err(write_error("delete_instructions"))
    }

    async fn list_tenant_variables(&self, tenant_name: &str) -> Result<TenantVariables, CoreError> {
        let rows = TenantVariableRepo::list_for_tenant(&self.pool, tenant_name)
            .await
            .map_err(lookup_error("list_tenant_variables"))?;
        Ok(rows
            .into_iter()
            .map(|row| (row.variable_name, row.value))
            .collect())
    }

    async fn list_runnable_instructions(
        &self,
        group_name: &str,
        job_name: Option<&str>,
    ) -> Result<Vec<RunnableInstruction>, CoreError> {
        InstructionRepo::list_runnable(&self.pool, group_name, job_name)
            .await
            .map_err(lookup_error("list_runnable_instructions"))?
            .into_iter()
            .map(RunnableInstruction::try_from)
            .collect()
    }
}
