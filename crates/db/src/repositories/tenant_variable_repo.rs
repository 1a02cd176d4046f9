//! Repository for the `tenant_variables` table.

use sqlx::PgPool;

use crate::models::tenant_variable::TenantVariable;

pub struct TenantVariableRepo;

impl TenantVariableRepo {
    /// All variables of one tenant, ordered by name.
    pub async fn list_for_tenant(
        pool: &PgPool,
        tenant_name: &str,
    ) -> Result<Vec<TenantVariable>, sqlx::Error> {
        sqlx::query_as::<_, TenantVariable>(
            "SELECT tenant_name, variable_name, value \
             FROM tenant_variables \
             WHERE tenant_name = $1 \
             ORDER BY variable_name",
        )
        .bind(tenant_name)
        .fetch_all(pool)
        .await
    }
}
