use serde::Serialize;
use sqlx::FromRow;

/// A row from the `tenant_variables` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TenantVariable {
    pub tenant_name: String,
    pub variable_name: String,
    pub value: String,
}
