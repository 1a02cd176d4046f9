//! Job group entity model.

use serde::Serialize;
use sqlx::FromRow;
use sqlorch_core::types::{DbId, Timestamp};

/// A row from the `job_groups` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobGroup {
    pub id: DbId,
    pub name: String,
    pub sequence_number: i32,
    pub created_at: Timestamp,
}
