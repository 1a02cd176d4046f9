//! Job entity model.

use serde::Serialize;
use sqlx::FromRow;
use sqlorch_core::types::{DbId, Timestamp};

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub job_group_id: DbId,
    pub name: String,
    pub sequence_number: i32,
    pub created_at: Timestamp,
}
