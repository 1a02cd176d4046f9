//! Instruction entity model and the joined row used for runs.

use serde::Serialize;
use sqlx::FromRow;
use sqlorch_core::catalog::RunnableInstruction;
use sqlorch_core::error::CoreError;
use sqlorch_core::types::{DbId, Timestamp};

/// A row from the `instructions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Instruction {
    pub id: DbId,
    pub job_id: DbId,
    pub sequence_number: i32,
    /// One of `sql`, `script`, `job`, `job_group`.
    pub instruction_type: String,
    pub text: String,
    pub enabled: bool,
    pub created_at: Timestamp,
}

/// An enabled instruction joined with its job and job group.
#[derive(Debug, Clone, FromRow)]
pub struct RunnableInstructionRow {
    pub group_name: String,
    pub group_sequence: i32,
    pub job_name: String,
    pub job_sequence: i32,
    pub sequence_number: i32,
    pub instruction_type: String,
    pub text: String,
}

impl TryFrom<RunnableInstructionRow> for RunnableInstruction {
    type Error = CoreError;

    fn try_from(row: RunnableInstructionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: row.instruction_type.parse()?,
            group_name: row.group_name,
            group_sequence: row.group_sequence,
            job_name: row.job_name,
            job_sequence: row.job_sequence,
            sequence_number: row.sequence_number,
            text: row.text,
        })
    }
}
