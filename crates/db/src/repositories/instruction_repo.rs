//! Repository for the `instructions` table.

use sqlx::PgPool;
use sqlorch_core::catalog::{AppendedInstructions, NewInstruction};
use sqlorch_core::types::DbId;

use crate::models::instruction::{Instruction, RunnableInstructionRow};

/// Column list for `instructions` queries.
const COLUMNS: &str =
    "id, job_id, sequence_number, instruction_type, text, enabled, created_at";

pub struct InstructionRepo;

impl InstructionRepo {
    /// Insert `instructions` after the job's current highest sequence
    /// number, in one transaction.
    ///
    /// The job row is locked first so concurrent appends to the same job
    /// serialize instead of colliding on `uq_instructions_job_sequence`.
    pub async fn append(
        pool: &PgPool,
        job_id: DbId,
        instructions: &[NewInstruction],
    ) -> Result<AppendedInstructions, sqlx::Error> {
        if instructions.is_empty() {
            return Ok(AppendedInstructions::default());
        }

        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(job_id)
            .fetch_one(&mut *tx)
            .await?;

        let (base,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(sequence_number), 0) FROM instructions WHERE job_id = $1",
        )
        .bind(job_id)
        .fetch_one(&mut *tx)
        .await?;

        let ordinals: Vec<i32> = instructions.iter().map(|i| i.ordinal).collect();
        let kinds: Vec<&str> = instructions.iter().map(|i| i.kind.as_str()).collect();
        let texts: Vec<&str> = instructions.iter().map(|i| i.text.as_str()).collect();
        let enabled: Vec<bool> = instructions.iter().map(|i| i.enabled).collect();

        let inserted = sqlx::query(
            "INSERT INTO instructions (job_id, sequence_number, instruction_type, text, enabled) \
             SELECT $1, $2 + t.ordinal, t.kind, t.text, t.enabled \
             FROM UNNEST($3::int4[], $4::text[], $5::text[], $6::bool[]) \
                 AS t(ordinal, kind, text, enabled)",
        )
        .bind(job_id)
        .bind(base)
        .bind(&ordinals)
        .bind(&kinds)
        .bind(&texts)
        .bind(&enabled)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AppendedInstructions {
            first_sequence: Some(base + 1),
            count: inserted.rows_affected(),
        })
    }

    /// Delete every instruction of a job. Returns the number removed.
    pub async fn delete_for_job(pool: &PgPool, job_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM instructions WHERE job_id = $1")
            .bind(job_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// A job's instructions by sequence number, disabled ones included.
    pub async fn list_for_job(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<Vec<Instruction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM instructions \
             WHERE job_id = $1 \
             ORDER BY sequence_number"
        );
        sqlx::query_as::<_, Instruction>(&query)
            .bind(job_id)
            .fetch_all(pool)
            .await
    }

    pub async fn count_for_job(pool: &PgPool, job_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM instructions WHERE job_id = $1")
                .bind(job_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Enable or disable one instruction. Returns `false` if the job has no
    /// instruction with that sequence number.
    pub async fn set_enabled(
        pool: &PgPool,
        job_id: DbId,
        sequence_number: i32,
        enabled: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE instructions SET enabled = $3 WHERE job_id = $1 AND sequence_number = $2",
        )
        .bind(job_id)
        .bind(sequence_number)
        .bind(enabled)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Enabled instructions of a group, optionally narrowed to one job, in
    /// `(group, job, instruction)` sequence order.
    pub async fn list_runnable(
        pool: &PgPool,
        group_name: &str,
        job_name: Option<&str>,
    ) -> Result<Vec<RunnableInstructionRow>, sqlx::Error> {
        sqlx::query_as::<_, RunnableInstructionRow>(
            "SELECT g.name AS group_name, g.sequence_number AS group_sequence, \
                    j.name AS job_name, j.sequence_number AS job_sequence, \
                    i.sequence_number, i.instruction_type, i.text \
             FROM instructions i \
             JOIN jobs j ON j.id = i.job_id \
             JOIN job_groups g ON g.id = j.job_group_id \
             WHERE g.name = $1 \
               AND ($2::text IS NULL OR j.name = $2) \
               AND i.enabled \
             ORDER BY g.sequence_number, g.name, j.sequence_number, j.name, i.sequence_number",
        )
        .bind(group_name)
        .bind(job_name)
        .fetch_all(pool)
        .await
    }
}
