//! Repository for the `jobs` table.

use sqlx::PgPool;
use sqlorch_core::types::DbId;

use crate::models::job::Job;

/// Column list for `jobs` queries.
const COLUMNS: &str = "id, job_group_id, name, sequence_number, created_at";

pub struct JobRepo;

impl JobRepo {
    /// Return the job called `name` within `job_group_id`, inserting it with
    /// `sequence_number` if absent. An existing job keeps its stored
    /// sequence number.
    pub async fn find_or_create(
        pool: &PgPool,
        job_group_id: DbId,
        name: &str,
        sequence_number: i32,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (job_group_id, name, sequence_number) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_jobs_group_name \
             DO UPDATE SET name = EXCLUDED.name \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job_group_id)
            .bind(name)
            .bind(sequence_number)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_name(
        pool: &PgPool,
        job_group_id: DbId,
        name: &str,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE job_group_id = $1 AND name = $2");
        sqlx::query_as::<_, Job>(&query)
            .bind(job_group_id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Jobs of a group in run order.
    pub async fn list_for_group(
        pool: &PgPool,
        job_group_id: DbId,
    ) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE job_group_id = $1 \
             ORDER BY sequence_number, name"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job_group_id)
            .fetch_all(pool)
            .await
    }
}
