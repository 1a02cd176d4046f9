//! Repository for the `job_groups` table.

use sqlx::PgPool;

use crate::models::job_group::JobGroup;

/// Column list for `job_groups` queries.
const COLUMNS: &str = "id, name, sequence_number, created_at";

pub struct JobGroupRepo;

impl JobGroupRepo {
    /// Return the group called `name`, inserting it with `sequence_number`
    /// if absent.
    ///
    /// A single upsert against `uq_job_groups_name`, so two concurrent
    /// callers both get the same row. The no-op `DO UPDATE` makes
    /// `RETURNING` yield the existing row; its sequence number is kept.
    pub async fn find_or_create(
        pool: &PgPool,
        name: &str,
        sequence_number: i32,
    ) -> Result<JobGroup, sqlx::Error> {
        let query = format!(
            "INSERT INTO job_groups (name, sequence_number) \
             VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_job_groups_name \
             DO UPDATE SET name = EXCLUDED.name \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobGroup>(&query)
            .bind(name)
            .bind(sequence_number)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<JobGroup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM job_groups WHERE name = $1");
        sqlx::query_as::<_, JobGroup>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// All groups in run order.
    pub async fn list(pool: &PgPool) -> Result<Vec<JobGroup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM job_groups ORDER BY sequence_number, name");
        sqlx::query_as::<_, JobGroup>(&query).fetch_all(pool).await
    }
}
