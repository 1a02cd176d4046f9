//! Enable / disable commands

use anyhow::{bail, Context, Result};
use clap::Args;
use sqlorch_db::repositories::{InstructionRepo, JobGroupRepo, JobRepo};
use sqlorch_db::{CatalogConfig, PgMetadataStore};

/// Identifies one instruction by group name, job name and sequence number.
#[derive(Debug, Args)]
pub struct InstructionRef {
    #[arg(short, long)]
    pub group: String,

    #[arg(short, long)]
    pub job: String,

    /// Instruction sequence number within the job
    #[arg(short, long)]
    pub sequence: i32,
}

pub async fn execute(config: &CatalogConfig, target: &InstructionRef, enabled: bool) -> Result<()> {
    let store = PgMetadataStore::connect(config)
        .await
        .context("connecting to metadata catalog")?;
    let pool = store.pool();

    let Some(group) = JobGroupRepo::find_by_name(pool, &target.group).await? else {
        bail!("job group '{}' not found", target.group);
    };
    let Some(job) = JobRepo::find_by_name(pool, group.id, &target.job).await? else {
        bail!("job '{}' not found in group '{}'", target.job, target.group);
    };
    if !InstructionRepo::set_enabled(pool, job.id, target.sequence, enabled).await? {
        bail!(
            "job '{}' has no instruction with sequence number {}",
            target.job,
            target.sequence
        );
    }

    let state = if enabled { "enabled" } else { "disabled" };
    tracing::info!(
        job_group = %target.group,
        job = %target.job,
        sequence_number = target.sequence,
        "Instruction {state}"
    );
    println!("{}/{} #{} {state}", target.group, target.job, target.sequence);
    Ok(())
}
