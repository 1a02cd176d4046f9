//! List command

use anyhow::{bail, Context, Result};
use clap::Args;
use sqlorch_db::models::job_group::JobGroup;
use sqlorch_db::repositories::{InstructionRepo, JobGroupRepo, JobRepo};
use sqlorch_db::{CatalogConfig, PgMetadataStore};

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only show this job group
    #[arg(short, long)]
    pub group: Option<String>,
}

pub async fn execute(config: &CatalogConfig, args: &ListArgs) -> Result<()> {
    let store = PgMetadataStore::connect(config)
        .await
        .context("connecting to metadata catalog")?;
    let pool = store.pool();

    let groups: Vec<JobGroup> = match &args.group {
        Some(name) => match JobGroupRepo::find_by_name(pool, name).await? {
            Some(group) => vec![group],
            None => bail!("job group '{name}' not found"),
        },
        None => JobGroupRepo::list(pool).await?,
    };

    if groups.is_empty() {
        println!("No job groups defined");
        return Ok(());
    }

    for group in &groups {
        println!("{} (sequence {})", group.name, group.sequence_number);
        for job in JobRepo::list_for_group(pool, group.id).await? {
            let count = InstructionRepo::count_for_job(pool, job.id).await?;
            println!(
                "  {:>4}  {}  ({count} instructions)",
                job.sequence_number, job.name
            );
        }
    }
    Ok(())
}
