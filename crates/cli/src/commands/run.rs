//! Run command

use anyhow::{Context, Result};
use clap::Args;
use sqlorch_core::catalog::{DryRunTarget, MetadataStore, TargetDatabase};
use sqlorch_core::executor::JobExecutor;
use sqlorch_core::report::RunReport;
use sqlorch_db::{CatalogConfig, PgMetadataStore, PgTargetDatabase, TargetConfig};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Tenant whose variables are substituted
    #[arg(short, long)]
    pub tenant: String,

    /// Job group to execute
    #[arg(short, long)]
    pub group: String,

    /// Restrict the run to one job of the group
    #[arg(short, long)]
    pub job: Option<String>,

    /// Expand and report instructions without executing them
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON instead of trace lines
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(catalog: &CatalogConfig, target: &TargetConfig, args: &RunArgs) -> Result<()> {
    let store = PgMetadataStore::connect(catalog)
        .await
        .context("connecting to metadata catalog")?;

    let report = if args.dry_run {
        tracing::info!("Dry run, statements will not be executed");
        run(&store, &DryRunTarget, args).await?
    } else {
        let target_db = PgTargetDatabase::connect(target)
            .await
            .context("connecting to target database")?;
        let report = run(&store, &target_db, args).await;
        if let Err(e) = target_db.close().await {
            tracing::warn!(error = %e, "Failed to close target session");
        }
        report?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary_line());
    }
    Ok(())
}

async fn run<S, T>(store: &S, target: &T, args: &RunArgs) -> Result<RunReport>
where
    S: MetadataStore,
    T: TargetDatabase,
{
    let json = args.json;
    let report = JobExecutor::new(store, target)
        .run_with_observer(&args.tenant, &args.group, args.job.as_deref(), |outcome| {
            if !json {
                println!("{}", outcome.trace_line());
            }
        })
        .await
        .with_context(|| format!("running job group '{}'", args.group))?;
    Ok(report)
}
