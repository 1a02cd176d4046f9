//! Ingest command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use sqlorch_core::error::CoreError;
use sqlorch_core::ingest::{IngestRequest, IngestResult, InstructionIngester};
use sqlorch_core::instruction::IngestOperation;
use sqlorch_db::{CatalogConfig, PgMetadataStore};

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// SQL source file (not opened for DELETE)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Job group name
    #[arg(short, long)]
    pub group: String,

    /// Job name within the group
    #[arg(short, long)]
    pub job: String,

    /// APPEND, REPLACE or DELETE
    #[arg(short, long, value_parser = parse_operation)]
    pub operation: IngestOperation,

    /// Job sequence number, applied only when the job is created
    #[arg(short, long, default_value_t = 0)]
    pub sequence: i32,

    /// Job group sequence number, applied only when the group is created
    #[arg(long, default_value_t = 0)]
    pub group_sequence: i32,
}

fn parse_operation(value: &str) -> Result<IngestOperation, CoreError> {
    value.parse()
}

pub async fn execute(config: &CatalogConfig, args: &IngestArgs) -> Result<()> {
    let source = load_source(args.operation, args.file.as_deref())?;

    let store = PgMetadataStore::connect(config)
        .await
        .context("connecting to metadata catalog")?;

    let request = IngestRequest::new(&args.group, &args.job, args.operation, args.sequence)
        .with_group_sequence(args.group_sequence);
    let result = InstructionIngester::new(&store)
        .ingest(source.as_deref(), &request)
        .await
        .with_context(|| {
            format!(
                "{} ingestion into job group '{}', job '{}'",
                args.operation, args.group, args.job
            )
        })?;

    println!("{}", summary(&args.group, &args.job, &result));
    Ok(())
}

/// Read the source file for operations that consume it. DELETE never
/// touches the path.
fn load_source(operation: IngestOperation, path: Option<&Path>) -> Result<Option<String>> {
    if !operation.reads_source() {
        return Ok(None);
    }
    let path = path.with_context(|| format!("--file is required for {operation}"))?;
    let text = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(text))
}

fn summary(group: &str, job: &str, result: &IngestResult) -> String {
    let mut line = format!(
        "{} {group}/{job}: instructions removed: {}, instructions added: {}",
        result.operation, result.instructions_removed, result.instructions_added
    );
    if let (Some(first), Some(last)) = (result.first_sequence, result.last_sequence) {
        line.push_str(&format!(" (sequence {first}..{last})"));
    }
    line
}
