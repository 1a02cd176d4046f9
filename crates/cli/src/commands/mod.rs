//! CLI command implementations

pub mod ingest;
pub mod list;
pub mod migrate;
pub mod run;
pub mod toggle;
