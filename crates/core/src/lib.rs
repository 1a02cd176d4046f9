//! Domain logic for the SQL job orchestrator.
//!
//! Everything in this crate is storage-agnostic: the catalog and the target
//! database are reached only through the traits in [`catalog`], so the
//! ingestion and execution rules can be exercised without a live database.

pub mod catalog;
pub mod error;
pub mod executor;
pub mod ingest;
pub mod instruction;
pub mod parser;
pub mod report;
pub mod types;
pub mod variables;

#[cfg(test)]
pub(crate) mod test_helpers;
