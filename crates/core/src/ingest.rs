//! Applying a batch of SQL text to the catalog.

use serde::Serialize;

use crate::catalog::{MetadataStore, NewInstruction};
use crate::error::CoreError;
use crate::instruction::IngestOperation;
use crate::parser::parse_instructions;
use crate::types::DbId;

/// Where and how an ingestion lands in the catalog.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub job_group_name: String,
    pub job_name: String,
    pub operation: IngestOperation,
    /// Used only when the job is created by this ingestion.
    pub job_sequence: i32,
    /// Used only when the job group is created by this ingestion.
    pub group_sequence: i32,
}

impl IngestRequest {
    pub fn new(
        job_group_name: impl Into<String>,
        job_name: impl Into<String>,
        operation: IngestOperation,
        job_sequence: i32,
    ) -> Self {
        Self {
            job_group_name: job_group_name.into(),
            job_name: job_name.into(),
            operation,
            job_sequence,
            group_sequence: 0,
        }
    }

    pub fn with_group_sequence(mut self, group_sequence: i32) -> Self {
        self.group_sequence = group_sequence;
        self
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.job_group_name.trim().is_empty() {
            return Err(CoreError::Validation("job group name must not be empty".into()));
        }
        if self.job_name.trim().is_empty() {
            return Err(CoreError::Validation("job name must not be empty".into()));
        }
        if self.job_sequence < 0 {
            return Err(CoreError::Validation(format!(
                "job sequence number must not be negative, got {}",
                self.job_sequence
            )));
        }
        if self.group_sequence < 0 {
            return Err(CoreError::Validation(format!(
                "job group sequence number must not be negative, got {}",
                self.group_sequence
            )));
        }
        Ok(())
    }
}

/// Outcome of one ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestResult {
    pub job_group_id: DbId,
    pub job_id: DbId,
    pub operation: IngestOperation,
    pub instructions_removed: u64,
    pub instructions_added: u64,
    pub first_sequence: Option<i32>,
    pub last_sequence: Option<i32>,
}

/// Parses source text and applies REPLACE / APPEND / DELETE through a
/// [`MetadataStore`].
pub struct InstructionIngester<'a, S> {
    store: &'a S,
}

impl<'a, S: MetadataStore> InstructionIngester<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Ingest `source` for the job named in `request`.
    ///
    /// `source` is ignored for DELETE and required otherwise. Any catalog
    /// error aborts the ingestion at the step where it happened; nothing
    /// already committed is undone.
    pub async fn ingest(
        &self,
        source: Option<&str>,
        request: &IngestRequest,
    ) -> Result<IngestResult, CoreError> {
        request.validate()?;

        let instructions: Vec<NewInstruction> = if request.operation.reads_source() {
            let source = source.ok_or_else(|| {
                CoreError::Validation(format!(
                    "{} requires source text",
                    request.operation
                ))
            })?;
            parse_instructions(source)
                .into_iter()
                .map(NewInstruction::from)
                .collect()
        } else {
            Vec::new()
        };

        let job_group_id = self
            .store
            .find_or_create_job_group(&request.job_group_name, request.group_sequence)
            .await?;
        let job_id = self
            .store
            .find_or_create_job(job_group_id, &request.job_name, request.job_sequence)
            .await?;

        tracing::debug!(
            job_group = %request.job_group_name,
            job = %request.job_name,
            job_group_id,
            job_id,
            parsed = instructions.len(),
            "Resolved ingestion target",
        );

        let (removed, appended) = match request.operation {
            IngestOperation::Delete => (self.store.delete_instructions(job_id).await?, None),
            IngestOperation::Append => (
                0,
                Some(self.store.append_instructions(job_id, &instructions).await?),
            ),
            IngestOperation::Replace => {
                let replaced = self.store.replace_instructions(job_id, &instructions).await?;
                (replaced.deleted, Some(replaced.inserted))
            }
        };
        let appended = appended.unwrap_or_default();

        let result = IngestResult {
            job_group_id,
            job_id,
            operation: request.operation,
            instructions_removed: removed,
            instructions_added: appended.count,
            first_sequence: appended.first_sequence,
            last_sequence: appended.last_sequence(),
        };

        tracing::info!(
            job_group = %request.job_group_name,
            job = %request.job_name,
            operation = %request.operation,
            removed = result.instructions_removed,
            added = result.instructions_added,
            "Ingestion complete",
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::test_helpers::{FailOn, MemoryStore};

    const THREE: &str = "CREATE TABLE a (id int);\nINSERT INTO a VALUES (1);\nSELECT * FROM a;\n";

    fn request(operation: IngestOperation) -> IngestRequest {
        IngestRequest::new("nightly", "load", operation, 1)
    }

    #[tokio::test]
    async fn replace_numbers_from_one_in_input_order() {
        let store = MemoryStore::default();
        let result = InstructionIngester::new(&store)
            .ingest(Some(THREE), &request(IngestOperation::Replace))
            .await
            .unwrap();

        assert_eq!(result.instructions_added, 3);
        assert_eq!(result.first_sequence, Some(1));
        assert_eq!(result.last_sequence, Some(3));

        let stored = store.instructions(result.job_id);
        assert_eq!(
            stored.iter().map(|(seq, _)| *seq).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(stored[0].1, "CREATE TABLE a (id int);");
        assert_eq!(stored[2].1, "SELECT * FROM a;");
    }

    #[tokio::test]
    async fn dangling_statement_is_ingested() {
        let store = MemoryStore::default();
        let result = InstructionIngester::new(&store)
            .ingest(Some("SELECT 1;\nSELECT 2"), &request(IngestOperation::Replace))
            .await
            .unwrap();
        assert_eq!(result.instructions_added, 2);
        assert_eq!(store.instructions(result.job_id)[1], (2, "SELECT 2".to_string()));
    }

    #[tokio::test]
    async fn replace_twice_is_idempotent() {
        let store = MemoryStore::default();
        let ingester = InstructionIngester::new(&store);
        let first = ingester
            .ingest(Some(THREE), &request(IngestOperation::Replace))
            .await
            .unwrap();
        let after_first = store.instructions(first.job_id);

        let second = ingester
            .ingest(Some(THREE), &request(IngestOperation::Replace))
            .await
            .unwrap();

        assert_eq!(second.job_id, first.job_id);
        assert_eq!(second.job_group_id, first.job_group_id);
        assert_eq!(second.instructions_removed, 3);
        assert_eq!(store.instructions(second.job_id), after_first);
        assert_eq!(store.job_count(), 1);
        assert_eq!(store.group_count(), 1);
    }

    #[tokio::test]
    async fn append_continues_after_current_maximum() {
        let store = MemoryStore::default();
        let ingester = InstructionIngester::new(&store);
        ingester
            .ingest(Some("SELECT 1;\nSELECT 2;"), &request(IngestOperation::Append))
            .await
            .unwrap();
        let second = ingester
            .ingest(Some("SELECT 3;\nSELECT 4;"), &request(IngestOperation::Append))
            .await
            .unwrap();

        assert_eq!(second.first_sequence, Some(3));
        assert_eq!(second.last_sequence, Some(4));
        let stored = store.instructions(second.job_id);
        assert_eq!(
            stored,
            vec![
                (1, "SELECT 1;".to_string()),
                (2, "SELECT 2;".to_string()),
                (3, "SELECT 3;".to_string()),
                (4, "SELECT 4;".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn delete_ignores_source_and_empties_job() {
        let store = MemoryStore::default();
        let ingester = InstructionIngester::new(&store);
        let seeded = ingester
            .ingest(Some(THREE), &request(IngestOperation::Replace))
            .await
            .unwrap();

        let with_source = ingester
            .ingest(Some("SELECT 99;"), &request(IngestOperation::Delete))
            .await
            .unwrap();
        assert_eq!(with_source.instructions_removed, 3);
        assert_eq!(with_source.instructions_added, 0);
        assert!(store.instructions(seeded.job_id).is_empty());

        let without_source = ingester
            .ingest(None, &request(IngestOperation::Delete))
            .await
            .unwrap();
        assert_eq!(without_source.instructions_removed, 0);
        assert!(store.instructions(seeded.job_id).is_empty());
    }

    #[tokio::test]
    async fn existing_job_keeps_its_sequence_number() {
        let store = MemoryStore::default();
        let ingester = InstructionIngester::new(&store);
        let first = ingester
            .ingest(Some("SELECT 1;"), &IngestRequest::new("g", "j", IngestOperation::Append, 5))
            .await
            .unwrap();
        ingester
            .ingest(Some("SELECT 2;"), &IngestRequest::new("g", "j", IngestOperation::Append, 9))
            .await
            .unwrap();
        assert_eq!(store.job_sequence(first.job_id), Some(5));
    }

    #[tokio::test]
    async fn same_job_name_in_other_group_is_a_different_job() {
        let store = MemoryStore::default();
        let ingester = InstructionIngester::new(&store);
        let a = ingester
            .ingest(
                Some("SELECT 1;"),
                &IngestRequest::new("g1", "load", IngestOperation::Replace, 1),
            )
            .await
            .unwrap();
        let b = ingester
            .ingest(
                Some("SELECT 1;"),
                &IngestRequest::new("g2", "load", IngestOperation::Replace, 1),
            )
            .await
            .unwrap();
        assert_ne!(a.job_id, b.job_id);
        assert_ne!(a.job_group_id, b.job_group_id);
    }

    #[tokio::test]
    async fn replace_without_source_is_rejected_before_touching_catalog() {
        let store = MemoryStore::default();
        let err = InstructionIngester::new(&store)
            .ingest(None, &request(IngestOperation::Replace))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
        assert_eq!(store.group_count(), 0);
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let store = MemoryStore::default();
        let err = InstructionIngester::new(&store)
            .ingest(Some("SELECT 1;"), &IngestRequest::new(" ", "j", IngestOperation::Append, 1))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("job group"));
    }

    #[tokio::test]
    async fn failed_insert_after_delete_surfaces_partial_replace() {
        let store = MemoryStore::default();
        let ingester = InstructionIngester::new(&store);
        let seeded = ingester
            .ingest(Some(THREE), &request(IngestOperation::Replace))
            .await
            .unwrap();

        store.fail_on(FailOn::Append);
        let err = ingester
            .ingest(Some("SELECT 1;"), &request(IngestOperation::Replace))
            .await
            .unwrap_err();

        assert_matches!(
            err,
            CoreError::PartialReplace { job_id, deleted: 3, .. } if job_id == seeded.job_id
        );
        assert!(store.instructions(seeded.job_id).is_empty());
    }

    #[tokio::test]
    async fn lookup_failure_aborts_ingestion() {
        let store = MemoryStore::default();
        store.fail_on(FailOn::FindOrCreate);
        let err = InstructionIngester::new(&store)
            .ingest(Some(THREE), &request(IngestOperation::Replace))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Persistence { .. });
    }
}
