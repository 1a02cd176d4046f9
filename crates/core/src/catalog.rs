//! Seams between the domain logic and storage.
//!
//! [`MetadataStore`] is the catalog of job groups, jobs, instructions and
//! tenant variables. [`TargetDatabase`] is where a run's statements are
//! executed. Both are implemented over PostgreSQL in the `db` crate and by
//! in-memory fakes in tests.

use std::fmt;
use std::future::Future;

use serde::Serialize;

use crate::error::CoreError;
use crate::instruction::InstructionKind;
use crate::parser::ParsedInstruction;
use crate::types::DbId;
use crate::variables::TenantVariables;

/// An instruction about to be inserted.
///
/// `ordinal` is the 1-based position within the batch; the store turns it
/// into a sequence number relative to the job's current maximum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstruction {
    pub ordinal: i32,
    pub text: String,
    pub kind: InstructionKind,
    pub enabled: bool,
}

impl From<ParsedInstruction> for NewInstruction {
    fn from(parsed: ParsedInstruction) -> Self {
        Self {
            ordinal: parsed.ordinal,
            text: parsed.text,
            kind: InstructionKind::Sql,
            enabled: true,
        }
    }
}

/// Sequence numbers assigned by an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppendedInstructions {
    /// First sequence number written, `None` when the batch was empty.
    pub first_sequence: Option<i32>,
    pub count: u64,
}

impl AppendedInstructions {
    /// Last sequence number written, `None` when the batch was empty.
    pub fn last_sequence(&self) -> Option<i32> {
        self.first_sequence.map(|first| first + self.count as i32 - 1)
    }
}

/// Row counts from a REPLACE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplacedInstructions {
    pub deleted: u64,
    pub inserted: AppendedInstructions,
}

/// One enabled instruction resolved for execution, with its position in
/// the run's total order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunnableInstruction {
    pub group_name: String,
    pub group_sequence: i32,
    pub job_name: String,
    pub job_sequence: i32,
    pub sequence_number: i32,
    pub kind: InstructionKind,
    pub text: String,
}

impl RunnableInstruction {
    /// Sort key: group, then job, then instruction. Names break ties between
    /// siblings that share a sequence number.
    pub fn order_key(&self) -> (i32, &str, i32, &str, i32) {
        (
            self.group_sequence,
            &self.group_name,
            self.job_sequence,
            &self.job_name,
            self.sequence_number,
        )
    }
}

/// A statement failure reported by the target database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementError {
    /// SQLSTATE or driver error code, when the target reports one.
    pub code: Option<String>,
    pub message: String,
}

impl StatementError {
    pub fn new(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for StatementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Why a target failed to execute one statement.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// The statement was rejected and rolled back. The session is still
    /// usable and the run carries on.
    #[error("{0}")]
    Statement(StatementError),

    /// The session is gone. The run stops here.
    #[error(transparent)]
    Fatal(#[from] CoreError),
}

impl From<StatementError> for ExecuteError {
    fn from(err: StatementError) -> Self {
        Self::Statement(err)
    }
}

/// Persistence for the job catalog.
///
/// Every write commits on its own; there is no transaction spanning a
/// whole ingestion.
pub trait MetadataStore: Send + Sync {
    /// Return the id of the job group called `name`, creating it with
    /// `sequence_number` if it does not exist. An existing group keeps its
    /// stored sequence number.
    fn find_or_create_job_group(
        &self,
        name: &str,
        sequence_number: i32,
    ) -> impl Future<Output = Result<DbId, CoreError>> + Send;

    /// Return the id of the job called `name` in `group_id`, creating it
    /// with `sequence_number` if it does not exist. An existing job keeps
    /// its stored sequence number.
    fn find_or_create_job(
        &self,
        group_id: DbId,
        name: &str,
        sequence_number: i32,
    ) -> impl Future<Output = Result<DbId, CoreError>> + Send;

    /// Insert `instructions` after the job's current highest sequence
    /// number. The batch is written atomically.
    fn append_instructions(
        &self,
        job_id: DbId,
        instructions: &[NewInstruction],
    ) -> impl Future<Output = Result<AppendedInstructions, CoreError>> + Send;

    /// Remove every instruction of the job, returning how many were removed.
    fn delete_instructions(
        &self,
        job_id: DbId,
    ) -> impl Future<Output = Result<u64, CoreError>> + Send;

    /// Remove every instruction of the job, then insert `instructions`
    /// numbered from 1.
    ///
    /// The delete and the insert commit separately. If the insert fails
    /// after the delete succeeded the job is left empty, and the failure is
    /// reported as [`CoreError::PartialReplace`].
    fn replace_instructions(
        &self,
        job_id: DbId,
        instructions: &[NewInstruction],
    ) -> impl Future<Output = Result<ReplacedInstructions, CoreError>> + Send {
        async move {
            let deleted = self.delete_instructions(job_id).await?;
            match self.append_instructions(job_id, instructions).await {
                Ok(inserted) => Ok(ReplacedInstructions { deleted, inserted }),
                Err(source) => Err(CoreError::PartialReplace {
                    job_id,
                    deleted,
                    source: Box::new(source),
                }),
            }
        }
    }

    /// All variables defined for `tenant_name`.
    fn list_tenant_variables(
        &self,
        tenant_name: &str,
    ) -> impl Future<Output = Result<TenantVariables, CoreError>> + Send;

    /// Enabled instructions of the group (optionally one job of it) in run
    /// order. Unknown names yield an empty list.
    fn list_runnable_instructions(
        &self,
        group_name: &str,
        job_name: Option<&str>,
    ) -> impl Future<Output = Result<Vec<RunnableInstruction>, CoreError>> + Send;
}

/// Where a run's statements are executed.
pub trait TargetDatabase: Send + Sync {
    /// Execute one statement in its own transaction, committing on success
    /// and rolling back on failure.
    ///
    /// Losing the session must surface as [`ExecuteError::Fatal`] rather
    /// than as a statement failure.
    fn execute(&self, sql: &str) -> impl Future<Output = Result<(), ExecuteError>> + Send;
}

/// A target that accepts every statement without running it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunTarget;

impl TargetDatabase for DryRunTarget {
    async fn execute(&self, _sql: &str) -> Result<(), ExecuteError> {
        Ok(())
    }
}
