//! In-memory fakes of the catalog and target for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::catalog::{
    AppendedInstructions, ExecuteError, MetadataStore, NewInstruction, RunnableInstruction,
    StatementError, TargetDatabase,
};
use crate::error::CoreError;
use crate::instruction::InstructionKind;
use crate::types::DbId;
use crate::variables::TenantVariables;

/// Which store operation should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    FindOrCreate,
    Append,
    /// Every operation fails as if the catalog were unreachable.
    Connection,
}

#[derive(Debug)]
struct InstructionRow {
    id: DbId,
    job_id: DbId,
    sequence_number: i32,
    text: String,
    kind: InstructionKind,
    enabled: bool,
}

#[derive(Debug, Default)]
struct State {
    next_id: DbId,
    groups: Vec<(DbId, String, i32)>,
    jobs: Vec<(DbId, DbId, String, i32)>,
    instructions: Vec<InstructionRow>,
    variables: BTreeMap<(String, String), String>,
    fail_on: Option<FailOn>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn check(&self, op: FailOn, operation: &'static str) -> Result<(), CoreError> {
        match self.fail_on {
            Some(FailOn::Connection) => Err(CoreError::Connection("catalog unreachable".into())),
            Some(fail) if fail == op => Err(CoreError::Persistence {
                operation,
                message: "forced failure".into(),
            }),
            _ => Ok(()),
        }
    }
}

/// Catalog kept in a mutex; `list_runnable_instructions` returns rows in
/// insertion order, not run order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn fail_on(&self, fail: FailOn) {
        self.lock().fail_on = Some(fail);
    }

    pub fn add_group(&self, name: &str, sequence_number: i32) -> DbId {
        let mut state = self.lock();
        let id = state.next_id();
        state.groups.push((id, name.to_string(), sequence_number));
        id
    }

    pub fn add_job(&self, group_id: DbId, name: &str, sequence_number: i32) -> DbId {
        let mut state = self.lock();
        let id = state.next_id();
        state.jobs.push((id, group_id, name.to_string(), sequence_number));
        id
    }

    pub fn add_instruction(
        &self,
        job_id: DbId,
        sequence_number: i32,
        text: &str,
        kind: InstructionKind,
    ) -> DbId {
        let mut state = self.lock();
        let id = state.next_id();
        state.instructions.push(InstructionRow {
            id,
            job_id,
            sequence_number,
            text: text.to_string(),
            kind,
            enabled: true,
        });
        id
    }

    pub fn disable(&self, instruction_id: DbId) {
        let mut state = self.lock();
        if let Some(row) = state.instructions.iter_mut().find(|r| r.id == instruction_id) {
            row.enabled = false;
        }
    }

    pub fn set_variable(&self, tenant: &str, name: &str, value: &str) {
        self.lock()
            .variables
            .insert((tenant.to_string(), name.to_string()), value.to_string());
    }

    /// `(sequence_number, text)` of a job's instructions, by sequence.
    pub fn instructions(&self, job_id: DbId) -> Vec<(i32, String)> {
        let state = self.lock();
        let mut rows: Vec<_> = state
            .instructions
            .iter()
            .filter(|r| r.job_id == job_id)
            .map(|r| (r.sequence_number, r.text.clone()))
            .collect();
        rows.sort();
        rows
    }

    pub fn job_sequence(&self, job_id: DbId) -> Option<i32> {
        self.lock()
            .jobs
            .iter()
            .find(|(id, ..)| *id == job_id)
            .map(|(.., seq)| *seq)
    }

    pub fn job_count(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn group_count(&self) -> usize {
        self.lock().groups.len()
    }
}

impl MetadataStore for MemoryStore {
    async fn find_or_create_job_group(
        &self,
        name: &str,
        sequence_number: i32,
    ) -> Result<DbId, CoreError> {
        let mut state = self.lock();
        state.check(FailOn::FindOrCreate, "find_or_create_job_group")?;
        if let Some((id, ..)) = state.groups.iter().find(|(_, n, _)| n == name) {
            return Ok(*id);
        }
        let id = state.next_id();
        state.groups.push((id, name.to_string(), sequence_number));
        Ok(id)
    }

    async fn find_or_create_job(
        &self,
        group_id: DbId,
        name: &str,
        sequence_number: i32,
    ) -> Result<DbId, CoreError> {
        let mut state = self.lock();
        state.check(FailOn::FindOrCreate, "find_or_create_job")?;
        if let Some((id, ..)) = state
            .jobs
            .iter()
            .find(|(_, g, n, _)| *g == group_id && n == name)
        {
            return Ok(*id);
        }
        let id = state.next_id();
        state
            .jobs
            .push((id, group_id, name.to_string(), sequence_number));
        Ok(id)
    }

    async fn append_instructions(
        &self,
        job_id: DbId,
        instructions: &[NewInstruction],
    ) -> Result<AppendedInstructions, CoreError> {
        let mut state = self.lock();
        state.check(FailOn::Append, "append_instructions")?;
        if instructions.is_empty() {
            return Ok(AppendedInstructions::default());
        }
        let base = state
            .instructions
            .iter()
            .filter(|r| r.job_id == job_id)
            .map(|r| r.sequence_number)
            .max()
            .unwrap_or(0);
        for instruction in instructions {
            let id = state.next_id();
            state.instructions.push(InstructionRow {
                id,
                job_id,
                sequence_number: base + instruction.ordinal,
                text: instruction.text.clone(),
                kind: instruction.kind,
                enabled: instruction.enabled,
            });
        }
        Ok(AppendedInstructions {
            first_sequence: Some(base + 1),
            count: instructions.len() as u64,
        })
    }

    async fn delete_instructions(&self, job_id: DbId) -> Result<u64, CoreError> {
        let mut state = self.lock();
        if state.fail_on == Some(FailOn::Connection) {
            return Err(CoreError::Connection("catalog unreachable".into()));
        }
        let before = state.instructions.len();
        state.instructions.retain(|r| r.job_id != job_id);
        Ok((before - state.instructions.len()) as u64)
    }

    async fn list_tenant_variables(&self, tenant_name: &str) -> Result<TenantVariables, CoreError> {
        let state = self.lock();
        if state.fail_on == Some(FailOn::Connection) {
            return Err(CoreError::Connection("catalog unreachable".into()));
        }
        Ok(state
            .variables
            .iter()
            .filter(|((tenant, _), _)| tenant == tenant_name)
            .map(|((_, name), value)| (name.clone(), value.clone()))
            .collect())
    }

    async fn list_runnable_instructions(
        &self,
        group_name: &str,
        job_name: Option<&str>,
    ) -> Result<Vec<RunnableInstruction>, CoreError> {
        let state = self.lock();
        if state.fail_on == Some(FailOn::Connection) {
            return Err(CoreError::Connection("catalog unreachable".into()));
        }
        let mut rows = Vec::new();
        for row in state.instructions.iter().filter(|r| r.enabled) {
            let Some((_, group_id, job, job_seq)) =
                state.jobs.iter().find(|(id, ..)| *id == row.job_id)
            else {
                continue;
            };
            let Some((_, group, group_seq)) = state.groups.iter().find(|(id, ..)| id == group_id)
            else {
                continue;
            };
            if group != group_name || job_name.is_some_and(|j| j != job) {
                continue;
            }
            rows.push(RunnableInstruction {
                group_name: group.clone(),
                group_sequence: *group_seq,
                job_name: job.clone(),
                job_sequence: *job_seq,
                sequence_number: row.sequence_number,
                kind: row.kind,
                text: row.text.clone(),
            });
        }
        Ok(rows)
    }
}

/// How [`RecordingTarget`] reacts to a statement containing its marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Statement,
    SessionLost,
}

/// Target that records every statement and fails those containing a marker.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    executed: Mutex<Vec<String>>,
    fail_on: Option<(String, Failure)>,
}

impl RecordingTarget {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            executed: Mutex::default(),
            fail_on: Some((marker.to_string(), Failure::Statement)),
        }
    }

    /// Reports the session as lost when a statement contains `marker`.
    pub fn losing_session_on(marker: &str) -> Self {
        Self {
            executed: Mutex::default(),
            fail_on: Some((marker.to_string(), Failure::SessionLost)),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl TargetDatabase for RecordingTarget {
    async fn execute(&self, sql: &str) -> Result<(), ExecuteError> {
        self.executed.lock().unwrap().push(sql.to_string());
        match &self.fail_on {
            Some((marker, Failure::Statement)) if sql.contains(marker.as_str()) => Err(
                StatementError::new(Some("XX000".into()), "forced failure").into(),
            ),
            Some((marker, Failure::SessionLost)) if sql.contains(marker.as_str()) => Err(
                CoreError::Connection("server closed the connection unexpectedly".into()).into(),
            ),
            _ => Ok(()),
        }
    }
}
