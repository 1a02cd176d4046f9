//! Sequential execution of a job group against a tenant's target database.

use std::time::Instant;

use chrono::Utc;

use crate::catalog::{ExecuteError, MetadataStore, RunnableInstruction, TargetDatabase};
use crate::error::CoreError;
use crate::instruction::InstructionKind;
use crate::report::{preview, InstructionOutcome, OutcomeStatus, RunReport, PREVIEW_CHARS};
use crate::variables::VariableExpander;

/// Runs the enabled instructions of a job group (or one of its jobs) one at
/// a time, in `(group, job, instruction)` sequence order.
///
/// A failing statement is rolled back by the target, recorded on its
/// outcome, and the run moves on. Catalog failures abort a run before any
/// statement executes; losing the target session aborts it at the
/// instruction where the session was lost.
pub struct JobExecutor<'a, S, T> {
    store: &'a S,
    target: &'a T,
    preview_chars: usize,
}

impl<'a, S: MetadataStore, T: TargetDatabase> JobExecutor<'a, S, T> {
    pub fn new(store: &'a S, target: &'a T) -> Self {
        Self {
            store,
            target,
            preview_chars: PREVIEW_CHARS,
        }
    }

    #[cfg(test)]
    fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    pub async fn run(
        &self,
        tenant_name: &str,
        group_name: &str,
        job_name: Option<&str>,
    ) -> Result<RunReport, CoreError> {
        self.run_with_observer(tenant_name, group_name, job_name, |_| {})
            .await
    }

    /// Like [`run`](Self::run), calling `observer` as each instruction
    /// finishes.
    pub async fn run_with_observer<F>(
        &self,
        tenant_name: &str,
        group_name: &str,
        job_name: Option<&str>,
        mut observer: F,
    ) -> Result<RunReport, CoreError>
    where
        F: FnMut(&InstructionOutcome),
    {
        let started_at = Utc::now();
        let clock = Instant::now();

        let variables = self.store.list_tenant_variables(tenant_name).await?;
        let mut instructions = self
            .store
            .list_runnable_instructions(group_name, job_name)
            .await?;
        instructions.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

        tracing::info!(
            tenant = tenant_name,
            job_group = group_name,
            job = job_name.unwrap_or("*"),
            instructions = instructions.len(),
            variables = variables.len(),
            "Starting run",
        );
        if instructions.is_empty() {
            tracing::warn!(
                job_group = group_name,
                job = job_name.unwrap_or("*"),
                "No runnable instructions found",
            );
        }

        let expander = VariableExpander::new(&variables);
        let mut outcomes = Vec::with_capacity(instructions.len());
        let (mut attempted, mut errors, mut skipped) = (0u64, 0u64, 0u64);

        for instruction in &instructions {
            let outcome = self.execute_one(&expander, instruction).await?;
            if outcome.was_attempted() {
                attempted += 1;
            } else {
                skipped += 1;
            }
            if outcome.is_error() {
                errors += 1;
            }
            observer(&outcome);
            outcomes.push(outcome);
        }

        let report = RunReport {
            tenant_name: tenant_name.to_string(),
            group_name: group_name.to_string(),
            job_name: job_name.map(str::to_string),
            started_at,
            finished_at: Utc::now(),
            instructions_run: attempted,
            errors,
            skipped,
            duration_ms: clock.elapsed().as_millis() as u64,
            outcomes,
        };

        tracing::info!(
            tenant = tenant_name,
            job_group = group_name,
            instructions_run = report.instructions_run,
            errors = report.errors,
            duration_ms = report.duration_ms,
            "Run finished",
        );

        Ok(report)
    }

    async fn execute_one(
        &self,
        expander: &VariableExpander,
        instruction: &RunnableInstruction,
    ) -> Result<InstructionOutcome, CoreError> {
        let text = expander.expand(&instruction.text);
        let started_at = Utc::now();
        let clock = Instant::now();

        let status = match instruction.kind {
            InstructionKind::Sql => match self.target.execute(&text).await {
                Ok(()) => OutcomeStatus::Succeeded,
                Err(ExecuteError::Fatal(err)) => {
                    tracing::warn!(
                        job_group = %instruction.group_name,
                        job = %instruction.job_name,
                        sequence = instruction.sequence_number,
                        error = %err,
                        "Target session lost, aborting run",
                    );
                    return Err(err);
                }
                Err(ExecuteError::Statement(error)) => {
                    tracing::warn!(
                        job_group = %instruction.group_name,
                        job = %instruction.job_name,
                        sequence = instruction.sequence_number,
                        code = error.code.as_deref().unwrap_or("-"),
                        error = %error.message,
                        "Instruction failed, continuing",
                    );
                    OutcomeStatus::Failed { error }
                }
            },
            other => {
                tracing::warn!(
                    job_group = %instruction.group_name,
                    job = %instruction.job_name,
                    sequence = instruction.sequence_number,
                    kind = %other,
                    "Instruction kind has no runner, skipping",
                );
                OutcomeStatus::Skipped {
                    reason: format!("{other} instructions are not executed"),
                }
            }
        };

        let duration_ms = clock.elapsed().as_millis() as u64;
        tracing::debug!(
            job_group = %instruction.group_name,
            job = %instruction.job_name,
            sequence = instruction.sequence_number,
            duration_ms,
            "Instruction done",
        );

        Ok(InstructionOutcome {
            group_name: instruction.group_name.clone(),
            job_name: instruction.job_name.clone(),
            sequence_number: instruction.sequence_number,
            kind: instruction.kind,
            started_at,
            finished_at: Utc::now(),
            duration_ms,
            preview: preview(&text, self.preview_chars),
            status,
        })
    }
}
