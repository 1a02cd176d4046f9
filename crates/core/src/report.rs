//! Per-instruction outcomes and the run summary.

use serde::Serialize;

use crate::catalog::StatementError;
use crate::instruction::InstructionKind;
use crate::types::Timestamp;

/// Number of characters of expanded statement text shown in a trace line.
pub const PREVIEW_CHARS: usize = 80;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Failed { error: StatementError },
    /// Not executed: the instruction kind has no runner yet.
    Skipped { reason: String },
}

/// What happened to one instruction during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionOutcome {
    pub group_name: String,
    pub job_name: String,
    pub sequence_number: i32,
    pub kind: InstructionKind,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub duration_ms: u64,
    /// Leading part of the expanded text, newlines flattened.
    pub preview: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl InstructionOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }

    pub fn was_attempted(&self) -> bool {
        !matches!(self.status, OutcomeStatus::Skipped { .. })
    }

    /// Single console line describing this outcome.
    pub fn trace_line(&self) -> String {
        let mut line = format!(
            "{} | {} | {:>4} | {} | {} | {:>7} ms | {}",
            self.group_name,
            self.job_name,
            self.sequence_number,
            self.started_at.format(TIMESTAMP_FORMAT),
            self.finished_at.format(TIMESTAMP_FORMAT),
            self.duration_ms,
            self.preview,
        );
        match &self.status {
            OutcomeStatus::Succeeded => {}
            OutcomeStatus::Failed { error } => {
                line.push_str(" | ERROR ");
                line.push_str(&error.to_string());
            }
            OutcomeStatus::Skipped { reason } => {
                line.push_str(" | SKIPPED ");
                line.push_str(reason);
            }
        }
        line
    }
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub tenant_name: String,
    pub group_name: String,
    pub job_name: Option<String>,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    /// Instructions sent to the target, failed ones included.
    pub instructions_run: u64,
    pub errors: u64,
    pub skipped: u64,
    pub duration_ms: u64,
    pub outcomes: Vec<InstructionOutcome>,
}

impl RunReport {
    /// True when the group/job resolved to no runnable instructions.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "Instructions executed: {}, errors: {}, total duration: {} ms",
            self.instructions_run, self.errors, self.duration_ms
        );
        if self.skipped > 0 {
            line.push_str(&format!(", skipped: {}", self.skipped));
        }
        line
    }
}

/// First `max_chars` characters of `text` with line breaks and tabs turned
/// into spaces.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars()
        .filter(|c| *c != '\r')
        .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
        .take(max_chars)
        .collect()
}
