//! Instruction kinds and ingestion lifecycle operations.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;

/// What an instruction's text is and how the executor treats it.
///
/// Only [`InstructionKind::Sql`] is produced by ingestion and executed by
/// the runner. The other kinds are reserved in the catalog so that script
/// invocations and nested jobs can be added without a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionKind {
    Sql,
    Script,
    Job,
    JobGroup,
}

impl InstructionKind {
    /// The value stored in `instructions.instruction_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Script => "script",
            Self::Job => "job",
            Self::JobGroup => "job_group",
        }
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstructionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sql" => Ok(Self::Sql),
            "script" => Ok(Self::Script),
            "job" => Ok(Self::Job),
            "job_group" => Ok(Self::JobGroup),
            other => Err(CoreError::Validation(format!(
                "unknown instruction type '{other}'"
            ))),
        }
    }
}

/// How an ingestion treats a job's existing instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IngestOperation {
    /// Keep existing instructions and number the new block after them.
    Append,
    /// Remove every existing instruction, then insert the new set from 1.
    Replace,
    /// Remove every existing instruction and insert nothing.
    Delete,
}

impl IngestOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Append => "APPEND",
            Self::Replace => "REPLACE",
            Self::Delete => "DELETE",
        }
    }

    /// Whether this operation consumes source text at all.
    pub fn reads_source(self) -> bool {
        !matches!(self, Self::Delete)
    }
}

impl fmt::Display for IngestOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngestOperation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "APPEND" => Ok(Self::Append),
            "REPLACE" => Ok(Self::Replace),
            "DELETE" => Ok(Self::Delete),
            _ => Err(CoreError::Validation(format!(
                "unknown operation '{s}', expected APPEND, REPLACE or DELETE"
            ))),
        }
    }
}
