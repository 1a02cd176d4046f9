use crate::types::DbId;

/// Errors that abort an ingestion or a run.
///
/// Per-statement failures during a run are not represented here; they are
/// recorded on the instruction outcome as a [`StatementError`](crate::catalog::StatementError).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The catalog or target store could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A catalog read failed (as opposed to returning zero rows).
    #[error("Catalog lookup failed during {operation}: {message}")]
    Lookup {
        operation: &'static str,
        message: String,
    },

    /// A catalog write failed.
    #[error("Catalog write failed during {operation}: {message}")]
    Persistence {
        operation: &'static str,
        message: String,
    },

    /// REPLACE removed the existing instructions but inserting the new set failed.
    ///
    /// The job is left with no instructions from either set until the
    /// ingestion is repeated.
    #[error("REPLACE for job {job_id} deleted {deleted} instruction(s) but the insert failed: {source}")]
    PartialReplace {
        job_id: DbId,
        deleted: u64,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    /// Whether this error means the store itself was unreachable.
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::PartialReplace { source, .. } => source.is_connection(),
            _ => false,
        }
    }
}
