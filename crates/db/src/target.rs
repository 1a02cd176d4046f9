//! [`TargetDatabase`] over a single PostgreSQL session.
//!
//! Instructions of one run share a session so that session state set up by
//! an earlier statement (`SET search_path`, named `dblink` connections,
//! temporary tables) is visible to later ones.

use sqlx::{Connection, PgConnection};
use sqlorch_core::catalog::{ExecuteError, StatementError, TargetDatabase};
use sqlorch_core::error::CoreError;
use tokio::sync::Mutex;

use crate::{is_connection_error, TargetConfig};

/// SQLSTATEs after which the server has closed the session: the whole
/// class 08 (connection exception) plus the 57P0x shutdown codes.
const SESSION_LOST_PREFIX: &str = "08";
const SESSION_LOST_CODES: [&str; 3] = ["57P01", "57P02", "57P03"];

pub struct PgTargetDatabase {
    conn: Mutex<PgConnection>,
}

impl PgTargetDatabase {
    /// Open the target session and verify it responds.
    pub async fn connect(config: &TargetConfig) -> Result<Self, CoreError> {
        let mut conn = PgConnection::connect(&config.database_url)
            .await
            .map_err(|e| CoreError::Connection(format!("target database: {e}")))?;
        conn.ping()
            .await
            .map_err(|e| CoreError::Connection(format!("target database: {e}")))?;
        tracing::info!("Target database connected");
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: PgConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Close the session cleanly.
    pub async fn close(self) -> Result<(), sqlx::Error> {
        self.conn.into_inner().close().await
    }
}

impl TargetDatabase for PgTargetDatabase {
    async fn execute(&self, sql: &str) -> Result<(), ExecuteError> {
        let mut conn = self.conn.lock().await;
        let mut tx = conn.begin().await.map_err(execute_error)?;

        match sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(sql)).await {
            Ok(_) => tx.commit().await.map_err(execute_error),
            Err(err) => {
                let failure = execute_error(err);
                match tx.rollback().await {
                    Ok(()) => Err(failure),
                    Err(rollback) if is_connection_error(&rollback) => {
                        Err(session_lost(&rollback))
                    }
                    Err(rollback) => {
                        tracing::warn!(
                            error = %rollback,
                            "Rollback after failed instruction failed"
                        );
                        Err(failure)
                    }
                }
            }
        }
    }
}

/// Split a sqlx failure into a recoverable statement error and a lost
/// session. The SQLSTATE is carried through when the server reported one.
fn execute_error(err: sqlx::Error) -> ExecuteError {
    if is_connection_error(&err) {
        return session_lost(&err);
    }
    match &err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|code| code.into_owned());
            if code.as_deref().is_some_and(is_session_lost_code) {
                return session_lost(&err);
            }
            StatementError::new(code, db_err.message()).into()
        }
        other => StatementError::new(None, other.to_string()).into(),
    }
}

fn session_lost(err: &sqlx::Error) -> ExecuteError {
    CoreError::Connection(format!("target database: {err}")).into()
}

fn is_session_lost_code(code: &str) -> bool {
    code.starts_with(SESSION_LOST_PREFIX) || SESSION_LOST_CODES.contains(&code)
}
