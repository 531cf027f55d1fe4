use std::sync::Arc;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::results::ResultSet;
use crate::types::{DatabaseType, RowValues};

#[cfg(feature = "postgres")]
use crate::postgres;
#[cfg(feature = "sqlite")]
use crate::sqlite;

/// Runs SQL against the process-wide connection.
///
/// The gateway only talks to the database through this trait, so tests can
/// hand it a recording fake instead of a live session.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Backend behind this executor; decides placeholder style and catalog queries.
    fn database_type(&self) -> DatabaseType;

    /// Run a multi-statement batch with no parameters (bootstrap scripts).
    ///
    /// # Errors
    /// Returns the driver error of the first failing statement. Statements before
    /// it stay applied.
    async fn execute_batch(&self, sql: &str) -> Result<(), GatewayError>;

    /// Run one statement with `?` placeholders bound positionally to `params`.
    ///
    /// # Errors
    /// Returns the driver error when preparation, binding, or execution fails.
    async fn execute(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, GatewayError>;
}

/// Where the single connection of the process points.
#[derive(Debug, Clone)]
pub enum ConnectTarget {
    /// libpq-style connection string, e.g. `host=localhost user=root dbname=flight_management`.
    #[cfg(feature = "postgres")]
    Postgres(String),
    /// Filesystem path, or `:memory:`.
    #[cfg(feature = "sqlite")]
    Sqlite(String),
}

/// Open the process-wide connection.
///
/// # Errors
/// Returns `GatewayError::ConnectionError` when the database cannot be reached.
pub async fn connect(target: ConnectTarget) -> Result<Arc<dyn Executor>, GatewayError> {
    match target {
        #[cfg(feature = "postgres")]
        ConnectTarget::Postgres(conn_str) => {
            let executor = postgres::PostgresExecutor::connect(&conn_str).await?;
            Ok(Arc::new(executor))
        }
        #[cfg(feature = "sqlite")]
        ConnectTarget::Sqlite(path) => {
            let executor = sqlite::SqliteExecutor::open(&path).await?;
            Ok(Arc::new(executor))
        }
    }
}
