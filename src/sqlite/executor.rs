use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::config::{SharedSqliteConnection, open_connection, run_blocking};
use super::params::Params;
use super::query::build_result_set;
use crate::error::GatewayError;
use crate::executor::Executor;
use crate::results::ResultSet;
use crate::types::{DatabaseType, RowValues};

/// `Executor` over one embedded `SQLite` connection.
///
/// `SQLite` has no stored procedures, so `call ...` statements come back as
/// syntax errors from the engine, reported like any other database error.
#[derive(Clone)]
pub struct SqliteExecutor {
    conn: SharedSqliteConnection,
}

impl SqliteExecutor {
    /// Open the connection at `path` (or `:memory:`).
    ///
    /// # Errors
    /// Returns `GatewayError::ConnectionError` if the database cannot be opened.
    pub async fn open(path: &str) -> Result<Self, GatewayError> {
        Ok(Self {
            conn: open_connection(path).await?,
        })
    }

    /// Wrap an already opened connection.
    #[must_use]
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Arc::new(tokio::sync::Mutex::new(conn)),
        }
    }
}

#[async_trait]
impl Executor for SqliteExecutor {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    async fn execute_batch(&self, sql: &str) -> Result<(), GatewayError> {
        debug!(bytes = sql.len(), "sqlite batch");
        let sql = sql.to_string();
        run_blocking(Arc::clone(&self.conn), move |conn| {
            conn.execute_batch(&sql).map_err(GatewayError::SqliteError)
        })
        .await
    }

    async fn execute(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, GatewayError> {
        debug!(sql, params = params.len(), "sqlite statement");
        let sql = sql.to_string();
        let values = Params::convert(params).0;
        run_blocking(Arc::clone(&self.conn), move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            build_result_set(&mut stmt, &values)
        })
        .await
    }
}
