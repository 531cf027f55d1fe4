use async_trait::async_trait;
use tokio_postgres::Client;
use tracing::debug;

use super::config::open_client;
use super::params::Params as PgParams;
use super::query::build_result_set_from_statement;
use crate::error::GatewayError;
use crate::executor::Executor;
use crate::results::ResultSet;
use crate::translation::{PlaceholderStyle, translate_placeholders};
use crate::types::{DatabaseType, RowValues};

/// `Executor` over a single PostgreSQL session.
///
/// `tokio_postgres` pipelines requests on the one connection in submission
/// order, so concurrent callers are serialized by the session itself.
pub struct PostgresExecutor {
    client: Client,
}

impl PostgresExecutor {
    /// Connect and wrap the session.
    ///
    /// # Errors
    /// Returns `GatewayError::ConnectionError` if the server is unreachable.
    pub async fn connect(conn_str: &str) -> Result<Self, GatewayError> {
        Ok(Self {
            client: open_client(conn_str).await?,
        })
    }

    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Executor for PostgresExecutor {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    /// Uses the simple-query protocol, which accepts several statements at once.
    async fn execute_batch(&self, sql: &str) -> Result<(), GatewayError> {
        debug!(bytes = sql.len(), "postgres batch");
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    async fn execute(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, GatewayError> {
        let sql = translate_placeholders(sql, PlaceholderStyle::Postgres);
        debug!(sql = %sql, params = params.len(), "postgres statement");

        let stmt = self.client.prepare(&sql).await?;
        let converted = PgParams::convert(params);
        let rows = self.client.query(&stmt, converted.as_refs()).await?;
        build_result_set_from_statement(&stmt, &rows)
    }
}
