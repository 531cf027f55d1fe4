use tokio_postgres::{Client, NoTls};
use tracing::{error, info};

use crate::error::GatewayError;

/// Open the single session and drive its connection future on a background task.
///
/// The task logs and exits if the server drops the session; every later
/// statement then fails with a closed-connection error (there is no reconnect).
///
/// # Errors
/// Returns `GatewayError::ConnectionError` if the server cannot be reached or
/// rejects the credentials.
pub async fn open_client(conn_str: &str) -> Result<Client, GatewayError> {
    if conn_str.trim().is_empty() {
        return Err(GatewayError::ConfigError(
            "postgres connection string is required".to_string(),
        ));
    }

    let (client, connection) = tokio_postgres::connect(conn_str, NoTls)
        .await
        .map_err(|e| GatewayError::ConnectionError(format!("Failed to connect to Postgres: {e}")))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(error = %e, "postgres connection terminated");
        }
    });

    info!("postgres session established");
    Ok(client)
}
