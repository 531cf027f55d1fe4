use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::error::GatewayError;

pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// Open the process-wide `SQLite` connection.
///
/// `:memory:` yields a private in-memory database that lives as long as the
/// connection does.
///
/// # Errors
/// Returns `GatewayError::ConnectionError` if the file cannot be opened.
pub async fn open_connection(path: &str) -> Result<SharedSqliteConnection, GatewayError> {
    let owned = path.to_string();
    let conn = tokio::task::spawn_blocking(move || {
        if owned == ":memory:" {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&owned)
        }
    })
    .await
    .map_err(|e| GatewayError::ConnectionError(format!("sqlite open join error: {e}")))?
    .map_err(|e| GatewayError::ConnectionError(format!("Failed to open SQLite at {path}: {e}")))?;

    info!(path, "sqlite connection opened");
    Ok(Arc::new(Mutex::new(conn)))
}

/// Run `func` against the connection on the blocking pool.
///
/// The mutex admits one statement at a time, which is the serialization the
/// single shared connection implies.
pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, GatewayError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, GatewayError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| GatewayError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}
