use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    #[error("Script read error ({name}): {source}")]
    ScriptIo {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

impl GatewayError {
    /// Stable snake_case label used as the `kind` of an error envelope.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "postgres")]
            GatewayError::PostgresError(_) => "database_error",
            #[cfg(feature = "sqlite")]
            GatewayError::SqliteError(_) => "database_error",
            GatewayError::ExecutionError(_) | GatewayError::ConnectionError(_) => "database_error",
            GatewayError::ScriptNotFound(_) => "script_not_found",
            GatewayError::ScriptIo { .. } => "script_io_error",
            GatewayError::MalformedRequest(_) => "malformed_request",
            GatewayError::ConfigError(_) => "config_error",
            GatewayError::ParameterError(_) => "parameter_error",
        }
    }

    /// Driver-reported error code, when the failure came from the database.
    ///
    /// PostgreSQL errors yield their SQLSTATE; SQLite errors yield the numeric
    /// extended result code (e.g. `1` for `SQLITE_ERROR`, `2067` for
    /// `SQLITE_CONSTRAINT_UNIQUE`).
    #[must_use]
    pub fn driver_code(&self) -> Option<String> {
        match self {
            #[cfg(feature = "postgres")]
            GatewayError::PostgresError(err) => err.code().map(|c| c.code().to_string()),
            #[cfg(feature = "sqlite")]
            GatewayError::SqliteError(err) => {
                sqlite_failure(err).map(|(code, _)| code.extended_code.to_string())
            }
            _ => None,
        }
    }

    /// The message the database itself produced, stripped of driver framing.
    #[must_use]
    pub fn driver_message(&self) -> Option<String> {
        match self {
            #[cfg(feature = "postgres")]
            GatewayError::PostgresError(err) => Some(
                err.as_db_error()
                    .map_or_else(|| err.to_string(), |db| db.message().to_string()),
            ),
            #[cfg(feature = "sqlite")]
            GatewayError::SqliteError(err) => Some(match sqlite_failure(err) {
                Some((_, Some(msg))) => msg.to_string(),
                _ => err.to_string(),
            }),
            GatewayError::ExecutionError(msg) | GatewayError::ConnectionError(msg) => {
                Some(msg.clone())
            }
            _ => None,
        }
    }
}

/// The engine error inside a rusqlite error, with the engine's own message.
///
/// Prepare failures arrive as `SqlInputError`, whose `Display` appends the
/// statement text and offset; only `msg` is the engine's wording.
#[cfg(feature = "sqlite")]
fn sqlite_failure(err: &rusqlite::Error) -> Option<(&rusqlite::ffi::Error, Option<&str>)> {
    match err {
        rusqlite::Error::SqliteFailure(code, msg) => Some((code, msg.as_deref())),
        rusqlite::Error::SqlInputError { error, msg, .. } => Some((error, Some(msg.as_str()))),
        _ => None,
    }
}
