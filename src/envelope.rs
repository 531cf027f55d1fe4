use serde::Serialize;

use crate::error::GatewayError;

/// The single JSON shape every failure is reported in: `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    /// Category, e.g. `database_error` or `malformed_request`.
    pub kind: String,
    /// Driver error code (SQLSTATE or SQLite result code), when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    /// The database's own message; the form layer shows this one first.
    #[serde(rename = "sqlMessage", skip_serializing_if = "Option::is_none")]
    pub sql_message: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorPayload {
                kind: kind.into(),
                code: None,
                message: message.into(),
                sql_message: None,
            },
        }
    }
}

impl From<&GatewayError> for ErrorEnvelope {
    fn from(err: &GatewayError) -> Self {
        Self {
            error: ErrorPayload {
                kind: err.kind().to_string(),
                code: err.driver_code(),
                message: err.to_string(),
                sql_message: err.driver_message(),
            },
        }
    }
}
