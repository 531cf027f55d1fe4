//! Rendering of failures as HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::envelope::ErrorEnvelope;
use crate::error::GatewayError;

/// Error returned from handlers; always rendered as an [`ErrorEnvelope`].
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub envelope: ErrorEnvelope,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            envelope: ErrorEnvelope::new("not_found", message),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        warn!(kind = err.kind(), error = %err, "request failed");
        Self {
            status: StatusCode::BAD_REQUEST,
            envelope: ErrorEnvelope::from(&err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}
