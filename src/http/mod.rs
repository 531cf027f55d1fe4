//! HTTP surface: the routes the form layer calls.
//!
//! | Method | Path                      | Gateway operation      |
//! |--------|---------------------------|------------------------|
//! | GET    | `/init`, `/clear`         | bootstrap              |
//! | GET    | `/get/:table[/:attribute]`| projection query       |
//! | POST   | `/:procedure`             | procedure invocation   |
//! | GET    | `/health`                 | none (liveness probe)  |

pub mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Path,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::GatewayError;
use crate::gateway::{BootstrapAction, Gateway, ProjectionQuery};
use crate::results::ResultSet;

pub use self::error::ApiError;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build the router over a shared gateway.
pub fn create_router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/init", get(init))
        .route("/clear", get(clear))
        .route("/get/:table", get(select_all))
        .route("/get/:table/:attribute", get(select_attribute))
        .route("/:procedure", post(call_procedure))
        .fallback(not_found)
        .layer(Extension(gateway))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `addr` and serve until the process is stopped.
///
/// # Errors
/// Returns the I/O error if the listener cannot be bound or the server fails.
pub async fn serve(gateway: Arc<Gateway>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, create_router(gateway)).await
}

async fn health() -> Json<&'static str> {
    Json("ok")
}

async fn init(Extension(gateway): Extension<Arc<Gateway>>) -> ApiResult<&'static str> {
    Ok(Json(gateway.bootstrap(BootstrapAction::Init).await?))
}

async fn clear(Extension(gateway): Extension<Arc<Gateway>>) -> ApiResult<&'static str> {
    Ok(Json(gateway.bootstrap(BootstrapAction::Clear).await?))
}

async fn select_all(
    Extension(gateway): Extension<Arc<Gateway>>,
    Path(table): Path<String>,
) -> ApiResult<ResultSet> {
    let query = ProjectionQuery::new(table, None::<String>);
    Ok(Json(gateway.projection_query(&query).await?))
}

async fn select_attribute(
    Extension(gateway): Extension<Arc<Gateway>>,
    Path((table, attribute)): Path<(String, String)>,
) -> ApiResult<ResultSet> {
    let query = ProjectionQuery::new(table, Some(attribute));
    Ok(Json(gateway.projection_query(&query).await?))
}

async fn call_procedure(
    Extension(gateway): Extension<Arc<Gateway>>,
    Path(procedure): Path<String>,
    body: Bytes,
) -> ApiResult<ResultSet> {
    let args = parse_body(&body)?;
    Ok(Json(gateway.invoke_procedure(&procedure, &args).await?))
}

async fn not_found() -> ApiError {
    ApiError::not_found("no such route")
}

/// An empty body counts as no arguments.
fn parse_body(body: &[u8]) -> Result<Value, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::MalformedRequest(format!("request body is not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_bodies() {
        assert_eq!(parse_body(b"").unwrap(), Value::Null);
        assert_eq!(parse_body(b" \n").unwrap(), Value::Null);
        assert!(parse_body(br#"{"a": 1}"#).unwrap().is_object());
        assert!(matches!(
            parse_body(b"{not json").unwrap_err(),
            GatewayError::MalformedRequest(_)
        ));
    }
}
