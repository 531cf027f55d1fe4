//! Database gateway for a generated-forms CRUD client.
//!
//! Bootstraps the schema from SQL scripts, answers projection queries over an
//! allowlisted catalog, invokes stored procedures with positionally bound
//! arguments, and reports every failure as one JSON error envelope.

pub mod catalog;
pub mod config;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod http;
pub mod prelude;
pub mod procedures;
pub mod results;
pub mod scripts;
pub mod translation;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::GatewayError;
pub use executor::{connect, ConnectTarget, Executor};
pub use gateway::{BootstrapAction, Gateway, ProjectionQuery, ScriptSet};
pub use results::{CustomDbRow, ResultSet};
pub use types::{DatabaseType, RowValues};
