// PostgreSQL backend: one long-lived `tokio_postgres::Client`.
//
// - config: connection setup and the background connection task
// - params: RowValues -> ToSql, coercing to the parameter types the server infers
// - query: row extraction into ResultSet
// - executor: the `Executor` implementation

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use executor::PostgresExecutor;
pub use params::Params;
pub use query::build_result_set_from_statement;
