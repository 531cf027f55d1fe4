// SQLite backend: one embedded connection driven from `spawn_blocking`.
//
// - config: opening the connection and the blocking bridge
// - params: RowValues -> rusqlite values
// - query: row extraction into ResultSet
// - executor: the `Executor` implementation

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use executor::SqliteExecutor;
pub use params::Params;
pub use query::build_result_set;
