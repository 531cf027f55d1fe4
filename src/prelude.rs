//! Convenient imports for common functionality.

pub use crate::catalog::{Relation, RelationKind, SchemaCatalog};
pub use crate::envelope::ErrorEnvelope;
pub use crate::error::GatewayError;
pub use crate::executor::{ConnectTarget, Executor, connect};
pub use crate::gateway::{BootstrapAction, Gateway, ProjectionQuery, ScriptSet};
pub use crate::procedures::ProcedureCall;
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::scripts::ScriptLoader;
pub use crate::translation::{PlaceholderStyle, translate_placeholders};
pub use crate::types::{DatabaseType, RowValues};

#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresExecutor;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteExecutor;
