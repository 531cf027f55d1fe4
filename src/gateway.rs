use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::catalog::SchemaCatalog;
use crate::error::GatewayError;
use crate::executor::Executor;
use crate::procedures::ProcedureCall;
use crate::results::ResultSet;
use crate::scripts::ScriptLoader;

/// Which reset a bootstrap performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootstrapAction {
    /// Recreate the schema with seed data.
    Init,
    /// Recreate the schema with empty tables.
    Clear,
}

impl BootstrapAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BootstrapAction::Init => "init",
            BootstrapAction::Clear => "clear",
        }
    }

    #[must_use]
    pub fn success_message(self) -> &'static str {
        match self {
            BootstrapAction::Init => "Database reset to test values",
            BootstrapAction::Clear => "Database cleared",
        }
    }
}

impl fmt::Display for BootstrapAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BootstrapAction {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(BootstrapAction::Init),
            "clear" => Ok(BootstrapAction::Clear),
            other => Err(GatewayError::MalformedRequest(format!(
                "unknown bootstrap action: {other}"
            ))),
        }
    }
}

/// File names of the deployment scripts, relative to the scripts directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSet {
    /// Schema plus seed rows; run by `init`.
    pub seed_data: String,
    /// Schema with no rows; run by `clear`.
    pub empty_tables: String,
    /// Stored procedure definitions; run after either of the above.
    pub procedures: String,
}

impl Default for ScriptSet {
    fn default() -> Self {
        Self {
            seed_data: "tables_data.sql".to_string(),
            empty_tables: "empty_tables_data.sql".to_string(),
            procedures: "stored_procedures.sql".to_string(),
        }
    }
}

impl ScriptSet {
    #[must_use]
    pub fn target(&self, action: BootstrapAction) -> &str {
        match action {
            BootstrapAction::Init => &self.seed_data,
            BootstrapAction::Clear => &self.empty_tables,
        }
    }
}

/// `select * from t` or `select a from t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionQuery {
    pub table_or_view: String,
    pub attribute: Option<String>,
}

impl ProjectionQuery {
    pub fn new(table_or_view: impl Into<String>, attribute: Option<impl Into<String>>) -> Self {
        Self {
            table_or_view: table_or_view.into(),
            attribute: attribute.map(Into::into),
        }
    }

    /// SQL text; only call after the identifiers passed the catalog check.
    ///
    /// A mixed-case attribute is aliased to itself so the result key keeps the
    /// spelling of the request even where the server folds unquoted names.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self.attribute.as_deref() {
            Some(attr) if attr.bytes().any(|b| b.is_ascii_uppercase()) => {
                format!("select {attr} as \"{attr}\" from {}", self.table_or_view)
            }
            Some(attr) => format!("select {attr} from {}", self.table_or_view),
            None => format!("select * from {}", self.table_or_view),
        }
    }
}

/// `call name(?,?,...)` with one placeholder per argument.
#[must_use]
pub fn call_statement(name: &str, arity: usize) -> String {
    format!("call {name}({})", vec!["?"; arity].join(","))
}

/// Request-facing side of the database: bootstrap, projections, procedure calls.
///
/// The schema catalog sits behind a read/write lock that doubles as the
/// bootstrap barrier: ordinary requests hold the read side while their
/// statement runs, a bootstrap holds the write side across both of its scripts
/// and the catalog reload.
pub struct Gateway {
    executor: Arc<dyn Executor>,
    scripts: ScriptLoader,
    script_set: ScriptSet,
    catalog: RwLock<SchemaCatalog>,
}

impl Gateway {
    /// Build a gateway and load the schema catalog through `executor`.
    ///
    /// # Errors
    /// Returns the driver error if catalog introspection fails.
    pub async fn new(
        executor: Arc<dyn Executor>,
        scripts: ScriptLoader,
        script_set: ScriptSet,
    ) -> Result<Self, GatewayError> {
        let catalog = SchemaCatalog::load(executor.as_ref()).await?;
        report_missing_procedures(&catalog);
        Ok(Self::with_catalog(executor, scripts, script_set, catalog))
    }

    /// Build a gateway around an already known catalog.
    #[must_use]
    pub fn with_catalog(
        executor: Arc<dyn Executor>,
        scripts: ScriptLoader,
        script_set: ScriptSet,
        catalog: SchemaCatalog,
    ) -> Self {
        Self {
            executor,
            scripts,
            script_set,
            catalog: RwLock::new(catalog),
        }
    }

    /// Copy of the current catalog.
    pub async fn catalog(&self) -> SchemaCatalog {
        self.catalog.read().await.clone()
    }

    /// Run the target script for `action`, then the procedure script.
    ///
    /// Stops at the first failure; steps already applied stay applied. The
    /// schema catalog is reloaded whenever any SQL reached the database, so a
    /// partial reset is reflected in later projection checks.
    ///
    /// # Errors
    /// `ScriptNotFound`/`ScriptIo` for unreadable scripts, or the driver error of
    /// the failing batch.
    pub async fn bootstrap(&self, action: BootstrapAction) -> Result<&'static str, GatewayError> {
        let mut catalog = self.catalog.write().await;
        info!(%action, "bootstrap started");

        let mut sent_sql = false;
        let outcome = self.run_scripts(action, &mut sent_sql).await;
        match outcome {
            Ok(()) => {
                *catalog = SchemaCatalog::load(self.executor.as_ref()).await?;
                report_missing_procedures(&catalog);
                Ok(action.success_message())
            }
            Err(e) => {
                if sent_sql {
                    match SchemaCatalog::load(self.executor.as_ref()).await {
                        Ok(reloaded) => *catalog = reloaded,
                        Err(reload) => {
                            warn!(%action, error = %reload, "catalog reload after failed bootstrap failed");
                        }
                    }
                }
                Err(e)
            }
        }
    }

    async fn run_scripts(
        &self,
        action: BootstrapAction,
        sent_sql: &mut bool,
    ) -> Result<(), GatewayError> {
        let steps = [self.script_set.target(action), self.script_set.procedures.as_str()];
        for script in steps {
            let sql = self.scripts.load(script).await?;
            *sent_sql = true;
            if let Err(e) = self.executor.execute_batch(&sql).await {
                warn!(%action, script, error = %e, "bootstrap step failed");
                return Err(e);
            }
            info!(%action, script, "bootstrap step applied");
        }
        Ok(())
    }

    /// Select every row of a table/view, or one column of it.
    ///
    /// # Errors
    /// `MalformedRequest` if a name fails the catalog check, otherwise the
    /// driver error.
    pub async fn projection_query(&self, query: &ProjectionQuery) -> Result<ResultSet, GatewayError> {
        let catalog = self.catalog.read().await;
        catalog.check_projection(&query.table_or_view, query.attribute.as_deref())?;
        self.executor.execute(&query.to_sql(), &[]).await
    }

    /// Parse a request body for procedure `name` and call it.
    ///
    /// # Errors
    /// `MalformedRequest` for unknown names or ill-typed arguments, otherwise the
    /// driver error.
    pub async fn invoke_procedure(&self, name: &str, body: &Value) -> Result<ResultSet, GatewayError> {
        let call = ProcedureCall::parse(name, body)?;
        self.call(call).await
    }

    /// Issue `call <name>(?,...)` with the arguments bound in declared order.
    ///
    /// # Errors
    /// Returns the driver error unchanged.
    pub async fn call(&self, call: ProcedureCall) -> Result<ResultSet, GatewayError> {
        let _barrier = self.catalog.read().await;
        let name = call.name();
        let args = call.into_args();
        let sql = call_statement(name, args.len());
        self.executor.execute(&sql, &args).await
    }
}

fn report_missing_procedures(catalog: &SchemaCatalog) {
    if !catalog.knows_procedures() {
        return;
    }
    for name in ProcedureCall::NAMES {
        if !catalog.has_procedure(name) {
            warn!(procedure = name, "procedure is not defined in the database");
        }
    }
}
