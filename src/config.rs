//! Server configuration.
//!
//! Layered with figment, later sources winning:
//! - built-in defaults
//! - a TOML file (`gateway.toml` unless another path is given)
//! - environment variables with the `GATEWAY_` prefix
//!
//! Command-line flags are applied on top by the binary.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3001
//!
//! [database]
//! backend = "postgres"
//! url = "host=localhost user=root dbname=flight_management"
//!
//! [scripts]
//! dir = "./sql"
//!
//! [bootstrap]
//! startup = "init"
//! ```
//!
//! Environment overrides use `__` between section and key:
//! ```bash
//! GATEWAY_DATABASE__BACKEND=sqlite
//! GATEWAY_DATABASE__URL=./flights.db
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::executor::ConnectTarget;
use crate::gateway::{BootstrapAction, ScriptSet};
use crate::types::DatabaseType;

pub const DEFAULT_CONFIG_FILE: &str = "gateway.toml";
pub const ENV_PREFIX: &str = "GATEWAY_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scripts: ScriptsConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseType,
    /// libpq connection string for PostgreSQL, file path (or `:memory:`) for SQLite.
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseType::Postgres,
            url: "host=localhost user=root dbname=flight_management".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// # Errors
    /// `GatewayError::ConfigError` if the backend was compiled out.
    pub fn connect_target(&self) -> Result<ConnectTarget, GatewayError> {
        match self.backend {
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => Ok(ConnectTarget::Postgres(self.url.clone())),
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => Ok(ConnectTarget::Sqlite(self.url.clone())),
            #[allow(unreachable_patterns)]
            other => Err(GatewayError::ConfigError(format!(
                "backend {other:?} is not enabled in this build"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptsConfig {
    pub dir: PathBuf,
    #[serde(flatten)]
    pub files: ScriptSet,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./sql"),
            files: ScriptSet::default(),
        }
    }
}

/// What to run before the listener starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupBootstrap {
    #[default]
    Init,
    Clear,
    None,
}

impl StartupBootstrap {
    #[must_use]
    pub fn action(self) -> Option<BootstrapAction> {
        match self {
            StartupBootstrap::Init => Some(BootstrapAction::Init),
            StartupBootstrap::Clear => Some(BootstrapAction::Clear),
            StartupBootstrap::None => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub startup: StartupBootstrap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl Config {
    /// Defaults, then `path` (or `gateway.toml` if present), then `GATEWAY_*` variables.
    ///
    /// # Errors
    /// `GatewayError::ConfigError` if a source cannot be parsed or a value has
    /// the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, GatewayError> {
        let file = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        Self::figment(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| GatewayError::ConfigError(e.to_string()))
    }

    /// Defaults and one TOML file, without the environment.
    ///
    /// # Errors
    /// `GatewayError::ConfigError` if the file cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, GatewayError> {
        Self::figment(path)
            .extract()
            .map_err(|e| GatewayError::ConfigError(e.to_string()))
    }

    fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(file))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_the_form_layer() {
        let config = Config::default();
        assert_eq!(config.server.socket_addr().to_string(), "127.0.0.1:3001");
        assert_eq!(config.database.backend, DatabaseType::Postgres);
        assert_eq!(config.scripts.files.seed_data, "tables_data.sql");
        assert_eq!(config.bootstrap.startup.action(), Some(BootstrapAction::Init));
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn toml_file_overrides_only_what_it_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
host = "0.0.0.0"
port = 8080

[database]
backend = "sqlite"
url = ":memory:"

[scripts]
dir = "/srv/sql"
procedures = "procs.sql"

[bootstrap]
startup = "none"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.backend, DatabaseType::Sqlite);
        assert_eq!(config.scripts.dir, PathBuf::from("/srv/sql"));
        assert_eq!(config.scripts.files.procedures, "procs.sql");
        assert_eq!(config.scripts.files.empty_tables, "empty_tables_data.sql");
        assert_eq!(config.bootstrap.startup.action(), None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::from_file(Path::new("/nonexistent/gateway.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn bad_values_are_config_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = \"not a port\"").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, GatewayError::ConfigError(_)));
    }
}
