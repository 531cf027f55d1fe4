use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use procedure_gateway::config::{Config, LogFormat, LoggingConfig, StartupBootstrap};
use procedure_gateway::executor::connect;
use procedure_gateway::gateway::Gateway;
use procedure_gateway::http;
use procedure_gateway::scripts::ScriptLoader;
use procedure_gateway::types::DatabaseType;
use procedure_gateway::GatewayError;

#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP gateway for stored procedures and projection queries")]
struct Args {
    /// TOML configuration file (default: gateway.toml, if present)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    host: Option<IpAddr>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long, value_enum)]
    backend: Option<DatabaseType>,
    /// PostgreSQL connection string or SQLite path
    #[arg(long)]
    database: Option<String>,
    #[arg(long)]
    scripts_dir: Option<PathBuf>,
    #[arg(long, value_enum)]
    startup_bootstrap: Option<StartupBootstrap>,
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(backend) = self.backend {
            config.database.backend = backend;
        }
        if let Some(url) = self.database {
            config.database.url = url;
        }
        if let Some(dir) = self.scripts_dir {
            config.scripts.dir = dir;
        }
        if let Some(startup) = self.startup_bootstrap {
            config.bootstrap.startup = startup;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let base = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = match logging.format {
        LogFormat::Json => Box::new(base.json().finish()),
        LogFormat::Compact => Box::new(base.compact().finish()),
    };
    let _ = tracing::subscriber::set_global_default(subscriber);
}

async fn run(config: Config) -> Result<(), GatewayError> {
    let executor = connect(config.database.connect_target()?).await?;
    info!(backend = ?config.database.backend, "database connection ready");

    let scripts = ScriptLoader::new(&config.scripts.dir);
    let gateway = Arc::new(Gateway::new(executor, scripts, config.scripts.files.clone()).await?);

    if let Some(action) = config.bootstrap.startup.action() {
        match gateway.bootstrap(action).await {
            Ok(outcome) => info!(%action, outcome, "startup bootstrap finished"),
            Err(e) => error!(%action, error = %e, "startup bootstrap failed; serving anyway"),
        }
    }

    http::serve(gateway, config.server.socket_addr())
        .await
        .map_err(|e| GatewayError::ConnectionError(format!("http server: {e}")))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);
    init_tracing(&config.logging);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "gateway stopped");
            ExitCode::FAILURE
        }
    }
}
