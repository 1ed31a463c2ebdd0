use std::path::{Path, PathBuf};
use std::time::Duration;

use accounts::{Accounts, AccountsConfig};
use anyhow::{Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use appointments::{Appointments, AppointmentsConfig};
use carekit::{DbModule, RestfulModule};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliOverrides};
use tokio_util::sync::CancellationToken;

mod db;
mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// CareFlow Server - clinic appointment booking API
#[derive(Parser)]
#[command(name = "careflow-server")]
#[command(about = "CareFlow Server - clinic appointment booking API")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

/// Typed module sections, parsed up front so bad config fails before startup.
struct ModuleConfigs {
    ingress: ApiIngressConfig,
    accounts: AccountsConfig,
    appointments: AppointmentsConfig,
}

impl ModuleConfigs {
    fn from_app(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            ingress: config.module_config("api_ingress")?,
            accounts: config.module_config("accounts")?,
            appointments: config.module_config("appointments")?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // home_dir comes back absolute and created
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(CliOverrides {
        port: cli.port,
        verbose: cli.verbose,
    });

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("CareFlow Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, cli.mock).await,
        Commands::Check => check_config(config, cli.mock),
    }
}

async fn run_server(config: AppConfig, mock: bool) -> Result<()> {
    let modules = ModuleConfigs::from_app(&config)?;
    let base_dir = PathBuf::from(&config.server.home_dir);

    let conn = db::connect(config.database.as_ref(), &base_dir, mock).await?;

    tracing::info!("Initializing modules...");
    let accounts = Accounts::new(conn.clone(), modules.accounts)?;
    let appointments = Appointments::new(
        conn.clone(),
        modules.appointments,
        accounts.client(),
        accounts.gate(),
    );

    let db_modules: [&dyn DbModule; 2] = [&accounts, &appointments];
    for module in db_modules {
        module
            .migrate(&conn)
            .await
            .with_context(|| format!("migrations failed for module '{}'", module.name()))?;
    }

    let mut ingress = ApiIngress::new(modules.ingress);
    if config.server.timeout_sec > 0 {
        ingress = ingress.with_request_timeout(Duration::from_secs(config.server.timeout_sec));
    }
    let rest_modules: [&dyn RestfulModule; 2] = [&accounts, &appointments];
    let router = ingress.build_router(&rest_modules)?;

    let cancel = CancellationToken::new();
    shutdown::cancel_on_signal(cancel.clone());

    let listener = api_ingress::bind(&config.server.bind_addr()).await?;
    api_ingress::serve(listener, router, cancel).await?;

    conn.close().await.context("failed to close database")?;
    tracing::info!("CareFlow Server stopped");
    Ok(())
}

fn check_config(config: AppConfig, mock: bool) -> Result<()> {
    tracing::info!("Checking configuration...");

    ModuleConfigs::from_app(&config)?;
    if !mock {
        if let Some(database) = &config.database {
            db::detect_from_dsn(&database.url)?;
        }
    }
    if config.server.host.trim().is_empty() {
        anyhow::bail!("invalid server address: server.host is empty");
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
