use crate::config::AppConfig;
use crate::openapi::build_openapi;
use crate::otel;
use crate::registry::build_service;
use crate::router::Router;
use crate::routes::route_table;
use crate::runtime_config::RuntimeConfig;
use crate::server::{HttpServer, ServerHandle};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

/// Command-line interface for the person API
#[derive(Parser)]
#[command(name = "person-api", version)]
#[command(about = "Person API: validated person, form and upload endpoints", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// YAML configuration file
        #[arg(short, long, env = "PERSON_API_CONFIG")]
        config: Option<PathBuf>,

        /// Address to bind, overriding the configuration file
        #[arg(long, env = "PERSON_API_ADDR")]
        addr: Option<String>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(long, env = "PERSON_API_LOG_LEVEL", default_value = "info")]
        log_level: String,
    },
    /// Print the route table
    Routes,
    /// Print the generated OpenAPI document
    Openapi {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

/// Serialization used by `openapi`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Parse the process arguments and run the selected command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, logging cannot be
/// initialized, or the server fails to start.
pub fn run_cli() -> Result<()> {
    run_command(Cli::parse().command)
}

/// Run one already-parsed command.
pub fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Serve {
            config,
            addr,
            log_level,
        } => serve(config, addr, &log_level),
        Commands::Routes => {
            print!("{}", Router::new(route_table()).dump_routes());
            Ok(())
        }
        Commands::Openapi { format } => {
            let document = build_openapi(&route_table());
            let text = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&document)?,
                OutputFormat::Yaml => serde_yaml::to_string(&document)?,
            };
            println!("{text}");
            Ok(())
        }
    }
}

fn serve(config_path: Option<PathBuf>, addr: Option<String>, log_level: &str) -> Result<()> {
    let _log_guard = otel::init_logging(log_level)?;

    let mut config = AppConfig::load_or_default(config_path.as_deref())?;
    if let Some(addr) = addr {
        config.bind_addr = addr;
    }
    RuntimeConfig::from_env().apply();

    let bind_addr = config.bind_addr.clone();
    // SAFETY: the may runtime is configured above; handlers are Send + 'static.
    let service = unsafe { build_service(config) };
    let handle = HttpServer(service)
        .start(bind_addr.as_str())
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %handle.addr(), "Person API ready");

    wait_for_shutdown(handle)
}

#[cfg(unix)]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    handle.stop();
    info!("Server stopped");
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server thread panicked: {e:?}"))
}
