//! Vex service binary.
//!
//! Loads configuration, installs logging, starts the service with its
//! default endpoints and stops it gracefully on SIGINT/SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use vex::config::{load_config, validate_config, ConfigError, ServiceConfig};
use vex::lifecycle::shutdown_signal;
use vex::observability::logging;
use vex::{Service, ServiceMux};

#[derive(Parser)]
#[command(name = "vex")]
#[command(about = "Vex service", long_about = None, version)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init(&config.logging)?;

    tracing::info!(
        version = %vex::version(),
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        read_header_timeout_secs = config.listener.read_header_timeout_secs,
        "vex starting"
    );

    let mux = ServiceMux::new();
    let service = Arc::new(Service::with_options(
        config.listener.bind_address.clone(),
        Some(mux.clone()),
        logging::service_span(&config.listener.bind_address),
        config.options(),
    ));
    service.register_default_handlers(&mux)?;

    let mut server = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.start().await })
    };

    tokio::select! {
        res = &mut server => res??,
        _ = shutdown_signal() => {
            service.stop(config.shutdown_timeout()).await?;
            (&mut server).await??;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
