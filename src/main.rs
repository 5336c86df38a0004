//! FHIR forwarding relay.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                  FHIR RELAY                   │
//!     Client Request    │  ┌────────┐   ┌─────────────┐   ┌─────────┐  │
//!     ──────────────────┼─▶│  http  │──▶│ interceptor │──▶│ bypass? │  │
//!                       │  │ server │   │ middleware  │   └────┬────┘  │
//!                       │  └────────┘   └─────────────┘   yes  │  no   │
//!                       │       ┌─────────────────────────────┘   │    │
//!                       │       ▼                                 ▼    │
//!                       │  ┌─────────┐                  ┌────────────┐ │
//!                       │  │  local  │                  │  snapshot  │ │
//!                       │  │metadata │                  │  rewrite   │ │
//!                       │  └─────────┘                  │  client    │─┼──▶ Downstream
//!     Client Response   │                               │  relay     │◀┼─── API
//!     ◀─────────────────┼───────────────────────────────└────────────┘ │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use fhir_relay::config::{
    read_config, validate_config, ConfigError, ConfigOverrides, ConfigWatcher, ProxyConfig,
};
use fhir_relay::http::HttpServer;
use fhir_relay::lifecycle::{signals, Shutdown};
use fhir_relay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "fhir-relay")]
#[command(about = "Forwards FHIR requests to a downstream API", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Downstream base URL (overrides the config file).
    #[arg(long)]
    backend_url: Option<String>,

    /// Listen address (overrides the config file).
    #[arg(long)]
    bind: Option<String>,

    /// Reload forwarding settings when the config file changes.
    #[arg(long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        backend_url: cli.backend_url,
        bind_address: cli.bind,
    };
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };
    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability);
    tracing::info!("fhir-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend_url = %config.forwarding.backend_url,
        strip_prefix = %config.forwarding.strip_prefix,
        bypass_paths = ?config.forwarding.effective_bypass_paths(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation already checked the address.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let (config_updates, _watcher) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.forwarding.clone(), overrides);
            (updates, Some(watcher.run()?))
        }
        _ => (mpsc::unbounded_channel().1, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

