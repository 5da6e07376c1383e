//! Startup orchestration.
//!
//! # Responsibilities
//! - Assemble configuration from file, environment and command line
//! - Initialize subsystems in dependency order
//! - Start background tasks (heartbeat, signal handling)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Store connection is established before the listener is bound
//! - Listener starts last (traffic only when ready)

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{check_config, load_config, ConfigError, RouterConfig, StoreConfig};
use crate::http::HttpServer;
use crate::lifecycle::heartbeat::Heartbeat;
use crate::lifecycle::signals::wait_for_signal;
use crate::lifecycle::Shutdown;
use crate::observability::{logging, metrics};
use crate::store::{MemoryStore, RedisStore, RuleStore, StoreError};

const MEMORY_STORE_URL: &str = "memory://";

#[derive(Parser, Debug, Default)]
#[command(name = "alice-router")]
#[command(about = "Routes HTTP requests to application backends", long_about = None)]
pub struct Args {
    /// Port to listen on (overrides ROUTER_PORT)
    pub port: Option<u16>,

    /// Port to listen on
    #[arg(long = "listen-port", env = "ROUTER_PORT")]
    pub listen_port: Option<u16>,

    /// Hostname this router announces
    #[arg(long, env = "ROUTER_HOST")]
    pub host: Option<String>,

    /// Interface to bind
    #[arg(long, env = "ROUTER_BIND")]
    pub bind: Option<String>,

    /// Control plane host
    #[arg(long, env = "ALICE_HOST")]
    pub alice_host: Option<String>,

    /// Control plane port
    #[arg(long, env = "ALICE_PORT")]
    pub alice_port: Option<u16>,

    /// Rule store URL
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "ALICE_ROUTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Do not register with the control plane
    #[arg(long)]
    pub no_heartbeat: bool,
}

impl Args {
    /// Overlay command-line and environment values on `config`.
    pub fn apply(&self, config: &mut RouterConfig) {
        if let Some(port) = self.port.or(self.listen_port) {
            config.listener.port = port;
        }
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(alice_host) = &self.alice_host {
            config.heartbeat.alice_host = alice_host.clone();
        }
        if let Some(alice_port) = self.alice_port {
            config.heartbeat.alice_port = alice_port;
        }
        if let Some(url) = &self.redis_url {
            config.store.url = url.clone();
        }
        if self.no_heartbeat {
            config.heartbeat.enabled = false;
        }
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("rule store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to bind listener: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to build heartbeat client: {0}")]
    Heartbeat(#[from] reqwest::Error),
}

/// Load the file named by `args` (if any), apply overrides and validate.
pub fn resolve_config(args: &Args) -> Result<RouterConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    args.apply(&mut config);
    check_config(&config)?;
    Ok(config)
}

/// Open the rule store named by `config.url`.
pub async fn connect_store(config: &StoreConfig) -> Result<Arc<dyn RuleStore>, StoreError> {
    if config.url.starts_with(MEMORY_STORE_URL) {
        tracing::warn!("Using in-memory rule store; rules are not shared with other routers");
        return Ok(Arc::new(MemoryStore::new()));
    }
    Ok(Arc::new(
        RedisStore::connect(&config.url, config.max_blocking_connections).await?,
    ))
}

/// Run the router until a shutdown signal arrives.
pub async fn run(args: Args) -> Result<(), StartupError> {
    let config = resolve_config(&args)?;
    logging::init_logging(&config.observability);

    tracing::info!("alice-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        router = %config.listener.identity(),
        store = %config.store.url,
        selection_timeout_secs = config.store.selection_timeout_secs,
        stats_enabled = config.stats.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Address validity is checked by validation.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr)?;
        }
    }

    let store = connect_store(&config.store).await?;

    let listener = TcpListener::bind(config.listener.socket_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());

    let heartbeat = Heartbeat::new(config.heartbeat.clone(), &config.listener)?;
    tokio::spawn(heartbeat.run(shutdown.subscribe()));

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { wait_for_signal(&shutdown).await });
    }

    let server = HttpServer::new(config, store);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
