//! SPA frontdoor binary.
//!
//! Startup order: load config (file, env, flags, then one validation pass)
//! → logging and metrics → build server → bind → serve until SIGINT/SIGTERM.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use spa_frontdoor::lifecycle::signals::shutdown_on_signal;
use spa_frontdoor::observability::{logging, metrics};
use spa_frontdoor::{load_config_with, HttpServer, Overrides, ProcessEnv, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "spa-frontdoor", version, about = "Serve a single-page app and proxy its API")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "FRONTDOOR_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding the build output (overrides STATIC_DIR)
    #[arg(long)]
    static_dir: Option<String>,

    /// Upstream base URL (overrides BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,

    /// Remove the matched prefix before forwarding, for every rule
    #[arg(long)]
    strip_prefix: Option<bool>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            static_dir: self.static_dir.clone(),
            backend_url: self.backend_url.clone(),
            strip_prefix: self.strip_prefix,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = load_config_with(cli.config.as_deref(), &ProcessEnv, &cli.overrides())?;

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "spa-frontdoor starting");
    tracing::info!(
        address = %config.listener.socket_address(),
        static_root = %config.static_files.root,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.socket_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move { shutdown_on_signal(&shutdown).await });

    server.run(listener, rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
