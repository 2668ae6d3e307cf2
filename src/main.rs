//! Patent relay server.
//!
//! ```text
//!     Browser / iframe                 ┌──────────────────────────────────────────────┐
//!     ─────────────────────────────────┼─▶ http (router, CORS, request ID, timeout)   │
//!                                      │        │                     │               │
//!                                      │        ▼                     ▼               │
//!                                      │   relay (target → fetch →    convert (DOCX   │
//!                                      │   classify → rewrite)        → HTML)         │
//!                                      │        │                                     │
//!                                      │        ▼                                     │
//!                                      │   patents (detect → extract → render)        │
//!                                      └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use patent_relay::config::{load_config, load_from_env, RelayConfig};
use patent_relay::lifecycle::{signals, Shutdown};
use patent_relay::net::tls::load_tls_config;
use patent_relay::observability::{logging, metrics};
use patent_relay::HttpServer;

#[derive(Parser)]
#[command(name = "patent-relay")]
#[command(about = "Fetch-and-rewrite relay for embedding patent pages", long_about = None)]
struct Args {
    /// TOML config file (falls back to $RELAY_CONFIG, then built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config_path = args
        .config
        .or_else(|| std::env::var_os("RELAY_CONFIG").map(PathBuf::from));
    let mut config: RelayConfig = match &config_path {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_tracing(config.observability.log_format);

    tracing::info!("patent-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_file = ?config_path,
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        allowed_origins = ?config.cors.allowed_origins,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_secs = config.upstream.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();
    tokio::spawn(signals::trigger_on_signal(shutdown.clone()));

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    match tls {
        Some(tls) => {
            let rustls = load_tls_config(&tls).await?;
            let addr: SocketAddr = bind_address.parse()?;
            server.run_tls(addr, rustls, shutdown.subscribe()).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
