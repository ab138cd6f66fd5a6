//! load-distrix: an HTTP load balancer with retry and failover.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http::server ──▶ routing::orchestrator ──▶ http::forwarder ──▶ Backend
//!                                   │        ▲
//!                         next peer │        │ retry / fail over / reject
//!                                   ▼        │
//!                         load_balancer::pool + resilience::retries
//! ```

use std::path::PathBuf;
use clap::Parser;

use load_distrix::config::{load_config, BalancerConfig};
use load_distrix::lifecycle::{signals, startup};
use load_distrix::observability::logging;

#[derive(Parser)]
#[command(name = "load-distrix")]
#[command(about = "HTTP load balancer with retry and failover", long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML, or JSON by extension).
    #[arg(short, long, default_value = "LoadDistrix.toml")]
    config: PathBuf,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config: BalancerConfig = load_config(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        bind_address = %config.listener.bind_address,
        "load-distrix starting"
    );

    startup::run(config, signals::wait_for_shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
