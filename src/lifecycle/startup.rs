//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the registry from validated configuration
//! - Start the metrics exporter and admin API when enabled
//! - Bind the balancing listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{self, AdminState};
use crate::config::BalancerConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{BackendRegistry, RegistryError};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Run the balancer until `signal` resolves, then drain and return.
pub async fn run<S>(config: BalancerConfig, signal: S) -> Result<(), StartupError>
where
    S: Future<Output = ()> + Send,
{
    let registry = Arc::new(BackendRegistry::new(&config.backends, config.balancing.policy)?);
    tracing::info!(
        backends = registry.len(),
        policy = ?config.balancing.policy,
        retry_limit = config.retries.retry_limit,
        attempt_limit = config.retries.attempt_limit,
        "Backend registry ready"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr);
    }

    let shutdown = Shutdown::new();
    let mut tasks = Vec::new();

    if config.admin.enabled {
        let listener = bind(&config.admin.bind_address).await?;
        let state = AdminState {
            registry: registry.clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        };
        tasks.push(tokio::spawn(admin::serve(listener, state, shutdown.subscribe())));
    }

    let listener = bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(&config, registry);
    tasks.push(tokio::spawn(server.run(listener, shutdown.subscribe())));

    signal.await;
    tracing::info!("Shutting down");
    shutdown.trigger();

    for task in tasks {
        match task.await {
            Ok(result) => result?,
            Err(e) => tracing::error!(error = %e, "Server task panicked"),
        }
    }
    Ok(())
}
