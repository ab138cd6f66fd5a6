//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all balancing handler
//! - Wire up middleware (tracing, request ID)
//! - Buffer request bodies so they can be replayed
//! - Hand each request to the routing orchestrator
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::config::BalancerConfig;
use crate::http::forwarder::HyperForwarder;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response;
use crate::load_balancer::BackendRegistry;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::routing::{BufferError, Orchestrator, ReplayableRequest};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator<HyperForwarder>>,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    registry: Arc<BackendRegistry>,
}

impl HttpServer {
    /// Create a new HTTP server routing over `registry`.
    pub fn new(config: &BalancerConfig, registry: Arc<BackendRegistry>) -> Self {
        let forwarder = HyperForwarder::new(&config.forwarding, &config.timeouts);
        let policy = RetryPolicy::from_config(&config.retries);
        let orchestrator = Arc::new(Orchestrator::new(registry.clone(), forwarder, policy));

        let state = AppState {
            orchestrator,
            max_body_bytes: config.forwarding.max_body_bytes,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        Self {
            router: Self::build_router(state),
            registry,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.registry.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main balancing handler.
/// Buffers the body, then lets the orchestrator pick, forward and retry.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let span = tracing::info_span!(
        "route",
        request_id = %request_id(&request),
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        let deadline = deadline_after(state.request_timeout);

        let replayable = match ReplayableRequest::buffer(request, state.max_body_bytes).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to buffer request body");
                metrics::record_request("body_rejected");
                return match e {
                    BufferError::TooLarge { .. } => response::payload_too_large(),
                    BufferError::Read(_) => response::bad_request(),
                };
            }
        };

        // Dropping the handler (client gone) cancels everything downstream.
        let cancel = CancellationToken::new();
        let guard = cancel.clone().drop_guard();
        let routed = state.orchestrator.route(replayable, &cancel, deadline).await;
        guard.disarm();

        tracing::debug!(
            outcome = routed.outcome.label(),
            retry = routed.state.retry_count,
            attempt = routed.state.attempt_count,
            "Request routed"
        );
        metrics::record_request(routed.outcome.label());
        routed.outcome.into_response()
    }
    .instrument(span)
    .await
}

/// `None` when the timeout is too far out to be represented.
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_after_overflow_is_none() {
        assert!(deadline_after(Duration::from_secs(u64::MAX)).is_none());
        assert!(deadline_after(Duration::from_secs(15)).is_some());
    }
}
