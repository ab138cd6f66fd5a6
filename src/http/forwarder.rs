//! Upstream forwarding over hyper.
//!
//! # Responsibilities
//! - Send one attempt of a replayable request to one backend
//! - Apply configured request headers
//! - Bound each exchange with the upstream timeout
//! - Classify failures (transport, timeout, cancellation)
//!
//! # Design Decisions
//! - Any upstream response, 5xx included, is a success; only a missing
//!   response counts as a forwarding failure
//! - The response body is streamed back untouched

use std::time::Duration;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Response};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::{ForwardingConfig, TimeoutConfig};
use crate::routing::{ForwardError, Forwarder, ReplayableRequest};

/// Forwarder backed by a pooled hyper client.
#[derive(Debug, Clone)]
pub struct HyperForwarder {
    client: Client<HttpConnector, Body>,
    set_headers: HeaderMap,
    upstream_timeout: Duration,
}

impl HyperForwarder {
    pub fn new(forwarding: &ForwardingConfig, timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.upstream_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        // Validation rejects bad headers; anything left here is skipped.
        let mut set_headers = HeaderMap::new();
        for header in &forwarding.set_headers {
            match (
                HeaderName::try_from(header.name.as_str()),
                HeaderValue::try_from(header.value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    set_headers.insert(name, value);
                }
                _ => tracing::warn!(header = %header.name, "Skipping invalid forwarding header"),
            }
        }

        Self {
            client,
            set_headers,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        }
    }
}

impl Forwarder for HyperForwarder {
    async fn forward(
        &self,
        endpoint: &Url,
        request: ReplayableRequest,
        cancel: CancellationToken,
    ) -> Result<Response<Body>, ForwardError> {
        let mut req = request
            .to_request(endpoint)
            .map_err(|e| ForwardError::Transport(e.to_string()))?;
        for (name, value) in self.set_headers.iter() {
            req.headers_mut().insert(name.clone(), value.clone());
        }

        let exchange = tokio::time::timeout(self.upstream_timeout, self.client.request(req));
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ForwardError::Cancelled),
            result = exchange => match result {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => return Err(ForwardError::Transport(e.to_string())),
                Err(_) => return Err(ForwardError::Timeout(self.upstream_timeout)),
            },
        };

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
