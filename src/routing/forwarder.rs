//! The forwarding seam between routing decisions and the network.
//!
//! The orchestrator only knows this trait. It hands over an endpoint and a
//! request whose body can be replayed, and gets back either the upstream
//! response or a classified failure.

use std::error::Error as _;
use std::future::Future;
use std::time::Duration;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, Method, Request, Response, Uri, Version, header, request::Parts};
use bytes::Bytes;
use http_body_util::LengthLimitError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::{Position, Url};

/// Why a forwarding attempt produced no response.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The caller went away or its deadline passed. Never retried.
    #[error("forwarding cancelled")]
    Cancelled,
    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),
    #[error("upstream transport error: {0}")]
    Transport(String),
}

impl ForwardError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ForwardError::Cancelled)
    }
}

/// Why an inbound body could not be buffered.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },
    /// The client aborted or sent a malformed body.
    #[error("failed to read request body: {0}")]
    Read(axum::Error),
}

/// Performs one network exchange against one backend.
pub trait Forwarder: Send + Sync + 'static {
    fn forward(
        &self,
        endpoint: &Url,
        request: ReplayableRequest,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Response<Body>, ForwardError>> + Send;
}

/// Hop-by-hop headers that must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Extra hop-by-hop names the sender listed in `Connection`.
fn connection_listed(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect()
}

/// An inbound request with its body fully buffered, so it can be sent more
/// than once.
#[derive(Debug, Clone)]
pub struct ReplayableRequest {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ReplayableRequest {
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
        }
    }

    /// Read the whole body, failing once it grows past `limit` bytes.
    pub async fn buffer(request: Request<Body>, limit: usize) -> Result<Self, BufferError> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit).await.map_err(|e| {
            if e.source().is_some_and(|s| s.is::<LengthLimitError>()) {
                BufferError::TooLarge { limit }
            } else {
                BufferError::Read(e)
            }
        })?;
        Ok(Self::from_parts(parts, body))
    }

    /// Build the request for one attempt against `endpoint`.
    ///
    /// Scheme and authority come from the endpoint, the endpoint's path is
    /// used as a prefix, and `Host` is rewritten to the backend.
    pub fn to_request(&self, endpoint: &Url) -> Result<Request<Body>, axum::http::Error> {
        let authority = &endpoint[Position::BeforeHost..Position::AfterPort];
        let prefix = endpoint.path().trim_end_matches('/');
        let path_and_query = self
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let uri = format!("{}://{}{}{}", endpoint.scheme(), authority, prefix, path_and_query);

        let mut builder = Request::builder()
            .method(self.method.clone())
            .uri(uri);

        if let Some(headers) = builder.headers_mut() {
            let listed = connection_listed(&self.headers);
            for (name, value) in self.headers.iter() {
                if !HOP_BY_HOP.contains(name) && !listed.contains(name) {
                    headers.append(name.clone(), value.clone());
                }
            }
            headers.insert(header::HOST, header::HeaderValue::from_str(authority)?);
        }

        builder.body(Body::from(self.body.clone()))
    }
}
