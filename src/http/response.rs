//! Mapping routing outcomes to client responses.
//!
//! # Design Decisions
//! - Every rejection looks the same to the client: one fixed 503
//! - Upstream responses pass through untouched, 5xx included
//! - A passed deadline is a 504; retries and failovers are never visible

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crate::routing::RouteOutcome;

pub const SERVICE_UNAVAILABLE_BODY: &str = "Service not available";

pub fn service_unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, SERVICE_UNAVAILABLE_BODY).into_response()
}

pub fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, "Request body could not be read").into_response()
}

pub fn payload_too_large() -> Response {
    (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
}

impl IntoResponse for RouteOutcome {
    fn into_response(self) -> Response {
        match self {
            RouteOutcome::Succeeded(response) => response,
            RouteOutcome::Rejected(_) => service_unavailable(),
            RouteOutcome::DeadlineExceeded => {
                (StatusCode::GATEWAY_TIMEOUT, "Upstream deadline exceeded").into_response()
            }
            // Nobody is left to read this.
            RouteOutcome::Cancelled => service_unavailable(),
        }
    }
}
