use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use url::Url;
use crate::admin::AdminState;
use crate::load_balancer::BackendNode;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub backends: usize,
    pub alive: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendStatus {
    pub url: String,
    pub alive: bool,
    pub weight: u64,
}

impl From<&BackendNode> for BackendStatus {
    fn from(node: &BackendNode) -> Self {
        Self {
            url: node.endpoint().to_string(),
            alive: node.is_alive(),
            weight: node.weight(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkRequest {
    pub url: String,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let alive = state.registry.alive_count();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: if alive > 0 { "operational" } else { "unavailable" }.to_string(),
        backends: state.registry.len(),
        alive,
    })
}

pub async fn get_backends(State(state): State<AdminState>) -> Json<Vec<BackendStatus>> {
    Json(
        state
            .registry
            .nodes()
            .iter()
            .map(|n| BackendStatus::from(n.as_ref()))
            .collect(),
    )
}

pub async fn mark_up(
    State(state): State<AdminState>,
    Json(body): Json<MarkRequest>,
) -> Result<Json<BackendStatus>, (StatusCode, String)> {
    mark(&state, &body.url, true)
}

pub async fn mark_down(
    State(state): State<AdminState>,
    Json(body): Json<MarkRequest>,
) -> Result<Json<BackendStatus>, (StatusCode, String)> {
    mark(&state, &body.url, false)
}

fn mark(state: &AdminState, url: &str, alive: bool) -> Result<Json<BackendStatus>, (StatusCode, String)> {
    let endpoint = Url::parse(url).map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid url: {e}")))?;
    if !state.registry.mark(&endpoint, alive) {
        return Err((StatusCode::NOT_FOUND, format!("unknown backend {endpoint}")));
    }
    tracing::info!(backend = %endpoint, alive, "Backend health set via admin API");

    let node = state
        .registry
        .nodes()
        .iter()
        .find(|n| n.endpoint() == &endpoint)
        .ok_or((StatusCode::NOT_FOUND, format!("unknown backend {endpoint}")))?;
    Ok(Json(BackendStatus::from(node.as_ref())))
}
