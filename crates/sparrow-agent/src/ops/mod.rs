//! Operational HTTP endpoints.
//!
//! - `/healthz`   : liveness
//! - `/readyz`    : readiness (503 when draining)
//! - `/metrics`   : Prometheus text format
//! - `/v1/checks` : running checks and their targets (JSON)

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::app_state::AppState;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_draining() {
        (StatusCode::SERVICE_UNAVAILABLE, "draining")
    } else {
        (StatusCode::OK, "ready")
    }
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.render_metrics();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

pub async fn checks(State(state): State<AppState>) -> Response {
    Json(state.checks().await).into_response()
}
