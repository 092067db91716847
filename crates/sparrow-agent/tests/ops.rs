#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use sparrow_agent::app_state::AppState;
use sparrow_agent::checks::{CheckManager, ProbeOutcome, ProbeStatus, Prober};
use sparrow_agent::config::{CheckConfig, ChecksConfig};
use sparrow_agent::obs::Registry;
use sparrow_agent::ops;

struct AlwaysUp;

#[async_trait]
impl Prober for AlwaysUp {
    async fn probe(&self, _target: &str, _timeout: Duration) -> ProbeOutcome {
        ProbeOutcome { status: ProbeStatus::Success, elapsed: Duration::from_millis(1) }
    }
}

async fn state_with_health(targets: &[&str]) -> AppState {
    let registry = Arc::new(Registry::new());
    let manager = Arc::new(CheckManager::new(Arc::clone(&registry), Arc::new(AlwaysUp)));
    let cfg = ChecksConfig {
        health: Some(CheckConfig {
            targets: targets.iter().map(|s| s.to_string()).collect(),
            interval_ms: 1000,
            timeout_ms: 100,
        }),
        latency: None,
    };
    manager.apply(&cfg).await.unwrap();
    AppState::new(registry, manager)
}

async fn body_string(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn healthz_is_ok() {
    let resp = ops::healthz().await.into_response();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn readyz_reports_draining() {
    let state = state_with_health(&["a"]).await;
    let resp = ops::readyz(State(state.clone())).await.into_response();
    assert_eq!(resp.status(), StatusCode::OK);

    state.set_draining();
    let resp = ops::readyz(State(state.clone())).await.into_response();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    state.manager().shutdown().await;
}

#[tokio::test]
async fn metrics_endpoint_exposes_check_series() {
    let state = state_with_health(&["a.com"]).await;

    let mut body = String::new();
    for _ in 0..200 {
        let resp = ops::metrics(State(state.clone())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; version=0.0.4; charset=utf-8"
        );
        body = body_string(resp).await;
        if body.contains("sparrow_health_up{target=\"a.com\"} 1") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(body.contains("sparrow_health_up{target=\"a.com\"} 1"), "got: {body}");
    state.manager().shutdown().await;
}

#[tokio::test]
async fn checks_endpoint_lists_targets() {
    let state = state_with_health(&["a.com", "b.com"]).await;
    let resp = ops::checks(State(state.clone())).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let v: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(v, serde_json::json!([{ "check": "health", "targets": ["a.com", "b.com"] }]));
    state.manager().shutdown().await;
}
