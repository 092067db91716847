//! Probing targets.
//!
//! The measurement itself sits behind [`Prober`] so checks can be driven by
//! other transports (or by scripted outcomes in tests). The default
//! [`TcpProber`] opens a TCP connection and reports how long it took.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::Instant;
use url::Url;

/// Result class of one probe. Also used as the latency `status` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeStatus {
    Success,
    Error,
    Timeout,
}

impl ProbeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProbeStatus::Success => "success",
            ProbeStatus::Error => "error",
            ProbeStatus::Timeout => "timeout",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ProbeStatus::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: ProbeStatus,
    pub elapsed: Duration,
}

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &str, timeout: Duration) -> ProbeOutcome;
}

/// TCP connect probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProber;

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, target: &str, timeout: Duration) -> ProbeOutcome {
        let start = Instant::now();
        let Some(addr) = socket_addr_of(target) else {
            tracing::debug!(%target, "target has no resolvable host");
            return ProbeOutcome { status: ProbeStatus::Error, elapsed: start.elapsed() };
        };

        let status = match tokio::time::timeout(timeout, TcpStream::connect(addr.as_str())).await {
            Ok(Ok(_stream)) => ProbeStatus::Success,
            Ok(Err(e)) => {
                tracing::debug!(%target, %addr, error = %e, "probe connect failed");
                ProbeStatus::Error
            }
            Err(_) => {
                tracing::debug!(%target, %addr, ?timeout, "probe timed out");
                ProbeStatus::Timeout
            }
        };
        ProbeOutcome { status, elapsed: start.elapsed() }
    }
}

/// Turn a target into a `host:port` connect address.
///
/// URLs use their scheme's well-known port when none is given. Anything else
/// is taken as `host:port`, or `host` on port 80.
pub fn socket_addr_of(target: &str) -> Option<String> {
    let target = target.trim();
    if target.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(target) {
        if let Some(host) = url.host_str() {
            let port = url.port_or_known_default()?;
            return Some(format!("{host}:{port}"));
        }
    }

    let has_port = target
        .rsplit_once(':')
        .map(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
        .unwrap_or(false);
    if has_port {
        Some(target.to_string())
    } else if target.contains(':') || target.contains('/') {
        None
    } else {
        Some(format!("{target}:80"))
    }
}
