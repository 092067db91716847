#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use sparrow_agent::checks::probe::socket_addr_of;
use sparrow_agent::checks::{ProbeStatus, Prober, TcpProber};

#[test]
fn urls_use_known_default_ports() {
    assert_eq!(socket_addr_of("https://a.example").as_deref(), Some("a.example:443"));
    assert_eq!(socket_addr_of("http://a.example/health").as_deref(), Some("a.example:80"));
    assert_eq!(socket_addr_of("http://a.example:8080").as_deref(), Some("a.example:8080"));
    assert_eq!(socket_addr_of("https://[::1]:8443/").as_deref(), Some("[::1]:8443"));
}

#[test]
fn host_port_and_bare_hosts() {
    assert_eq!(socket_addr_of("b.example:443").as_deref(), Some("b.example:443"));
    assert_eq!(socket_addr_of("localhost:9000").as_deref(), Some("localhost:9000"));
    assert_eq!(socket_addr_of("c.example").as_deref(), Some("c.example:80"));
}

#[test]
fn unusable_targets() {
    assert_eq!(socket_addr_of(""), None);
    assert_eq!(socket_addr_of("host:notaport"), None);
}

#[tokio::test]
async fn tcp_probe_reaches_a_listener() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            if listener.accept().await.is_err() {
                break;
            }
        }
    });

    let out = TcpProber.probe(&addr.to_string(), Duration::from_secs(2)).await;
    assert_eq!(out.status, ProbeStatus::Success);
}

#[tokio::test]
async fn tcp_probe_reports_refused_as_error() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let l = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap()
    };
    let out = TcpProber.probe(&format!("http://{addr}"), Duration::from_secs(2)).await;
    assert_eq!(out.status, ProbeStatus::Error);
}

#[tokio::test]
async fn unresolvable_target_is_error() {
    let out = TcpProber.probe("host:notaport", Duration::from_millis(100)).await;
    assert_eq!(out.status, ProbeStatus::Error);
}
