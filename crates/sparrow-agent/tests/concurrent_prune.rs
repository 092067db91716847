//! Writers and the reload path hitting the same metric set at once.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::thread;

use sparrow_agent::checks::{HealthMetrics, LatencyMetrics, LatencySample, MetricSet, Observe};
use sparrow_agent::obs::Registry;

fn list(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

#[test]
fn writes_to_kept_targets_survive_concurrent_pruning() {
    let m = LatencyMetrics::new();
    let kept = list(&["keep-1", "keep-2"]);
    let doomed: Vec<String> = (0..200).map(|i| format!("gone-{i}")).collect();
    for t in &doomed {
        m.set(t, LatencySample::new("success", 0.1));
    }
    let mut old = kept.clone();
    old.extend(doomed.iter().cloned());

    thread::scope(|s| {
        for t in &kept {
            let m = &m;
            s.spawn(move || {
                for i in 0..500 {
                    let status = if i % 2 == 0 { "success" } else { "error" };
                    m.set(t, LatencySample::new(status, 0.01));
                }
            });
        }
        s.spawn(|| {
            for _ in 0..50 {
                m.remove_obsolete(&old, &kept);
            }
        });
    });

    assert_eq!(m.targets(), kept);
    for t in &kept {
        assert_eq!(m.count(t), Some(500));
        assert_eq!(m.distribution(t).unwrap().count, 500);
        assert_eq!(m.statuses(t), list(&["error", "success"]));
    }
}

#[test]
fn scrape_during_writes_and_prunes_never_blocks_or_panics() {
    let m = HealthMetrics::new();
    let registry = Registry::new();
    registry.register_all(&m.collectors()).unwrap();
    let targets: Vec<String> = (0..50).map(|i| format!("t-{i}")).collect();

    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..200 {
                for t in &targets {
                    m.set(t, 1.0);
                }
            }
        });
        s.spawn(|| {
            for _ in 0..2000 {
                m.remove_obsolete(&targets, &targets[..25]);
            }
        });
        s.spawn(|| {
            for _ in 0..200 {
                let out = registry.gather();
                for line in out.lines().filter(|l| !l.starts_with('#')) {
                    assert!(line.starts_with("sparrow_health_up{target=\"t-"), "malformed line: {line}");
                    assert!(line.ends_with(" 1"), "malformed value: {line}");
                }
            }
        });
    });

    // Writers are done; one last prune must leave only the kept half.
    m.remove_obsolete(&targets, &targets[..25]);
    assert_eq!(m.targets().len(), 25);
}

/// A write racing the prune of its own target may land either before or
/// after the deletion. Both outcomes are allowed; what matters is that the
/// next prune clears whatever was left.
#[test]
fn racing_write_on_pruned_target_is_cleared_by_next_prune() {
    for _ in 0..50 {
        let m = LatencyMetrics::new();
        m.set("x", LatencySample::new("success", 0.1));
        let old = list(&["x"]);

        thread::scope(|s| {
            s.spawn(|| m.set("x", LatencySample::new("error", 0.2)));
            s.spawn(|| {
                m.remove_obsolete(&old, &[]);
            });
        });

        let left = m.targets();
        assert!(left.is_empty() || left == old, "unexpected targets: {left:?}");

        m.remove_obsolete(&old, &[]);
        assert!(m.targets().is_empty());
        assert!(m.statuses("x").is_empty());
    }
}

#[test]
fn write_racing_prune_of_same_target_is_all_or_nothing() {
    let m = LatencyMetrics::new();
    let old = list(&["x"]);

    for round in 0..2000 {
        thread::scope(|s| {
            s.spawn(|| m.set("x", LatencySample::new("success", 0.02)));
            s.spawn(|| {
                m.remove_obsolete(&old, &[]);
            });
        });

        let gauge = !m.statuses("x").is_empty();
        let count = m.count("x").is_some();
        let hist = m.distribution("x").is_some();
        assert!(
            gauge == count && count == hist,
            "round {round}: gauge={gauge} count={count} hist={hist}"
        );

        m.remove_obsolete(&old, &[]);
        assert!(m.targets().is_empty());
    }
}
