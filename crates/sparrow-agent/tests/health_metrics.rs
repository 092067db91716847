#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use sparrow_agent::checks::{HealthMetrics, MetricSet, Observe};
use sparrow_agent::obs::{same_collector, Collector, Registry};

fn list(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

#[test]
fn removed_target_loses_its_series() {
    let m = HealthMetrics::new();
    m.set("a.com", 1.0);
    m.set("b.com", 0.0);

    let removed = m.remove_obsolete(&list(&["a.com", "b.com"]), &list(&["a.com"]));

    assert_eq!(removed, 1);
    assert_eq!(m.targets(), list(&["a.com"]));
    assert_eq!(m.value("a.com"), Some(1.0));
    assert_eq!(m.value("b.com"), None);
}

#[test]
fn set_overwrites_and_creates_on_first_write() {
    let m = HealthMetrics::new();
    assert_eq!(m.value("a.com"), None);
    m.set("a.com", 0.0);
    m.set("a.com", 1.0);
    assert_eq!(m.value("a.com"), Some(1.0));
    assert_eq!(m.targets().len(), 1);
}

#[test]
fn pruning_with_unchanged_targets_is_a_noop() {
    let m = HealthMetrics::new();
    m.set("a.com", 1.0);
    m.set("b.com", 0.0);
    let t = list(&["a.com", "b.com"]);

    assert_eq!(m.remove_obsolete(&t, &t), 0);
    assert_eq!(m.targets(), t);
}

#[test]
fn pruning_from_nothing_is_a_noop() {
    let m = HealthMetrics::new();
    m.set("a.com", 1.0);
    assert_eq!(m.remove_obsolete(&[], &list(&["a.com"])), 0);
    assert_eq!(m.value("a.com"), Some(1.0));
}

#[test]
fn unknown_old_targets_are_ignored() {
    let m = HealthMetrics::new();
    m.set("a.com", 1.0);
    assert_eq!(m.remove_obsolete(&list(&["never-seen"]), &[]), 0);
    assert_eq!(m.value("a.com"), Some(1.0));
}

#[test]
fn empty_new_list_tears_everything_down() {
    let m = HealthMetrics::new();
    for t in ["a", "b", "c"] {
        m.set(t, 1.0);
    }
    assert_eq!(m.remove_obsolete(&list(&["a", "b", "c", "a"]), &[]), 3);
    assert!(m.targets().is_empty());
}

#[test]
fn kept_target_can_still_be_written_after_prune() {
    let m = HealthMetrics::new();
    m.set("a.com", 1.0);
    m.set("b.com", 1.0);
    m.remove_obsolete(&list(&["a.com", "b.com"]), &list(&["b.com"]));
    m.set("b.com", 0.0);
    assert_eq!(m.value("b.com"), Some(0.0));
}

#[test]
fn no_leak_after_a_sequence_of_reloads() {
    let m = HealthMetrics::new();
    let configs = [
        list(&["a", "b", "c"]),
        list(&["b", "c", "d"]),
        list(&["d"]),
        list(&["d", "e"]),
    ];
    let mut prev: Vec<String> = Vec::new();
    for cfg in &configs {
        m.remove_obsolete(&prev, cfg);
        for t in cfg {
            m.set(t, 1.0);
        }
        prev = cfg.clone();
    }
    assert_eq!(m.targets(), list(&["d", "e"]));
}

#[test]
fn collectors_are_stable() {
    let m = HealthMetrics::new();
    let first = m.collectors();
    m.set("a.com", 1.0);
    let second = m.collectors();

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert!(same_collector(&first[0], &second[0]));
    assert_eq!(first[0].name(), "sparrow_health_up");
}

#[test]
fn exposition_lists_each_target() {
    let m = HealthMetrics::new();
    let registry = Registry::new();
    registry.register_all(&m.collectors()).unwrap();

    m.set("b.com", 0.0);
    m.set("a.com", 1.0);

    let out = registry.gather();
    assert!(out.contains("# HELP sparrow_health_up Health of targets\n"));
    assert!(out.contains("# TYPE sparrow_health_up gauge\n"));
    let a = out.find("sparrow_health_up{target=\"a.com\"} 1\n").expect("a.com series");
    let b = out.find("sparrow_health_up{target=\"b.com\"} 0\n").expect("b.com series");
    assert!(a < b, "series are sorted by label");
}
