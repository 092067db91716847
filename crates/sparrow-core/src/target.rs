//! Target lists and the obsolete-target computation used on config reload.
//!
//! Targets are opaque strings; only equality matters. Lists may contain
//! duplicates and their order carries no meaning.

use std::collections::HashSet;

/// Opaque identifier of something being probed (URL, host or name).
pub type Target = String;

/// Targets present in `old` but absent from `new`.
///
/// The membership set over `new` is built once per call. Each obsolete target
/// is yielded once even if `old` repeats it; order follows first appearance
/// in `old`.
pub fn obsolete_targets<'a>(old: &'a [Target], new: &[Target]) -> Vec<&'a str> {
    if old.is_empty() {
        return Vec::new();
    }
    let keep: HashSet<&str> = new.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    old.iter()
        .map(String::as_str)
        .filter(|t| !keep.contains(t))
        .filter(|t| seen.insert(*t))
        .collect()
}

/// Targets present in `new` but absent from `old`.
pub fn added_targets<'a>(old: &[Target], new: &'a [Target]) -> Vec<&'a str> {
    obsolete_targets(new, old)
}

/// Deduplicate a target list, keeping first-appearance order.
pub fn dedup_targets(targets: &[Target]) -> Vec<Target> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(targets.len());
    targets
        .iter()
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}
