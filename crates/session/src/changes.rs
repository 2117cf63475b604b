//! Change filters and node generation
//!
//! Each round re-observes every candidate and either keeps, refreshes, drops or
//! expands it. Candidates appended while a round runs are not revisited by that
//! round.

use crate::observe::{observe_at, Observation};
use dt_core::{compare, deep_clone, Comparison, ObjectPath, Value};
use dt_walker::Snapshot;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Counts collected by one change-filter round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Candidates when the round started
    pub before: usize,
    /// Candidates dropped
    pub removed: usize,
    /// Candidates whose stored value was replaced with a fresh clone
    pub refreshed: usize,
    /// Candidates appended by node generation
    pub added: usize,
    /// Candidates left alone because they could not be resolved or compared
    pub undetermined: usize,
    /// Candidates when the round finished
    pub after: usize,
}

/// Keep only candidates whose value changed since the last observation
///
/// Changed candidates get a fresh clone as their new baseline, so the next round
/// compares against the value seen now. Candidates that cannot be resolved or
/// compared stay as they are.
pub fn remove_unchanged(snapshot: &mut Snapshot) -> PassSummary {
    let start = Instant::now();
    let total = snapshot.len();
    let mut summary = PassSummary {
        before: total,
        ..PassSummary::default()
    };
    let mut remove = vec![false; total];

    for (index, flag) in remove.iter_mut().enumerate() {
        let candidate = &snapshot.candidates()[index];
        match observe_at(snapshot.root(), candidate) {
            Observation::Unchanged => {
                *flag = true;
                summary.removed += 1;
            }
            Observation::Changed { current } => match deep_clone(&current) {
                Ok(copy) => {
                    snapshot.update_candidate(index, copy);
                    summary.refreshed += 1;
                }
                Err(e) => debug!("Keeping old baseline for {}: {}", candidate_path(snapshot, index), e),
            },
            Observation::Unresolved(e) => {
                trace!("Cannot resolve {}: {}", candidate_path(snapshot, index), e);
                summary.undetermined += 1;
            }
            Observation::Incomparable { reason, .. } => {
                trace!("Cannot compare {}: {}", candidate_path(snapshot, index), reason);
                summary.undetermined += 1;
            }
        }
    }

    snapshot.compact(&remove);
    summary.after = snapshot.len();

    info!(
        "Removed {} unchanged candidates in {:?} ({} left)",
        summary.removed,
        start.elapsed(),
        summary.after
    );
    summary
}

/// Keep only candidates whose value did not change
///
/// A changed composite candidate is not kept as a whole: its members are compared
/// one level down and the still-equal parts are appended as new candidates. Paths
/// that no longer resolve are dropped.
pub fn remove_changed(snapshot: &mut Snapshot) -> PassSummary {
    let start = Instant::now();
    let total = snapshot.len();
    let mut summary = PassSummary {
        before: total,
        ..PassSummary::default()
    };
    let mut remove = vec![false; total];

    for index in 0..total {
        // Owned: node generation appends to the candidate list
        let candidate = snapshot.candidates()[index].clone();

        match observe_at(snapshot.root(), &candidate) {
            Observation::Unresolved(e) => {
                trace!("Dropping {}: {}", candidate.path, e);
                remove[index] = true;
            }
            Observation::Unchanged => {}
            Observation::Changed { current } | Observation::Incomparable { current, .. } => {
                if candidate.value.is_composite() && current.is_composite() {
                    let before = snapshot.len();
                    expand_members(&candidate.value, &current, &candidate.path, snapshot);
                    summary.added += snapshot.len() - before;
                }
                remove[index] = true;
            }
        }
    }

    summary.removed = remove.iter().filter(|flag| **flag).count();
    snapshot.compact(&remove);
    summary.after = snapshot.len();

    info!(
        "Removed {} changed candidates, generated {} in {:?} ({} left)",
        summary.removed,
        summary.added,
        start.elapsed(),
        summary.after
    );
    summary
}

/// Append candidates for the parts of `curr` that still equal `prev`
///
/// Primitives are kept when strictly equal. Composites are kept whole when their
/// canonical forms match, otherwise their members are compared in turn. Every
/// admitted node is recorded in the alias table.
pub fn generate_nodes(prev: &Value, curr: &Value, path: ObjectPath, snapshot: &mut Snapshot) {
    if !snapshot.filter().should_include(&path, curr) {
        trace!("Filtered out {}", path);
        return;
    }

    snapshot.record_alias(curr.clone(), path.clone());

    if prev.is_primitive() || curr.is_primitive() {
        if prev.strict_eq(curr) {
            snapshot.push_candidate(curr.clone(), path);
        }
        return;
    }

    if let Some(id) = curr.identity() {
        if !snapshot.mark_visited(id) {
            return;
        }
    }

    match compare(prev, curr) {
        Comparison::Equal => match deep_clone(curr) {
            Ok(copy) => snapshot.push_candidate(copy, path),
            Err(e) => trace!("Cannot clone {}: {}", path, e),
        },
        Comparison::Different | Comparison::Incomparable(_) => {
            expand_members(prev, curr, &path, snapshot);
        }
    }
}

/// Run node generation on each member of `prev` that is still readable in `curr`
fn expand_members(prev: &Value, curr: &Value, path: &ObjectPath, snapshot: &mut Snapshot) {
    for (key, member) in prev.members() {
        let prev_child = match member {
            Ok(value) => value,
            Err(e) => {
                trace!("Skipping {}.{}: {}", path, key, e);
                continue;
            }
        };
        let curr_child = match curr.get(&key) {
            Some(Ok(value)) => value,
            Some(Err(e)) => {
                trace!("Skipping {}.{}: {}", path, key, e);
                continue;
            }
            None => continue,
        };

        generate_nodes(&prev_child, &curr_child, path.child(key), snapshot);
    }
}

fn candidate_path(snapshot: &Snapshot, index: usize) -> String {
    snapshot
        .candidates()
        .get(index)
        .map(|c| c.path.to_string())
        .unwrap_or_default()
}
