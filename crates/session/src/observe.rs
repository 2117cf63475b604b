//! Re-observing a candidate against the live graph

use dt_core::{compare, resolve, Comparison, GraphError, Value};
use dt_walker::{Candidate, Snapshot};

/// What re-resolving a candidate found
///
/// The change filters act differently on each variant, so "could not resolve",
/// "could not compare" and "resolved and compared" stay distinguishable.
#[derive(Debug, Clone)]
pub enum Observation {
    /// The path no longer resolves
    Unresolved(GraphError),
    /// The live value equals the stored one
    Unchanged,
    /// The live value differs from the stored one
    Changed { current: Value },
    /// The live value has no canonical form, so equality cannot be decided
    Incomparable { current: Value, reason: GraphError },
}

impl Observation {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Observation::Unchanged)
    }
}

/// Resolve `candidate` below `root` and compare it with its stored value
pub fn observe_at(root: &Value, candidate: &Candidate) -> Observation {
    let current = match resolve(root, &candidate.path) {
        Ok(value) => value,
        Err(e) => return Observation::Unresolved(e),
    };

    match compare(&candidate.value, &current) {
        Comparison::Equal => Observation::Unchanged,
        Comparison::Different => Observation::Changed { current },
        Comparison::Incomparable(reason) => Observation::Incomparable { current, reason },
    }
}

/// Observe the candidate at `index` of `snapshot`
pub fn observe(snapshot: &Snapshot, index: usize) -> Option<Observation> {
    snapshot
        .candidates()
        .get(index)
        .map(|candidate| observe_at(snapshot.root(), candidate))
}
