//! Snapshot state and the initial graph walk
//!
//! A snapshot holds the candidate set (values hypothesized to lie on the route to the
//! value of interest) and the alias table (every node the walk visited, used only for
//! path shortening). The walk records the first serializable value it meets on each
//! branch and descends into everything else.

use crate::filter::PathFilter;
use ahash::AHashSet;
use dt_core::{deep_clone, ObjectId, ObjectPath, Value};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, trace};

/// A value together with the path it was found at
#[derive(Debug, Clone)]
pub struct Candidate {
    pub value: Value,
    pub path: ObjectPath,
}

impl Candidate {
    pub fn new(value: Value, path: ObjectPath) -> Self {
        Self { value, path }
    }
}

/// Aggregate state of one observation session
///
/// Created once by [`Snapshotter::snapshot`], then mutated in place by every
/// change-filter round.
#[derive(Debug)]
pub struct Snapshot {
    /// Observed object (shared with the host, not copied)
    root: Value,
    /// Filter the walk ran with; node generation reuses it
    filter: PathFilter,
    /// Identities already walked (cycle guard only)
    visited: AHashSet<ObjectId>,
    /// Current hypotheses, in discovery order
    candidates: Vec<Candidate>,
    /// Every visited node, live values, in discovery order
    alias_table: Vec<Candidate>,
}

impl Snapshot {
    /// Create an empty snapshot of `root`
    pub fn new(root: Value, filter: PathFilter) -> Self {
        Self {
            root,
            filter,
            visited: AHashSet::new(),
            candidates: Vec::new(),
            alias_table: Vec::new(),
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn alias_table(&self) -> &[Candidate] {
        &self.alias_table
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate paths, in order
    pub fn paths(&self) -> Vec<ObjectPath> {
        self.candidates.iter().map(|c| c.path.clone()).collect()
    }

    /// First candidate recorded at `path`
    pub fn find(&self, path: &ObjectPath) -> Option<&Candidate> {
        self.candidates.iter().find(|c| &c.path == path)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn is_visited(&self, id: ObjectId) -> bool {
        self.visited.contains(&id)
    }

    /// Mark an identity as walked; false when it already was
    pub fn mark_visited(&mut self, id: ObjectId) -> bool {
        self.visited.insert(id)
    }

    /// Record a visited node in the alias table
    pub fn record_alias(&mut self, value: Value, path: ObjectPath) {
        self.alias_table.push(Candidate::new(value, path));
    }

    /// Append a candidate
    pub fn push_candidate(&mut self, value: Value, path: ObjectPath) {
        self.candidates.push(Candidate::new(value, path));
    }

    /// Replace the stored value of the candidate at `index`
    pub fn update_candidate(&mut self, index: usize, value: Value) {
        if let Some(candidate) = self.candidates.get_mut(index) {
            candidate.value = value;
        }
    }

    /// Drop the candidates at the given indices, preserving the order of the rest
    ///
    /// `remove` must have one flag per candidate present when the pass started;
    /// candidates appended since are kept.
    pub fn compact(&mut self, remove: &[bool]) {
        let mut index = 0;
        self.candidates.retain(|_| {
            let drop = remove.get(index).copied().unwrap_or(false);
            index += 1;
            !drop
        });
    }
}

/// Walk configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Deepest path (in segments) the walk descends to (default: 512)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    512
}

/// Builds snapshots by walking a graph from its root
pub struct Snapshotter {
    filter: PathFilter,
    config: WalkConfig,
}

impl Snapshotter {
    pub fn new(filter: PathFilter, config: WalkConfig) -> Self {
        Self { filter, config }
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }

    /// Walk `root` and record every serializable value reachable from it
    ///
    /// Composite candidates are stored as detached clones; the alias table keeps the
    /// live values. Members whose access throws are skipped.
    pub fn snapshot(&self, root: Value) -> Snapshot {
        let start = Instant::now();
        let mut snapshot = Snapshot::new(root.clone(), self.filter.clone());

        self.walk(root, &mut snapshot);

        info!(
            "Snapshot took {:?}: {} candidates, {} aliases, {} objects visited",
            start.elapsed(),
            snapshot.len(),
            snapshot.alias_table.len(),
            snapshot.visited_count()
        );
        snapshot
    }

    /// Depth-first walk driven by an explicit stack
    ///
    /// Members are pushed in reverse so they are popped in enumeration order.
    fn walk(&self, root: Value, snapshot: &mut Snapshot) {
        let mut pending = vec![(root, ObjectPath::root())];

        while let Some((value, path)) = pending.pop() {
            if !self.filter.should_include(&path, &value) {
                trace!("Filtered out {}", path);
                continue;
            }
            if path.len() > self.config.max_depth {
                debug!("Depth limit {} reached at {}", self.config.max_depth, path);
                continue;
            }

            snapshot.record_alias(value.clone(), path.clone());

            // Primitives may legitimately repeat at many paths
            let object = match &value {
                Value::Object(object) => object.clone(),
                _ => {
                    snapshot.push_candidate(value, path);
                    continue;
                }
            };

            if !snapshot.mark_visited(object.id()) {
                continue;
            }

            match deep_clone(&value) {
                Ok(copy) => snapshot.push_candidate(copy, path),
                Err(e) => {
                    trace!("Descending into {}: {}", path, e);
                    for (key, member) in object.members().into_iter().rev() {
                        match member {
                            Ok(child) => pending.push((child, path.child(key))),
                            Err(e) => trace!("Skipping {}.{}: {}", path, key, e),
                        }
                    }
                }
            }
        }
    }
}

impl Default for Snapshotter {
    fn default() -> Self {
        Self::new(PathFilter::default(), WalkConfig::default())
    }
}

/// Snapshot `root` with the default filter and walk limits
pub fn snapshot(root: Value) -> Snapshot {
    Snapshotter::default().snapshot(root)
}
