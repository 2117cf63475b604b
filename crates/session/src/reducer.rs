//! Path reduction
//!
//! Rewrites a candidate path into a shorter one that reaches the same value, using
//! the shortest path recorded for each object identity in the alias table.
//!
//! The path is split into a `left` prefix still to be reduced and a settled `right`
//! suffix. Each step resolves `left`; when the resolved object has a recorded
//! alias, `left` is replaced by it. The last segment of `left` then moves to the
//! front of `right`. Reduction ends when `left` is empty.

use ahash::AHashMap;
use dt_core::{resolve, ObjectId, ObjectPath};
use dt_walker::{Candidate, Snapshot};
use std::time::Instant;
use tracing::{debug, info, trace};

/// Shortest known path per object identity
#[derive(Debug, Default)]
pub struct AliasIndex {
    shortest: AHashMap<ObjectId, ObjectPath>,
}

impl AliasIndex {
    /// Build from alias-table entries
    ///
    /// Primitives are skipped. On equal segment counts the entry seen first wins.
    pub fn build(entries: &[Candidate]) -> Self {
        let start = Instant::now();
        let mut shortest: AHashMap<ObjectId, ObjectPath> = AHashMap::new();

        for entry in entries {
            let Some(id) = entry.value.identity() else {
                continue;
            };
            match shortest.get_mut(&id) {
                Some(known) if entry.path.len() < known.len() => *known = entry.path.clone(),
                Some(_) => {}
                None => {
                    shortest.insert(id, entry.path.clone());
                }
            }
        }

        debug!(
            "Built alias index in {:?}: {} identities from {} entries",
            start.elapsed(),
            shortest.len(),
            entries.len()
        );
        Self { shortest }
    }

    /// Shortest recorded path of an object
    pub fn get(&self, id: ObjectId) -> Option<&ObjectPath> {
        self.shortest.get(&id)
    }

    pub fn len(&self) -> usize {
        self.shortest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortest.is_empty()
    }
}

/// How a reduction ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionOutcome {
    /// The whole path was reduced
    Complete,
    /// The step budget ran out; the shorter of the partial result and the input
    /// was returned
    DepthLimited,
    /// A prefix stopped resolving; the input was returned unchanged
    Unresolvable,
}

/// Result of reducing one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub path: ObjectPath,
    pub outcome: ReductionOutcome,
}

/// Reduces paths against a snapshot
///
/// The alias index is built lazily on first use and reused until
/// [`PathReducer::invalidate`] is called; node generation appends to the alias
/// table without refreshing it.
#[derive(Debug, Default)]
pub struct PathReducer {
    index: Option<AliasIndex>,
}

impl PathReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the alias index so the next reduction rebuilds it
    pub fn invalidate(&mut self) {
        if self.index.take().is_some() {
            debug!("Alias index invalidated");
        }
    }

    pub fn is_built(&self) -> bool {
        self.index.is_some()
    }

    /// Number of indexed identities, `None` before the first reduction
    pub fn index_len(&self) -> Option<usize> {
        self.index.as_ref().map(AliasIndex::len)
    }

    /// Reduce `path`, returning only the resulting path
    pub fn reduce(&mut self, path: &ObjectPath, snapshot: &Snapshot, log: bool) -> ObjectPath {
        self.reduce_detailed(path, snapshot, log).path
    }

    /// Reduce every path in order
    pub fn reduce_all(&mut self, paths: &[ObjectPath], snapshot: &Snapshot, log: bool) -> Vec<ObjectPath> {
        let start = Instant::now();
        let reduced: Vec<ObjectPath> = paths
            .iter()
            .map(|path| self.reduce(path, snapshot, log))
            .collect();
        info!("Reduced {} paths in {:?}", reduced.len(), start.elapsed());
        reduced
    }

    /// Reduce `path` and report how the reduction ended
    ///
    /// Runs at most one step per segment of the input. With `log` set, every step
    /// is reported at info level.
    pub fn reduce_detailed(&mut self, path: &ObjectPath, snapshot: &Snapshot, log: bool) -> Reduction {
        let start = Instant::now();
        let index = self
            .index
            .get_or_insert_with(|| AliasIndex::build(snapshot.alias_table()));

        let max_steps = path.len();
        let mut left = path.clone();
        let mut right = ObjectPath::root();
        let mut steps = 0;

        loop {
            if log {
                info!("[{}] [{}]", left, right);
            } else {
                trace!("[{}] [{}]", left, right);
            }

            if left.is_root() {
                break;
            }

            if steps == max_steps {
                let partial = left.join(&right);
                let best = if partial.len() <= path.len() {
                    partial
                } else {
                    path.clone()
                };
                debug!("Step limit {} reached reducing {}, returning {}", max_steps, path, best);
                return Reduction {
                    path: best,
                    outcome: ReductionOutcome::DepthLimited,
                };
            }
            steps += 1;

            let value = match resolve(snapshot.root(), &left) {
                Ok(value) => value,
                Err(e) => {
                    debug!("Cannot reduce {}: {} no longer resolves ({})", path, left, e);
                    return Reduction {
                        path: path.clone(),
                        outcome: ReductionOutcome::Unresolvable,
                    };
                }
            };

            if let Some(alias) = value.identity().and_then(|id| index.get(id)) {
                left = alias.clone();
            }
            if let Some(segment) = left.pop() {
                right.prepend(segment);
            }
        }

        if log {
            info!("Reduced {} to {} in {:?}", path, right, start.elapsed());
        }
        Reduction {
            path: right,
            outcome: ReductionOutcome::Complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::remove_changed;
    use dt_core::{load_graph, Record, Value};
    use dt_walker::{snapshot, PathFilter};
    use serde_json::json;

    fn path(text: &str) -> ObjectPath {
        text.parse().unwrap()
    }

    fn shared_graph() -> Value {
        load_graph(&json!({
            "a": {"b": {"c": {"leaf": 1, "f": {"$fn": "f"}}}},
            "short": {"alias": {"$ref": "a.b.c"}}
        }))
        .unwrap()
    }

    #[test]
    fn test_alias_index_prefers_shorter_paths() {
        let x = Record::object().into_value();
        let entries = vec![
            Candidate::new(x.clone(), path("a.b.c")),
            Candidate::new(x.clone(), path("s.t")),
            Candidate::new(x.clone(), path("u.v")),
            Candidate::new(Value::from(1), path("n")),
            Candidate::new(Value::Null, path("m")),
        ];
        let index = AliasIndex::build(&entries);

        assert_eq!(index.len(), 1);
        assert_eq!(index.get(x.identity().unwrap()), Some(&path("s.t")));
    }

    #[test]
    fn test_reduce_through_alias() {
        let root = shared_graph();
        let snap = snapshot(root.clone());
        let mut reducer = PathReducer::new();

        let reduction = reducer.reduce_detailed(&path("a.b.c"), &snap, false);
        assert_eq!(reduction.outcome, ReductionOutcome::Complete);
        assert_eq!(reduction.path, path("short.alias"));

        let original = resolve(&root, &path("a.b.c")).unwrap();
        let reduced = resolve(&root, &reduction.path).unwrap();
        assert!(original.strict_eq(&reduced));

        // Suffix below the aliased object is carried over
        assert_eq!(reducer.reduce(&path("a.b.c.leaf"), &snap, true), path("short.alias.leaf"));
    }

    #[test]
    fn test_reduce_never_longer() {
        let root = shared_graph();
        let snap = snapshot(root);
        let mut reducer = PathReducer::new();

        for text in ["a", "a.b", "a.b.c", "a.b.c.leaf", "short", "short.alias.leaf"] {
            let input = path(text);
            let reduced = reducer.reduce(&input, &snap, false);
            assert!(reduced.len() <= input.len(), "{} grew to {}", input, reduced);
        }
    }

    #[test]
    fn test_reduce_primitive_path_is_identity() {
        let root = load_graph(&json!({"other": 42, "f": {"$fn": "f"}})).unwrap();
        let snap = snapshot(root);
        let mut reducer = PathReducer::new();

        assert_eq!(reducer.reduce(&path("other"), &snap, false), path("other"));
        assert_eq!(reducer.reduce(&ObjectPath::root(), &snap, false), ObjectPath::root());
    }

    #[test]
    fn test_reduce_through_root_alias() {
        let root = load_graph(&json!({
            "window": {"$ref": ""},
            "theme": {"color": "red", "f": {"$fn": "f"}}
        }))
        .unwrap();
        let snap = snapshot(root);
        let mut reducer = PathReducer::new();

        assert_eq!(reducer.reduce(&path("window.theme.color"), &snap, false), path("theme.color"));
    }

    #[test]
    fn test_reduce_unresolvable_returns_input() {
        let root = shared_graph();
        let snap = snapshot(root.clone());
        root.as_object().unwrap().remove("a").unwrap();
        let mut reducer = PathReducer::new();

        let reduction = reducer.reduce_detailed(&path("a.b.c.leaf"), &snap, false);
        assert_eq!(reduction.outcome, ReductionOutcome::Unresolvable);
        assert_eq!(reduction.path, path("a.b.c.leaf"));
    }

    #[test]
    fn test_reduce_depth_limited_returns_shorter() {
        let root = load_graph(&json!({
            "deep": {"er": {"x": {"leaf": 1, "f": {"$fn": "f"}}}},
        }))
        .unwrap();
        let snap = snapshot(root.clone());

        // A new, shorter route to the object appears after the snapshot
        let x = resolve(&root, &path("deep.er.x")).unwrap();
        root.as_object().unwrap().set("s", x).unwrap();

        let mut reducer = PathReducer::new();
        let reduction = reducer.reduce_detailed(&path("s"), &snap, false);
        assert_eq!(reduction.outcome, ReductionOutcome::DepthLimited);
        assert_eq!(reduction.path, path("s"));
    }

    #[test]
    fn test_reduce_all_keeps_order() {
        let root = shared_graph();
        let snap = snapshot(root);
        let mut reducer = PathReducer::new();

        let reduced = reducer.reduce_all(&[path("a.b.c.leaf"), path("short")], &snap, false);
        assert_eq!(reduced, vec![path("short.alias.leaf"), path("short")]);
    }

    #[test]
    fn test_index_is_stale_until_invalidated() {
        let root = load_graph(&json!({
            "b": {"inner": {"p": 1, "q": 2}, "k": 3},
            "f": {"$fn": "f"}
        }))
        .unwrap();
        let mut snap = snapshot(root.clone());
        let mut reducer = PathReducer::new();
        assert!(!reducer.is_built());

        reducer.reduce(&path("b"), &snap, false);
        let built = reducer.index_len().unwrap();

        let inner = resolve(&root, &path("b.inner")).unwrap();
        inner.as_object().unwrap().set("q", Value::from(5)).unwrap();
        remove_changed(&mut snap);

        reducer.reduce(&path("b"), &snap, false);
        assert_eq!(reducer.index_len(), Some(built));

        reducer.invalidate();
        assert!(!reducer.is_built());
        reducer.reduce(&path("b"), &snap, false);
        assert_eq!(reducer.index_len(), Some(built + 1));
    }

    #[test]
    fn test_empty_snapshot_index() {
        let snap = dt_walker::Snapshot::new(Value::Null, PathFilter::default());
        let mut reducer = PathReducer::new();

        assert_eq!(reducer.reduce(&path("a"), &snap, false), path("a"));
        assert_eq!(reducer.index_len(), Some(0));
    }
}
