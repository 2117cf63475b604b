//! Path filtering for graph walks
//!
//! Two sources of exclusion, checked in order:
//! 1. Runtime category: binary buffer views are never walked (configurable)
//! 2. Member names: the final path segment is matched against a denylist of
//!    structural links (tree parent/child/sibling links, reactive dependency lists,
//!    stylesheet rule lists), built-in defaults plus config-provided additions

use ahash::AHashSet;
use dt_core::{ObjectKind, ObjectPath, Value};
use serde::{Deserialize, Serialize};

/// Built-in structural link names
///
/// Following any of these from a node leads back into the same structure, which
/// multiplies paths without adding information.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "child",
    "children",
    "cssRules",
    "dep",
    "deps",
    "firstChild",
    "firstElementChild",
    "lastChild",
    "lastElementChild",
    "nextDep",
    "nextElementSibling",
    "nextSibling",
    "nextSub",
    "parent",
    "previousElementSibling",
    "previousSibling",
    "prevDep",
    "prevSub",
    "sub",
    "subs",
];

/// Decides which (path, value) pairs a walk may visit
#[derive(Debug, Clone)]
pub struct PathFilter {
    /// Member names that are never followed
    denylist: AHashSet<String>,

    /// Drop binary buffer views regardless of name
    exclude_buffer_views: bool,
}

impl PathFilter {
    /// Build a filter from configuration
    pub fn new(config: &FilterConfig) -> Self {
        let mut denylist = AHashSet::new();
        if config.use_default_denylist {
            denylist.extend(DEFAULT_DENYLIST.iter().map(|name| name.to_string()));
        }
        denylist.extend(config.additional.iter().cloned());

        Self {
            denylist,
            exclude_buffer_views: config.exclude_buffer_views,
        }
    }

    /// A filter that admits everything
    pub fn allow_all() -> Self {
        Self {
            denylist: AHashSet::new(),
            exclude_buffer_views: false,
        }
    }

    /// Check whether a (path, value) pair may be visited
    ///
    /// The root path has no final segment and is never excluded by name.
    pub fn should_include(&self, path: &ObjectPath, value: &Value) -> bool {
        if self.exclude_buffer_views && value.object_kind() == Some(ObjectKind::BufferView) {
            return false;
        }

        match path.last_segment() {
            Some(name) => !self.is_denied(name),
            None => true,
        }
    }

    /// Check a member name against the denylist
    pub fn is_denied(&self, name: &str) -> bool {
        self.denylist.contains(name)
    }

    /// Add a name to the denylist
    pub fn deny(&mut self, name: impl Into<String>) {
        self.denylist.insert(name.into());
    }

    /// Number of denied names
    pub fn denylist_len(&self) -> usize {
        self.denylist.len()
    }

    /// Denied names, sorted
    pub fn denied_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.denylist.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}

/// Filter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Use the built-in denylist (default: true)
    #[serde(default = "default_true")]
    pub use_default_denylist: bool,

    /// Exclude binary buffer views (default: true)
    #[serde(default = "default_true")]
    pub exclude_buffer_views: bool,

    /// Additional member names to exclude
    #[serde(default)]
    pub additional: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            use_default_denylist: true,
            exclude_buffer_views: true,
            additional: vec![],
        }
    }
}

fn default_true() -> bool {
    true
}
