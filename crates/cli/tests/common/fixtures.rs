//! Graph document fixtures
//!
//! Each fixture writes a graph document (and optionally a command script) into a
//! scratch directory that is removed when the fixture is dropped.

use anyhow::Result;
use serde_json::{json, Value as Json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory holding one graph document
pub struct TestGraph {
    dir: TempDir,
    graph: PathBuf,
}

impl TestGraph {
    /// Write `doc` as `graph.json` in a fresh directory
    pub fn new(doc: &Json) -> Result<Self> {
        let dir = TempDir::new()?;
        let graph = dir.path().join("graph.json");
        fs::write(&graph, serde_json::to_string_pretty(doc)?)?;
        Ok(Self { dir, graph })
    }

    /// Small application state: a themed component with a callback and a
    /// self-referencing global
    pub fn app_state() -> Result<Self> {
        Self::new(&json!({
            "theme": {"color": "red", "nested": {"depth": 1}, "onChange": {"$fn": "onChange"}},
            "other": 42,
            "window": {"$ref": ""}
        }))
    }

    /// State reachable through a long route and a short alias
    pub fn aliased_store() -> Result<Self> {
        Self::new(&json!({
            "app": {"router": {"views": {"home": {
                "store": {"count": 1, "label": "home", "dispatch": {"$fn": "dispatch"}},
                "render": {"$fn": "render"}
            }}}},
            "store": {"$ref": "app.router.views.home.store"},
            "parent": {"$ref": ""}
        }))
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Graph path as a command-line argument
    pub fn graph_arg(&self) -> String {
        self.graph.display().to_string()
    }

    /// Write a file next to the graph, returning its path
    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }
}
