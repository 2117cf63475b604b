//! Observation session
//!
//! Owns the snapshot of one observed graph together with the reducer that
//! shortens its candidate paths, and keeps a history of change-filter rounds.

use crate::changes::{self, PassSummary};
use crate::reducer::{PathReducer, Reduction};
use dt_core::{ObjectPath, Value};
use dt_walker::{Snapshot, Snapshotter};
use thiserror::Error;
use tracing::info;

/// Session errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No snapshot taken yet")]
    NoSnapshot,
}

/// Kind of change-filter round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundKind {
    RemoveChanged,
    RemoveUnchanged,
}

/// One completed change-filter round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Round {
    pub kind: RoundKind,
    pub summary: PassSummary,
}

/// A single observation session over one root
pub struct Session {
    snapshotter: Snapshotter,
    snapshot: Option<Snapshot>,
    reducer: PathReducer,
    rounds: Vec<Round>,
}

impl Session {
    pub fn new(snapshotter: Snapshotter) -> Self {
        Self {
            snapshotter,
            snapshot: None,
            reducer: PathReducer::new(),
            rounds: Vec::new(),
        }
    }

    /// Take a fresh snapshot of `root`, discarding any previous session state
    pub fn start(&mut self, root: Value) -> &Snapshot {
        self.reducer.invalidate();
        self.rounds.clear();
        self.snapshot.insert(self.snapshotter.snapshot(root))
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_started(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn reducer(&self) -> &PathReducer {
        &self.reducer
    }

    /// Keep only candidates that did not change, expanding changed composites
    pub fn remove_changed(&mut self) -> Result<PassSummary, SessionError> {
        let snapshot = self.snapshot.as_mut().ok_or(SessionError::NoSnapshot)?;
        let summary = changes::remove_changed(snapshot);
        self.rounds.push(Round {
            kind: RoundKind::RemoveChanged,
            summary,
        });
        Ok(summary)
    }

    /// Keep only candidates that changed
    pub fn remove_unchanged(&mut self) -> Result<PassSummary, SessionError> {
        let snapshot = self.snapshot.as_mut().ok_or(SessionError::NoSnapshot)?;
        let summary = changes::remove_unchanged(snapshot);
        self.rounds.push(Round {
            kind: RoundKind::RemoveUnchanged,
            summary,
        });
        Ok(summary)
    }

    /// Reduce a single path
    pub fn reduce(&mut self, path: &ObjectPath, log: bool) -> Result<Reduction, SessionError> {
        let snapshot = self.snapshot.as_ref().ok_or(SessionError::NoSnapshot)?;
        Ok(self.reducer.reduce_detailed(path, snapshot, log))
    }

    /// Reduce the path of every current candidate, in candidate order
    pub fn reduce_all(&mut self, log: bool) -> Result<Vec<ObjectPath>, SessionError> {
        let snapshot = self.snapshot.as_ref().ok_or(SessionError::NoSnapshot)?;
        let paths = snapshot.paths();
        Ok(self.reducer.reduce_all(&paths, snapshot, log))
    }

    /// Force the alias index to be rebuilt on the next reduction
    pub fn invalidate(&mut self) {
        self.reducer.invalidate();
    }

    /// End the session, keeping the snapshotter
    pub fn reset(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            info!(
                "Session closed after {} rounds with {} candidates",
                self.rounds.len(),
                snapshot.len()
            );
        }
        self.reducer.invalidate();
        self.rounds.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Snapshotter::default())
    }
}
