//! Change tracking over a snapshot
//!
//! This crate provides:
//! - Re-observation of candidates against the live graph
//! - The two change filters (remove changed / remove unchanged)
//! - Node generation for partially changed composites
//! - Alias-based path reduction
//! - A session type tying the above to one observed root

pub mod changes;
pub mod observe;
pub mod reducer;
pub mod session;

// Re-exports
pub use changes::{generate_nodes, remove_changed, remove_unchanged, PassSummary};
pub use observe::{observe, observe_at, Observation};
pub use reducer::{AliasIndex, PathReducer, Reduction, ReductionOutcome};
pub use session::{Round, RoundKind, Session, SessionError};
