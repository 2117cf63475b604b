//! Graph walking for difftrack
//!
//! This crate provides:
//! - Path filtering (runtime-category and member-name denylists)
//! - The `Snapshot` state shared by every observation round
//! - The cycle-safe initial walk (`Snapshotter`)

pub mod filter;
pub mod snapshot;

// Re-exports
pub use filter::{FilterConfig, PathFilter, DEFAULT_DENYLIST};
pub use snapshot::{snapshot, Candidate, Snapshot, Snapshotter, WalkConfig};
