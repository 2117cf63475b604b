//! Core value model for difftrack
//!
//! This crate provides:
//! - The host capability interface (`HostObject`) and value model (`Value`, `ObjectRef`)
//! - An in-memory host family (`Record`) and a JSON graph loader
//! - Member-access paths and live path resolution
//! - Canonical form, deep clone and value comparison
//! - The error taxonomy shared by the engine

pub mod canonical;
pub mod error;
pub mod json;
pub mod path;
pub mod record;
pub mod value;

// Re-exports
pub use canonical::{compare, deep_clone, stringify, Comparison};
pub use error::{GraphError, Result};
pub use json::{load_graph, load_graph_str};
pub use path::{resolve, ObjectPath};
pub use record::Record;
pub use value::{HostObject, Member, ObjectId, ObjectKind, ObjectRef, Value};
