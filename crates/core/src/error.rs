//! Error taxonomy for graph access

use thiserror::Error;

/// Failures raised while touching the observed graph
///
/// None of these abort an engine operation. The walker, the change filters and the
/// reducer each decide locally whether a failing node is dropped, kept or left unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A path segment is absent, or walks through a primitive
    #[error("path not found: {path}")]
    PathNotFound {
        /// The path that failed to resolve
        path: String,
    },

    /// The value cannot be cloned or canonicalized
    #[error("value is not serializable: {reason}")]
    NotSerializable {
        /// What made the value unserializable
        reason: String,
    },

    /// Reading a member threw
    #[error("access to member '{key}' was denied")]
    MemberAccessDenied {
        /// The member that could not be read
        key: String,
    },

    /// A depth guard was hit
    #[error("maximum depth of {limit} exceeded")]
    MaxDepthExceeded {
        /// The configured limit
        limit: usize,
    },

    /// Path text could not be parsed
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending input
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// The host object does not support the requested operation
    #[error("operation not supported by {kind} object: {operation}")]
    Unsupported {
        /// Kind of the host object
        kind: String,
        /// The attempted operation
        operation: &'static str,
    },

    /// A graph document could not be turned into a host graph
    #[error("invalid graph document: {0}")]
    InvalidGraph(String),
}

impl GraphError {
    pub(crate) fn not_serializable(reason: impl Into<String>) -> Self {
        GraphError::NotSerializable {
            reason: reason.into(),
        }
    }

    pub(crate) fn path_not_found(path: impl std::fmt::Display) -> Self {
        GraphError::PathNotFound {
            path: path.to_string(),
        }
    }
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
