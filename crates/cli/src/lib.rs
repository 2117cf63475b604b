//! difftrack command-line support
//!
//! This crate provides:
//! - Configuration loading (TOML, `dirs` default location)
//! - Export of final candidates (CSV / tab-separated lines)
//! - The session command interpreter behind `dt run`

pub mod config;
pub mod export;
pub mod script;

// Re-exports
pub use config::DtConfig;
pub use export::{ExportConfig, ExportFormat, ExportRow};
pub use script::{Command, Flow, Interpreter, ScriptStats};
