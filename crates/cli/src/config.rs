//! CLI configuration
//!
//! Loaded from `--config <file>` when given, otherwise from
//! `<config_dir>/difftrack/config.toml`. A missing default file means defaults.

use crate::export::ExportConfig;
use anyhow::{Context, Result};
use dt_walker::{FilterConfig, PathFilter, Snapshotter, WalkConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtConfig {
    /// Path filter settings
    #[serde(default)]
    pub filter: FilterConfig,

    /// Graph walk settings
    #[serde(default)]
    pub walk: WalkConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
}

impl DtConfig {
    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.walk.max_depth == 0 {
            anyhow::bail!("walk.max_depth must be at least 1");
        }
        for name in &self.filter.additional {
            if name.is_empty() || name.contains(dt_core::path::SEPARATOR) {
                anyhow::bail!(
                    "filter.additional entries must be single member names, got '{}'",
                    name
                );
            }
        }
        Ok(())
    }

    /// Snapshotter configured from this config
    pub fn snapshotter(&self) -> Snapshotter {
        Snapshotter::new(PathFilter::new(&self.filter), self.walk.clone())
    }
}

/// Default config file location
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("difftrack").join("config.toml"))
}

/// Load configuration
///
/// An explicit path must exist; the default location is optional.
pub fn load(explicit: Option<&Path>) -> Result<DtConfig> {
    if let Some(path) = explicit {
        return load_from(path);
    }

    match config_file_path() {
        Some(path) if path.exists() => load_from(&path),
        _ => Ok(DtConfig::default()),
    }
}

/// Load and validate configuration from a file
pub fn load_from(path: &Path) -> Result<DtConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: DtConfig = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

/// Write configuration to `path`, creating parent directories
pub fn save(config: &DtConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }
    let text = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, text)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

/// Commented example configuration
pub fn example_config() -> String {
    r#"# difftrack configuration

[filter]
# Skip structural links (parent, children, siblings, deps, ...)
use_default_denylist = true
# Never walk binary buffer views
exclude_buffer_views = true
# Extra member names to skip
additional = []

[walk]
# Deepest path, in segments, the snapshot walk descends to
max_depth = 512

[export]
# csv or lines
format = "csv"
# Reduce candidate paths before writing them
reduce_paths = true
# Header row in CSV output
header = true
"#
    .to_string()
}
