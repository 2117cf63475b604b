//! Configuration management command
//!
//! Provides CLI interface to view and edit difftrack configuration.

use anyhow::{Context, Result};
use dt_cli::config::{self, DtConfig};
use dt_cli::ExportFormat;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

/// File a command reads and writes: the explicit one, else the default location
fn target_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => config::config_file_path().context("Could not determine config file path"),
    }
}

/// List all configuration values
pub fn run_list(explicit: Option<&Path>) -> Result<()> {
    let config = config::load(explicit)?;
    let config_path = target_path(explicit)?;

    println!("{}", "difftrack Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    println!("{}", "[filter]".yellow());
    println!("  {} = {}", "use_default_denylist".cyan(), config.filter.use_default_denylist);
    println!("  {} = {}", "exclude_buffer_views".cyan(), config.filter.exclude_buffer_views);
    println!(
        "  {} = {} {}",
        "additional".cyan(),
        format!("{:?}", config.filter.additional),
        format!("({} names denied in total)", config.snapshotter().filter().denylist_len()).dimmed()
    );

    println!("\n{}", "[walk]".yellow());
    println!("  {} = {}", "max_depth".cyan(), config.walk.max_depth);

    println!("\n{}", "[export]".yellow());
    println!("  {} = {}", "format".cyan(), config.export.format);
    println!("  {} = {}", "reduce_paths".cyan(), config.export.reduce_paths);
    println!("  {} = {}", "header".cyan(), config.export.header);

    Ok(())
}

/// Get a single configuration value
pub fn run_get(key: &str, explicit: Option<&Path>) -> Result<()> {
    let config = config::load(explicit)?;

    let value = match key {
        "filter.use_default_denylist" => config.filter.use_default_denylist.to_string(),
        "filter.exclude_buffer_views" => config.filter.exclude_buffer_views.to_string(),
        "filter.additional" => config.filter.additional.join(","),
        "walk.max_depth" => config.walk.max_depth.to_string(),
        "export.format" => config.export.format.to_string(),
        "export.reduce_paths" => config.export.reduce_paths.to_string(),
        "export.header" => config.export.header.to_string(),
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'dt config list' to see available keys.",
            key
        ),
    };

    println!("{}", value);
    Ok(())
}

/// Set a configuration value
pub fn run_set(key: &str, value: &str, explicit: Option<&Path>) -> Result<()> {
    let path = target_path(explicit)?;
    let mut config = if path.exists() {
        config::load_from(&path)?
    } else {
        DtConfig::default()
    };

    match key {
        "filter.use_default_denylist" => {
            config.filter.use_default_denylist = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        "filter.exclude_buffer_views" => {
            config.filter.exclude_buffer_views = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        "filter.additional" => {
            config.filter.additional = value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }
        "walk.max_depth" => {
            config.walk.max_depth = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "export.format" => {
            config.export.format = value.parse::<ExportFormat>()?;
        }
        "export.reduce_paths" => {
            config.export.reduce_paths = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        "export.header" => {
            config.export.header = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'dt config list' to see available keys.",
            key
        ),
    }

    // Validate before saving
    config.validate().context("Invalid configuration value")?;
    config::save(&config, &path)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path and optionally create it
pub fn run_path(create: bool) -> Result<()> {
    let config_path = target_path(None)?;

    if create && !config_path.exists() {
        config::save(&DtConfig::default(), &config_path)?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else {
        println!("{}", config_path.display());
        if !config_path.exists() {
            println!("{}", "File does not exist. Use --create to create it.".yellow());
        }
    }

    Ok(())
}

/// Show example configuration
pub fn run_example() -> Result<()> {
    println!("{}", config::example_config());
    Ok(())
}
