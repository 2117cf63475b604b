//! difftrack CLI - dt command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

/// difftrack - find where a value lives in a live object graph
#[derive(Parser)]
#[command(name = "dt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log engine decisions (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a graph document and run session commands against it
    Run {
        /// JSON graph document
        graph: PathBuf,

        /// Read commands from a file instead of stdin
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Configuration file (default: <config_dir>/difftrack/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// View and edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    List {
        /// Configuration file to read instead of the default
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print a single configuration value
    Get {
        /// Key, e.g. walk.max_depth
        key: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Change a configuration value and save it
    Set {
        /// Key, e.g. walk.max_depth
        key: String,
        /// New value
        value: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the default config file path
    Path {
        /// Create the file with default values if missing
        #[arg(long)]
        create: bool,
    },
    /// Print an example configuration
    Example,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { graph, script, config } => {
            cmd::run::run(&graph, script.as_deref(), config.as_deref())
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List { config } => cmd::config::run_list(config.as_deref()),
            ConfigCommands::Get { key, config } => cmd::config::run_get(&key, config.as_deref()),
            ConfigCommands::Set { key, value, config } => {
                cmd::config::run_set(&key, &value, config.as_deref())
            }
            ConfigCommands::Path { create } => cmd::config::run_path(create),
            ConfigCommands::Example => cmd::config::run_example(),
        },
    }
}
