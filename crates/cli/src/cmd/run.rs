//! `dt run`: command session over a graph document

use anyhow::{Context, Result};
use dt_cli::{config, Interpreter};
use owo_colors::OwoColorize;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::info;

pub fn run(graph: &Path, script: Option<&Path>, config_path: Option<&Path>) -> Result<()> {
    let config = config::load(config_path)?;

    let text = fs::read_to_string(graph)
        .with_context(|| format!("Failed to read graph document {}", graph.display()))?;
    let root = dt_core::load_graph_str(&text)
        .with_context(|| format!("Failed to load graph document {}", graph.display()))?;
    info!("Loaded graph from {}", graph.display());

    let input: Box<dyn BufRead> = match script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open script {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let stdout = io::stdout();
    let mut interpreter = Interpreter::new(root, config, stdout.lock());
    let stats = interpreter.run(input, &mut io::stderr())?;

    if stats.failed > 0 {
        eprintln!(
            "{}",
            format!("{} of {} commands failed", stats.failed, stats.executed).yellow()
        );
    }
    Ok(())
}
