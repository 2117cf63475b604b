//! Session command interpreter
//!
//! Commands arrive one per line, from stdin or a script file. A failing command
//! is reported and the session carries on with the next line.

use crate::config::DtConfig;
use crate::export::{self, ExportFormat, ExportRow};
use anyhow::{Context, Result};
use dt_core::{load_graph, resolve, ObjectPath, ObjectRef, Value};
use dt_session::{ReductionOutcome, Session, SessionError};
use owo_colors::OwoColorize;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// One session command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Snapshot(Option<ObjectPath>),
    RemoveChanged,
    RemoveUnchanged,
    Set { path: ObjectPath, value: serde_json::Value },
    Link { path: ObjectPath, target: ObjectPath },
    Delete(ObjectPath),
    List(Option<usize>),
    Reduce { path: ObjectPath, log: bool },
    ReduceAll { log: bool },
    Invalidate,
    Export { file: PathBuf, format: Option<ExportFormat> },
    Stats,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line; blank lines and `#` comments yield `None`
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();
        let log = args.contains(&"--log");

        let command = match name {
            "snapshot" => Command::Snapshot(args.first().map(|p| p.parse()).transpose()?),
            "remove-changed" => Command::RemoveChanged,
            "remove-unchanged" => Command::RemoveUnchanged,
            "set" => {
                let (path, json) = rest
                    .split_once(char::is_whitespace)
                    .context("Usage: set <path> <json>")?;
                let json = json.trim();
                Command::Set {
                    path: path.parse()?,
                    value: serde_json::from_str(json)
                        .with_context(|| format!("Invalid JSON value: {}", json))?,
                }
            }
            "link" => match args.as_slice() {
                [path, target] => Command::Link {
                    path: path.parse()?,
                    target: target.parse()?,
                },
                _ => anyhow::bail!("Usage: link <path> <target>"),
            },
            "delete" => match args.as_slice() {
                [path] => Command::Delete(path.parse()?),
                _ => anyhow::bail!("Usage: delete <path>"),
            },
            "list" => Command::List(
                args.first()
                    .map(|n| n.parse::<usize>())
                    .transpose()
                    .context("Usage: list [n]")?,
            ),
            "reduce" => {
                let path = args
                    .iter()
                    .find(|arg| **arg != "--log")
                    .context("Usage: reduce <path> [--log]")?;
                Command::Reduce {
                    path: path.parse()?,
                    log,
                }
            }
            "reduce-all" => Command::ReduceAll { log },
            "invalidate" => Command::Invalidate,
            "export" => match args.as_slice() {
                [file] => Command::Export {
                    file: PathBuf::from(file),
                    format: None,
                },
                [file, format] => Command::Export {
                    file: PathBuf::from(file),
                    format: Some(format.parse()?),
                },
                _ => anyhow::bail!("Usage: export <file> [csv|lines]"),
            },
            "stats" => Command::Stats,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => anyhow::bail!("Unknown command '{}'. Type 'help' for a list of commands.", other),
        };
        Ok(Some(command))
    }
}

/// Whether the session should keep reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Outcome of running a whole script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptStats {
    pub executed: usize,
    pub failed: usize,
}

/// Runs session commands against one host graph
pub struct Interpreter<W: Write> {
    root: Value,
    session: Session,
    config: DtConfig,
    out: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(root: Value, config: DtConfig, out: W) -> Self {
        let session = Session::new(config.snapshotter());
        Self {
            root,
            session,
            config,
            out,
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run every line of `input`, reporting failures to `errors`
    pub fn run<R: BufRead, E: Write>(&mut self, input: R, errors: &mut E) -> Result<ScriptStats> {
        let mut stats = ScriptStats::default();

        for (number, line) in input.lines().enumerate() {
            let line = line.context("Failed to read command input")?;
            match self.execute_line(&line) {
                Ok(None) => {}
                Ok(Some(flow)) => {
                    stats.executed += 1;
                    if flow == Flow::Quit {
                        break;
                    }
                }
                Err(e) => {
                    stats.executed += 1;
                    stats.failed += 1;
                    writeln!(errors, "{} line {}: {:#}", "Error".red(), number + 1, e)?;
                }
            }
        }

        self.out.flush()?;
        Ok(stats)
    }

    /// Parse and execute one line, `None` when the line holds no command
    pub fn execute_line(&mut self, line: &str) -> Result<Option<Flow>> {
        match Command::parse(line)? {
            Some(command) => self.execute(command).map(Some),
            None => Ok(None),
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Snapshot(path) => self.snapshot(path.as_ref())?,
            Command::RemoveChanged => {
                let summary = self.session.remove_changed()?;
                writeln!(
                    self.out,
                    "{} {} candidates left (removed {}, generated {})",
                    "✓".green(),
                    summary.after,
                    summary.removed,
                    summary.added
                )?;
            }
            Command::RemoveUnchanged => {
                let summary = self.session.remove_unchanged()?;
                writeln!(
                    self.out,
                    "{} {} candidates left (removed {}, refreshed {})",
                    "✓".green(),
                    summary.after,
                    summary.removed,
                    summary.refreshed
                )?;
            }
            Command::Set { path, value } => {
                let value = load_graph(&value)?;
                let (owner, key) = member_owner(&self.root, &path)?;
                owner.set(&key, value)?;
                writeln!(self.out, "{} set {}", "✓".green(), path)?;
            }
            Command::Link { path, target } => {
                let value = resolve(&self.root, &target)
                    .with_context(|| format!("Cannot link to {}", display_path(&target)))?;
                let (owner, key) = member_owner(&self.root, &path)?;
                owner.set(&key, value)?;
                writeln!(self.out, "{} linked {} -> {}", "✓".green(), path, display_path(&target))?;
            }
            Command::Delete(path) => {
                let (owner, key) = member_owner(&self.root, &path)?;
                if owner.remove(&key)?.is_none() {
                    anyhow::bail!("No member at {}", path);
                }
                writeln!(self.out, "{} deleted {}", "✓".green(), path)?;
            }
            Command::List(limit) => self.list(limit)?,
            Command::Reduce { path, log } => {
                let reduction = self.session.reduce(&path, log)?;
                match reduction.outcome {
                    ReductionOutcome::Complete => writeln!(self.out, "{}", display_path(&reduction.path))?,
                    ReductionOutcome::DepthLimited => writeln!(
                        self.out,
                        "{} {}",
                        display_path(&reduction.path),
                        "(step limit reached)".yellow()
                    )?,
                    ReductionOutcome::Unresolvable => writeln!(
                        self.out,
                        "{} {}",
                        display_path(&reduction.path),
                        "(no longer resolves)".yellow()
                    )?,
                }
            }
            Command::ReduceAll { log } => {
                for path in self.session.reduce_all(log)? {
                    writeln!(self.out, "{}", display_path(&path))?;
                }
            }
            Command::Invalidate => {
                self.session.invalidate();
                writeln!(self.out, "{} alias index dropped", "✓".green())?;
            }
            Command::Export { file, format } => {
                let format = format.unwrap_or(self.config.export.format);
                let rows = self.export_rows()?;
                let written = export::export_to_file(&file, format, &rows, self.config.export.header)?;
                writeln!(
                    self.out,
                    "{} exported {} rows to {} ({})",
                    "✓".green(),
                    written,
                    file.display(),
                    format
                )?;
            }
            Command::Stats => self.stats()?,
            Command::Help => self.help()?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn snapshot(&mut self, path: Option<&ObjectPath>) -> Result<()> {
        let target = match path {
            Some(path) => resolve(&self.root, path)
                .with_context(|| format!("Cannot snapshot {}", display_path(path)))?,
            None => self.root.clone(),
        };

        let snapshot = self.session.start(target);
        writeln!(
            self.out,
            "{} snapshot: {} candidates, {} aliases, {} objects visited",
            "✓".green(),
            snapshot.len(),
            snapshot.alias_table().len(),
            snapshot.visited_count()
        )?;
        Ok(())
    }

    fn list(&mut self, limit: Option<usize>) -> Result<()> {
        let snapshot = self.session.snapshot().ok_or(SessionError::NoSnapshot)?;
        let limit = limit.unwrap_or(snapshot.len());

        for (index, candidate) in snapshot.candidates().iter().take(limit).enumerate() {
            writeln!(
                self.out,
                "{:>4}  {}  {}",
                index.dimmed(),
                display_path(&candidate.path).cyan(),
                export::value_text(&candidate.value)
            )?;
        }
        if snapshot.len() > limit {
            writeln!(self.out, "{}", format!("... {} more", snapshot.len() - limit).dimmed())?;
        }
        writeln!(self.out, "{} candidates", snapshot.len())?;
        Ok(())
    }

    fn export_rows(&mut self) -> Result<Vec<ExportRow>> {
        let paths = if self.config.export.reduce_paths {
            Some(self.session.reduce_all(false)?)
        } else {
            None
        };
        let snapshot = self.session.snapshot().ok_or(SessionError::NoSnapshot)?;

        let rows = snapshot
            .candidates()
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                let path = paths
                    .as_ref()
                    .and_then(|paths| paths.get(index))
                    .unwrap_or(&candidate.path);
                ExportRow::new(&candidate.value, path)
            })
            .collect();
        Ok(rows)
    }

    fn stats(&mut self) -> Result<()> {
        let snapshot = self.session.snapshot().ok_or(SessionError::NoSnapshot)?;

        writeln!(self.out, "{}", "Session".bold())?;
        writeln!(self.out, "  {}: {}", "candidates".cyan(), snapshot.len())?;
        writeln!(self.out, "  {}: {}", "aliases".cyan(), snapshot.alias_table().len())?;
        writeln!(self.out, "  {}: {}", "visited".cyan(), snapshot.visited_count())?;
        writeln!(self.out, "  {}: {}", "rounds".cyan(), self.session.rounds().len())?;
        match self.session.reducer().index_len() {
            Some(len) => writeln!(self.out, "  {}: {} identities", "alias index".cyan(), len)?,
            None => writeln!(self.out, "  {}: {}", "alias index".cyan(), "not built".dimmed())?,
        }
        Ok(())
    }

    fn help(&mut self) -> Result<()> {
        writeln!(self.out, "{}", "Commands".bold())?;
        for (usage, description) in HELP {
            writeln!(self.out, "  {:<28} {}", usage.cyan(), description)?;
        }
        Ok(())
    }
}

const HELP: &[(&str, &str)] = &[
    ("snapshot [path]", "walk the graph, optionally from a sub-path"),
    ("remove-changed", "keep candidates that did not change"),
    ("remove-unchanged", "keep candidates that changed"),
    ("set <path> <json>", "assign a member of the graph"),
    ("link <path> <target>", "make <path> refer to the value at <target>"),
    ("delete <path>", "remove a member of the graph"),
    ("list [n]", "print candidates"),
    ("reduce <path> [--log]", "print the shortest known path"),
    ("reduce-all [--log]", "print every candidate path reduced"),
    ("invalidate", "rebuild the alias index on next reduction"),
    ("export <file> [csv|lines]", "write candidates to a file"),
    ("stats", "print session counters"),
    ("help", "print this list"),
    ("quit", "end the session"),
];

/// Object holding the last member of `path`, together with that member's name
fn member_owner(root: &Value, path: &ObjectPath) -> Result<(ObjectRef, String)> {
    let parent = path.parent().context("The root itself cannot be assigned")?;
    let key = path.last_segment().unwrap_or_default().to_string();

    let owner = resolve(root, &parent)?;
    let owner = owner
        .as_object()
        .cloned()
        .with_context(|| format!("{} is not an object", display_path(&parent)))?;
    Ok((owner, key))
}

fn display_path(path: &ObjectPath) -> String {
    if path.is_root() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dt_core::stringify;
    use serde_json::json;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn graph() -> Value {
        load_graph(&json!({
            "theme": {"color": "red", "nested": {"depth": 1}, "onChange": {"$fn": "onChange"}},
            "other": 42,
            "window": {"$ref": ""}
        }))
        .unwrap()
    }

    fn interpreter() -> Interpreter<Vec<u8>> {
        Interpreter::new(graph(), DtConfig::default(), Vec::new())
    }

    fn run(interp: &mut Interpreter<Vec<u8>>, script: &str) -> (ScriptStats, String) {
        let mut errors = Vec::new();
        let stats = interp.run(Cursor::new(script), &mut errors).unwrap();
        (stats, String::from_utf8(errors).unwrap())
    }

    fn candidate_paths(interp: &Interpreter<Vec<u8>>) -> Vec<String> {
        interp
            .session()
            .snapshot()
            .unwrap()
            .candidates()
            .iter()
            .map(|c| c.path.to_string())
            .collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  ").unwrap(), None);
        assert_eq!(Command::parse("# comment").unwrap(), None);
        assert_eq!(Command::parse("snapshot").unwrap(), Some(Command::Snapshot(None)));
        assert_eq!(
            Command::parse("snapshot theme").unwrap(),
            Some(Command::Snapshot(Some("theme".parse().unwrap())))
        );
        assert_eq!(
            Command::parse("set theme.color {\"r\": 1}").unwrap(),
            Some(Command::Set {
                path: "theme.color".parse().unwrap(),
                value: json!({"r": 1}),
            })
        );
        assert_eq!(
            Command::parse("reduce --log a.b").unwrap(),
            Some(Command::Reduce {
                path: "a.b".parse().unwrap(),
                log: true,
            })
        );
        assert_eq!(Command::parse("list 5").unwrap(), Some(Command::List(Some(5))));
        assert_eq!(
            Command::parse("export out.tsv lines").unwrap(),
            Some(Command::Export {
                file: PathBuf::from("out.tsv"),
                format: Some(ExportFormat::Lines),
            })
        );
        assert_eq!(Command::parse("exit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("frobnicate").is_err());
        assert!(Command::parse("set theme.color").is_err());
        assert!(Command::parse("set theme.color {oops").is_err());
        assert!(Command::parse("link a").is_err());
        assert!(Command::parse("list many").is_err());
        assert!(Command::parse("reduce").is_err());
        assert!(Command::parse("reduce a..b").is_err());
        assert!(Command::parse("export out.xml xml").is_err());
    }

    #[test]
    fn test_end_to_end_session() {
        let mut interp = interpreter();
        let (stats, errors) = run(
            &mut interp,
            "snapshot\nremove-changed\nset other 43\nremove-unchanged\nreduce other\n",
        );

        assert_eq!(errors, "");
        assert_eq!(stats.executed, 5);
        assert_eq!(candidate_paths(&interp), vec!["other"]);

        let output = String::from_utf8(interp.into_output()).unwrap();
        assert!(output.contains("snapshot: 3 candidates"));
        assert!(output.lines().any(|line| line == "other"));
    }

    #[test]
    fn test_errors_do_not_stop_session() {
        let mut interp = interpreter();
        let (stats, errors) = run(&mut interp, "list\nbogus\nsnapshot\ndelete missing\nstats\n");

        assert_eq!(stats.executed, 5);
        assert_eq!(stats.failed, 3);
        assert!(errors.contains("line 1"));
        assert!(errors.contains("No snapshot taken yet"));
        assert!(errors.contains("Unknown command 'bogus'"));
        assert!(errors.contains("No member at missing"));
        assert!(interp.session().is_started());
    }

    #[test]
    fn test_quit_stops_reading() {
        let mut interp = interpreter();
        let (stats, _) = run(&mut interp, "quit\nsnapshot\n");

        assert_eq!(stats.executed, 1);
        assert!(!interp.session().is_started());
    }

    #[test]
    fn test_link_and_reduce() {
        let mut interp = interpreter();
        run(&mut interp, "set deep {\"er\": {\"f\": {\"$fn\": \"f\"}}}\nlink deep.er.x theme.nested\nsnapshot\n");

        let reduction = interp
            .session
            .reduce(&"deep.er.x.depth".parse().unwrap(), false)
            .unwrap();
        assert_eq!(reduction.path.to_string(), "theme.nested.depth");
    }

    #[test]
    fn test_snapshot_sub_path() {
        let mut interp = interpreter();
        run(&mut interp, "snapshot theme\n");

        assert_eq!(candidate_paths(&interp), vec!["color", "nested"]);
        let value = &interp.session().snapshot().unwrap().candidates()[1].value;
        assert_eq!(stringify(value).unwrap(), r#"{"depth":1}"#);
    }

    #[test]
    fn test_set_root_rejected() {
        let mut interp = interpreter();
        let command = Command::Set {
            path: ObjectPath::root(),
            value: json!(1),
        };
        assert!(interp.execute(command).is_err());
    }

    #[test]
    fn test_export_reduces_paths() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("out.tsv");

        let mut interp = interpreter();
        let script = format!("snapshot\nexport {} lines\n", file.display());
        let (stats, errors) = run(&mut interp, &script);

        assert_eq!(stats.failed, 0, "{}", errors);
        let text = std::fs::read_to_string(&file).unwrap();
        assert_eq!(
            text,
            "theme.color\t[object String]\t\"red\"\n\
             theme.nested\t[object Object]\t{\"depth\":1}\n\
             other\t[object Number]\t42\n"
        );
    }

    #[test]
    fn test_list_limit() {
        let mut interp = interpreter();
        run(&mut interp, "snapshot\nlist 1\n");

        let output = String::from_utf8(interp.into_output()).unwrap();
        assert!(output.contains("theme.color"));
        assert!(output.contains("2 more"));
        assert!(output.contains("3 candidates"));
    }
}
