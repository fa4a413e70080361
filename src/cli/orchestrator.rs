//! Parent mode: run every unit in its own child process, one after another.
//!
//! A unit's configuration file switches process-global state that cannot be switched back, so units never share a
//! process. The child is the same program started with `--single-unit`; it writes its events to stdout in the
//! machine-readable encoding and the parent re-raises them into its own pipeline.
//!
//! Test code shares the child's stdout. A line it prints that starts with the event prefix is indistinguishable from
//! a real event and is replayed as one, so such a line can alter the console report. The exit status is unaffected:
//! a unit's success is always taken from the child's exit code, never from replayed events.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use attrun_events::{OutputStderrEvent, OutputStdoutEvent, TestRunBeginEvent, TestRunEndEvent, decode_line};
use miette::Diagnostic;
use thiserror::Error;

use crate::options::RunOptions;
use crate::report::EventPipeline;

#[derive(Debug, Error, Diagnostic)]
pub enum OrchestratorError {
    #[error("cannot locate the running executable")]
    #[diagnostic(code(attrun::orchestrator::current_exe))]
    CurrentExe(#[source] std::io::Error),

    #[error("cannot start '{}'", program.display())]
    #[diagnostic(code(attrun::orchestrator::spawn))]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("child process for '{}' has no output pipe", unit.display())]
    #[diagnostic(code(attrun::orchestrator::pipe))]
    MissingPipe { unit: PathBuf },

    #[error("waiting for the child process of '{}' failed", unit.display())]
    #[diagnostic(code(attrun::orchestrator::wait))]
    Wait {
        unit: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One line of child output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildLine {
    Stdout(String),
    Stderr(String),
}

/// Runs one unit in isolation.
pub trait UnitLauncher {
    /// Run `unit`, passing each output line to `on_line` as it arrives. Returns whether the unit succeeded.
    fn launch(
        &self,
        unit: &Path,
        options: &RunOptions,
        on_line: &mut dyn FnMut(ChildLine),
    ) -> Result<bool, OrchestratorError>;
}

/// Launches `program --single-unit <unit>` as a child process.
#[derive(Debug, Clone)]
pub struct ChildProcessLauncher {
    program: PathBuf,
}

impl ChildProcessLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Re-execute the running binary.
    pub fn current_exe() -> Result<Self, OrchestratorError> {
        std::env::current_exe()
            .map(Self::new)
            .map_err(OrchestratorError::CurrentExe)
    }

    /// Arguments passed to the child for `unit`.
    pub fn child_args(unit: &Path, options: &RunOptions) -> Vec<String> {
        let mut args = vec!["--single-unit".to_string()];
        for class in &options.class_filter {
            args.push("--class".to_string());
            args.push(class.clone());
        }
        if options.verbose {
            args.push("--verbose".to_string());
        }
        args.push("--".to_string());
        args.push(unit.display().to_string());
        args
    }
}

impl UnitLauncher for ChildProcessLauncher {
    fn launch(
        &self,
        unit: &Path,
        options: &RunOptions,
        on_line: &mut dyn FnMut(ChildLine),
    ) -> Result<bool, OrchestratorError> {
        let mut child = Command::new(&self.program)
            .args(Self::child_args(unit, options))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| OrchestratorError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        tracing::debug!(pid = child.id(), unit = %unit.display(), "started child");

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill();
            return Err(OrchestratorError::MissingPipe {
                unit: unit.to_path_buf(),
            });
        };

        let (tx, rx) = mpsc::channel();
        let readers = [
            spawn_reader(stdout, tx.clone(), ChildLine::Stdout),
            spawn_reader(stderr, tx, ChildLine::Stderr),
        ];
        // Ends once both readers hit end of file and drop their senders.
        for line in rx {
            on_line(line);
        }
        for reader in readers {
            let _ = reader.join();
        }

        let status = child.wait().map_err(|source| OrchestratorError::Wait {
            unit: unit.to_path_buf(),
            source,
        })?;
        tracing::debug!(unit = %unit.display(), %status, "child exited");
        Ok(status.success())
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    reader: R,
    tx: Sender<ChildLine>,
    wrap: fn(String) -> ChildLine,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in BufReader::new(reader).lines() {
            let Ok(line) = line else { break };
            if tx.send(wrap(line)).is_err() {
                break;
            }
        }
    })
}

/// Run `units` one at a time and raise everything they report. Returns whether every unit succeeded.
pub fn run_units(
    launcher: &dyn UnitLauncher,
    units: &[PathBuf],
    options: &RunOptions,
    pipeline: &mut EventPipeline,
) -> Result<bool, OrchestratorError> {
    pipeline.raise(TestRunBeginEvent {
        unit_count: units.len(),
    });

    let mut success = true;
    for unit in units {
        let _span = tracing::info_span!("unit", path = %unit.display()).entered();
        success &= launcher.launch(unit, options, &mut |line| forward(pipeline, line))?;
    }

    pipeline.raise(TestRunEndEvent { success });
    Ok(success)
}

/// Re-raise a child line: event lines as their events, anything else as plain output.
fn forward(pipeline: &mut EventPipeline, line: ChildLine) {
    match line {
        ChildLine::Stdout(text) => match decode_line(&text) {
            Ok(Some(event)) => pipeline.raise_event(&event),
            Ok(None) => pipeline.raise(OutputStdoutEvent { message: text }),
            Err(err) => {
                tracing::warn!(error = %err, "undecodable event line from child");
                pipeline.raise(OutputStdoutEvent { message: text });
            }
        },
        ChildLine::Stderr(text) => pipeline.raise(OutputStderrEvent { message: text }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn child_args_carry_the_filter() {
        let options = RunOptions::new()
            .with_class_filter(["MathTests", "Sample.IoTests"])
            .with_verbose(true);
        assert_eq!(
            ChildProcessLauncher::child_args(Path::new("units/math.json"), &options),
            [
                "--single-unit",
                "--class",
                "MathTests",
                "--class",
                "Sample.IoTests",
                "--verbose",
                "--",
                "units/math.json"
            ]
        );
    }

    #[test]
    fn child_args_keep_dashed_unit_paths_positional() {
        let args = ChildProcessLauncher::child_args(Path::new("-odd.json"), &RunOptions::new());
        assert_eq!(args, ["--single-unit", "--", "-odd.json"]);

        let cli = crate::cli::Cli::try_parse_from(std::iter::once("attrun".to_string()).chain(args)).unwrap();
        assert!(cli.single_unit);
        assert_eq!(cli.units, [PathBuf::from("-odd.json")]);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let launcher = ChildProcessLauncher::new("/definitely/not/a/program");
        let result = launcher.launch(Path::new("unit.json"), &RunOptions::new(), &mut |_| {});
        assert!(matches!(result, Err(OrchestratorError::Spawn { .. })));
    }
}
