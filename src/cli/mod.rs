//! CLI module for the attrun test runner.
//!
//! ```text
//! attrun [OPTIONS] <UNIT>...
//! ```
//!
//! Every unit runs in a child process of the same program started with the hidden `--single-unit` switch. The child
//! writes machine-readable events on stdout; the parent renders them on the console.
//!
//! ## Modules
//!
//! - `orchestrator` - parent mode: child processes, one per unit
//! - `single_unit` - child mode: load, discover and execute one unit
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run_with()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod orchestrator;
pub mod single_unit;

use std::fmt;
use std::path::PathBuf;
use std::process;

use attrun_events::{ExceptionInfo, ProgramBannerEvent, ProgramInternalErrorEvent, ProgramUsageEvent};
use clap::{CommandFactory, Parser};
use miette::{Diagnostic, NarratableReportHandler};

use self::orchestrator::{ChildProcessLauncher, UnitLauncher};
use crate::metadata::MetadataProvider;
use crate::metadata::manifest::ManifestProvider;
use crate::options::RunOptions;
use crate::report::{ConsoleFormatter, ConsoleStyle, EventPipeline, MachineFormatter};
use crate::version::{ATTRUN_VERSION, PROGRAM_NAME};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
/// An empty message means the problem was already reported as an event.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// A failure that has already been reported.
    pub fn reported() -> Self {
        Self::new("", ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Runs attribute-driven unit tests, each unit in its own process
#[derive(Parser, Debug)]
#[command(name = "attrun")]
#[command(version = ATTRUN_VERSION)]
#[command(about = "Runs attribute-driven unit tests, each unit in its own process", long_about = None)]
pub struct Cli {
    /// Test units to run
    #[arg(value_name = "UNIT")]
    pub units: Vec<PathBuf>,

    /// Only run the named class (short or fully-qualified name); repeatable
    #[arg(long = "class", value_name = "NAME")]
    pub classes: Vec<String>,

    /// Run exactly one unit in this process and write machine-readable events (used for child processes)
    #[arg(long = "single-unit", hide = true)]
    pub single_unit: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Report every hook and per-test timing
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn options(&self) -> RunOptions {
        RunOptions::new()
            .with_class_filter(self.classes.iter().cloned())
            .with_verbose(self.verbose)
            .with_color(!self.no_color && std::env::var_os("NO_COLOR").is_none())
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point, reading units through the manifest provider.
pub fn run() {
    run_with(ManifestProvider::new());
}

/// CLI entry point for embedders bringing their own provider.
///
/// This is the only place where `process::exit` is called. Child processes re-execute the same binary, so the
/// embedding binary must call this as well.
pub fn run_with(provider: impl MetadataProvider) {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
            process::exit(code.0);
        }
    };

    match execute(cli, &provider) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the parsed command line.
pub fn execute(cli: Cli, provider: &dyn MetadataProvider) -> CliResult<ExitCode> {
    let options = cli.options();
    if cli.single_unit {
        return execute_single_unit(&cli.units, provider, &options);
    }

    let mut pipeline = EventPipeline::new().with(ConsoleFormatter::stdout(ConsoleStyle {
        color: options.color,
        verbose: options.verbose,
    }));
    match ChildProcessLauncher::current_exe() {
        Ok(launcher) => execute_units(&cli.units, &options, &launcher, &mut pipeline),
        Err(err) => {
            pipeline.raise(ProgramInternalErrorEvent {
                exception: ExceptionInfo::from_error(&err),
            });
            Err(CliError::reported())
        }
    }
}

/// Parent mode.
pub fn execute_units(
    units: &[PathBuf],
    options: &RunOptions,
    launcher: &dyn UnitLauncher,
    pipeline: &mut EventPipeline,
) -> CliResult<ExitCode> {
    pipeline.raise(ProgramBannerEvent {
        name: PROGRAM_NAME.to_string(),
        version: ATTRUN_VERSION.to_string(),
    });
    if units.is_empty() {
        pipeline.raise(ProgramUsageEvent {
            usage: Cli::command().render_help().to_string(),
        });
        return Err(CliError::reported());
    }

    match orchestrator::run_units(launcher, units, options, pipeline) {
        Ok(true) => Ok(ExitCode::SUCCESS),
        Ok(false) => Err(CliError::reported()),
        Err(err) => {
            tracing::error!(error = %err, "run aborted");
            pipeline.raise(ProgramInternalErrorEvent {
                exception: ExceptionInfo::from_error(&err),
            });
            Err(CliError::reported())
        }
    }
}

/// Child mode.
fn execute_single_unit(
    units: &[PathBuf],
    provider: &dyn MetadataProvider,
    options: &RunOptions,
) -> CliResult<ExitCode> {
    let [unit] = units else {
        return Err(CliError::failure(format!(
            "--single-unit expects exactly one unit, got {}",
            units.len()
        )));
    };
    let mut pipeline = EventPipeline::new().with(MachineFormatter::stdout());
    let result = single_unit::run_single_unit(provider, unit, options, &mut pipeline);
    if result.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Err(CliError::reported())
    }
}

/// Plain-text rendering of a user-facing diagnostic: the message, its causes, the help line and the code.
pub fn render_diagnostic(diagnostic: &dyn Diagnostic) -> String {
    let mut text = String::new();
    match NarratableReportHandler::new().render_report(&mut text, diagnostic) {
        Ok(()) => text.trim_end().to_string(),
        Err(_) => diagnostic.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    use attrun_events::{Event, EventHandler};

    use super::orchestrator::{ChildLine, OrchestratorError};
    use super::*;
    use crate::discovery::DiscoveryError;
    use crate::metadata::LoadError;

    #[test]
    fn test_cli_parse_units() {
        let cli = Cli::try_parse_from(["attrun", "a.json", "b.json"]).unwrap();
        assert_eq!(cli.units, [PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert!(!cli.single_unit);
    }

    #[test]
    fn test_cli_parse_class_filter() {
        let cli = Cli::try_parse_from(["attrun", "--class", "MathTests", "--class", "Sample.IoTests", "a.json"]).unwrap();
        assert_eq!(cli.options().class_filter, ["MathTests", "Sample.IoTests"]);
    }

    #[test]
    fn test_cli_parse_child_mode() {
        let cli = Cli::try_parse_from(["attrun", "--single-unit", "-v", "a.json"]).unwrap();
        assert!(cli.single_unit);
        assert!(cli.options().verbose);
    }

    #[test]
    fn test_cli_parse_no_color() {
        let cli = Cli::try_parse_from(["attrun", "--no-color", "a.json"]).unwrap();
        assert!(!cli.options().color);
    }

    #[test]
    fn test_cli_rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["attrun", "--parallel", "a.json"]).is_err());
    }

    #[test]
    fn test_child_mode_needs_exactly_one_unit() {
        let cli = Cli::try_parse_from(["attrun", "--single-unit", "a.json", "b.json"]).unwrap();
        let err = execute(cli, &ManifestProvider::new()).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("exactly one unit"));
    }

    #[derive(Default)]
    struct Recorded(Vec<Event>);

    impl EventHandler for Recorded {
        fn handle(&mut self, event: &Event) {
            self.0.push(event.clone());
        }
    }

    struct NeverLaunched;

    impl UnitLauncher for NeverLaunched {
        fn launch(
            &self,
            _unit: &Path,
            _options: &RunOptions,
            _on_line: &mut dyn FnMut(ChildLine),
        ) -> Result<bool, OrchestratorError> {
            unreachable!("no unit to launch")
        }
    }

    #[test]
    fn test_no_units_prints_usage() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let mut pipeline = EventPipeline::new().with(Rc::clone(&recorded));

        let err = execute_units(&[], &RunOptions::new(), &NeverLaunched, &mut pipeline).unwrap_err();

        assert_eq!(err.exit_code, ExitCode::FAILURE);
        let events = &recorded.borrow().0;
        assert!(matches!(&events[0], Event::ProgramBanner(b) if b.name == "attrun"));
        assert!(matches!(&events[1], Event::ProgramUsage(u) if u.usage.contains("UNIT")));
    }

    #[test]
    fn test_render_diagnostic_includes_cause_and_help() {
        let err = DiscoveryError::from(LoadError::Malformed {
            path: PathBuf::from("a.json"),
            reason: "missing field `name`".into(),
        });
        let text = render_diagnostic(&err);
        assert!(text.starts_with("cannot load the unit\n"), "{text}");
        assert!(text.contains("Caused by: unit 'a.json' is malformed: missing field `name`"), "{text}");
        assert!(text.ends_with("diagnostic code: attrun::discovery::load"), "{text}");

        let err = DiscoveryError::ConflictingRoles {
            method: "Sample.Tests.Both".into(),
            roles: "TestMethod, ClassInitialize".into(),
        };
        let text = render_diagnostic(&err);
        assert!(text.contains("diagnostic help: give each method a single lifecycle role"), "{text}");
        assert!(!text.ends_with('\n'));
    }
}
