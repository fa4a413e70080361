//! Parent-mode tests: units "launched" in-process, their machine-readable stream fed back line by line.

use std::cell::RefCell;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use attrun::cli::orchestrator::{ChildLine, OrchestratorError, UnitLauncher, run_units};
use attrun::cli::single_unit::run_single_unit;
use attrun::cli::{ExitCode, execute_units};
use attrun::report::{ConsoleFormatter, ConsoleStyle, MachineFormatter};
use attrun::{Event, EventPipeline, ManifestProvider, ResultAccumulator, RunOptions, TestOutcome};
use serde_json::json;

const MARKERS: &str = "Microsoft.VisualStudio.TestTools.UnitTesting";

#[derive(Clone, Default)]
struct Shared(Rc<RefCell<Vec<u8>>>);

impl Shared {
    fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for Shared {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs each unit in this process through child mode and replays its stdout.
struct InProcess {
    provider: ManifestProvider,
    noise: bool,
}

impl InProcess {
    fn new() -> Self {
        let provider = ManifestProvider::new();
        provider.register("/units/passing.json", unit("Sample.Passing", json!([])).to_string());
        provider.register(
            "/units/failing.json",
            unit(
                "Sample.Failing",
                json!([{ "throw": { "type": "System.InvalidOperationException", "message": "nope" } }]),
            )
            .to_string(),
        );
        Self { provider, noise: false }
    }
}

impl UnitLauncher for InProcess {
    fn launch(
        &self,
        unit: &Path,
        options: &RunOptions,
        on_line: &mut dyn FnMut(ChildLine),
    ) -> Result<bool, OrchestratorError> {
        let stdout = Shared::default();
        let mut pipeline = EventPipeline::new().with(MachineFormatter::new(stdout.clone()));
        let result = run_single_unit(&self.provider, unit, options, &mut pipeline);
        drop(pipeline);

        if self.noise {
            on_line(ChildLine::Stdout("plain text from test code".into()));
            on_line(ChildLine::Stderr("warning from test code".into()));
        }
        for line in stdout.text().lines() {
            on_line(ChildLine::Stdout(line.to_string()));
        }
        Ok(result.success)
    }
}

fn unit(class: &str, body: serde_json::Value) -> serde_json::Value {
    json!({
        "format": "attrun-unit/1",
        "types": [{
            "name": class,
            "markers": [format!("{MARKERS}.TestClassAttribute")],
            "methods": [{ "name": "Runs", "markers": [format!("{MARKERS}.TestMethodAttribute")], "body": body }],
        }],
    })
}

fn units(paths: &[&str]) -> Vec<PathBuf> {
    paths.iter().map(PathBuf::from).collect()
}

#[test]
fn test_child_events_are_replayed_in_order() {
    let accumulator = Rc::new(RefCell::new(ResultAccumulator::new()));
    let mut pipeline = EventPipeline::new().with(Rc::clone(&accumulator));

    let success = run_units(
        &InProcess::new(),
        &units(&["/units/passing.json", "/units/failing.json"]),
        &RunOptions::new(),
        &mut pipeline,
    )
    .unwrap();
    drop(pipeline);

    assert!(!success);
    let report = accumulator.borrow().report().clone();
    assert_eq!(report.success, Some(false));
    assert_eq!(report.assemblies.len(), 2);
    assert_eq!(report.assemblies[0].path, "/units/passing.json");
    assert_eq!(report.test("Sample.Passing", "Runs").unwrap().outcome, TestOutcome::Passed);
    assert_eq!(report.test("Sample.Failing", "Runs").unwrap().outcome, TestOutcome::Failed);
}

#[test]
fn test_plain_child_output_is_forwarded() {
    #[derive(Default)]
    struct Output(Vec<Event>);

    impl attrun::EventHandler for Output {
        fn handle(&mut self, event: &Event) {
            if matches!(event, Event::OutputStdout(_) | Event::OutputStderr(_)) {
                self.0.push(event.clone());
            }
        }
    }

    let output = Rc::new(RefCell::new(Output::default()));
    let mut pipeline = EventPipeline::new().with(Rc::clone(&output));
    let launcher = InProcess {
        noise: true,
        ..InProcess::new()
    };

    run_units(&launcher, &units(&["/units/passing.json"]), &RunOptions::new(), &mut pipeline).unwrap();
    drop(pipeline);

    let output = &output.borrow().0;
    assert_eq!(output.len(), 2);
    assert!(matches!(&output[0], Event::OutputStdout(o) if o.message == "plain text from test code"));
    assert!(matches!(&output[1], Event::OutputStderr(e) if e.message == "warning from test code"));
}

#[test]
fn test_exit_code_follows_the_units() {
    let mut pipeline = EventPipeline::new();
    let passed = execute_units(&units(&["/units/passing.json"]), &RunOptions::new(), &InProcess::new(), &mut pipeline);
    assert_eq!(passed.unwrap(), ExitCode::SUCCESS);

    let failed = execute_units(
        &units(&["/units/passing.json", "/units/failing.json"]),
        &RunOptions::new(),
        &InProcess::new(),
        &mut pipeline,
    );
    assert_eq!(failed.unwrap_err().exit_code, ExitCode::FAILURE);
}

#[test]
fn test_console_summarizes_the_run() {
    let screen = Shared::default();
    let style = ConsoleStyle {
        color: false,
        verbose: false,
    };
    let mut pipeline = EventPipeline::new().with(ConsoleFormatter::new(screen.clone(), style));

    let _ = execute_units(
        &units(&["/units/passing.json", "/units/failing.json"]),
        &RunOptions::new(),
        &InProcess::new(),
        &mut pipeline,
    );
    drop(pipeline);

    let text = screen.text();
    assert!(text.contains("    Runs ... PASSED"), "{text}");
    assert!(text.contains("    Runs ... FAILED"), "{text}");
    assert!(text.contains("System.InvalidOperationException"), "{text}");
    assert!(text.contains("1 passed, 1 failed"), "{text}");
}

#[test]
fn test_missing_unit_fails_the_run() {
    let accumulator = Rc::new(RefCell::new(ResultAccumulator::new()));
    let mut pipeline = EventPipeline::new().with(Rc::clone(&accumulator));

    let success = run_units(
        &InProcess::new(),
        &units(&["/units/passing.json", "/units/missing.json"]),
        &RunOptions::new(),
        &mut pipeline,
    )
    .unwrap();
    drop(pipeline);

    assert!(!success);
    let report = accumulator.borrow().report().clone();
    assert!(report.assemblies[1].result.unwrap().not_found);
}

/// Replays fixed stdout lines and reports a fixed exit status.
struct Scripted {
    lines: Vec<String>,
    success: bool,
}

impl UnitLauncher for Scripted {
    fn launch(
        &self,
        _unit: &Path,
        _options: &RunOptions,
        on_line: &mut dyn FnMut(ChildLine),
    ) -> Result<bool, OrchestratorError> {
        for line in &self.lines {
            on_line(ChildLine::Stdout(line.clone()));
        }
        Ok(self.success)
    }
}

#[test]
fn test_unit_success_comes_from_the_exit_status() {
    let printed = attrun_events::encode_line(&Event::from(attrun_events::TestAssemblyEndEvent {
        path: "/units/failing.json".into(),
        result: attrun_events::TestAssemblyResult {
            success: true,
            ..Default::default()
        },
    }))
    .unwrap();
    let launcher = Scripted {
        lines: vec![printed, format!("printed {}", attrun_events::EVENT_LINE_PREFIX)],
        success: false,
    };
    let accumulator = Rc::new(RefCell::new(ResultAccumulator::new()));
    let mut pipeline = EventPipeline::new().with(Rc::clone(&accumulator));

    let success = run_units(&launcher, &units(&["/units/failing.json"]), &RunOptions::new(), &mut pipeline).unwrap();
    drop(pipeline);

    assert!(!success);
    assert_eq!(accumulator.borrow().report().success, Some(false));
}

#[test]
fn test_prefix_inside_a_line_stays_plain_output() {
    #[derive(Default)]
    struct Stdout(Vec<String>);

    impl attrun::EventHandler for Stdout {
        fn on_output_stdout(&mut self, event: &attrun_events::OutputStdoutEvent) {
            self.0.push(event.message.clone());
        }
    }

    let line = format!("value: {}TestRunEndEvent {{\"success\":true}}", attrun_events::EVENT_LINE_PREFIX);
    let launcher = Scripted {
        lines: vec![line.clone()],
        success: true,
    };
    let stdout = Rc::new(RefCell::new(Stdout::default()));
    let mut pipeline = EventPipeline::new().with(Rc::clone(&stdout));

    run_units(&launcher, &units(&["/units/passing.json"]), &RunOptions::new(), &mut pipeline).unwrap();
    drop(pipeline);

    assert_eq!(stdout.borrow().0, [line]);
}
