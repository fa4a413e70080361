//! Human-readable console output.

use std::io::Write;
use std::time::{Duration, Instant};

use attrun_core::{LifecycleRole, TestOutcome};
use attrun_events::{
    AssemblyCleanupMethodEndEvent, AssemblyInitializeMethodEndEvent, ClassCleanupMethodEndEvent,
    ClassInitializeMethodEndEvent, EventHandler, ExceptionInfo, MethodRef, MethodResult, OutputStderrEvent,
    OutputStdoutEvent, OutputTraceEvent, ProgramBannerEvent, ProgramInternalErrorEvent, ProgramUsageEvent,
    ProgramUserErrorEvent, TestAssemblyBadFormatEvent, TestAssemblyBeginEvent, TestAssemblyConfigFileEvent,
    TestAssemblyNotFoundEvent, TestAssemblyNotTestEvent, TestClassBeginEvent, TestClassEndEvent,
    TestCleanupMethodEndEvent, TestEndEvent, TestInitializeMethodEndEvent, TestMethodEndEvent, TestRunBeginEvent,
    TestRunEndEvent,
};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_GREEN: &str = "\x1b[1;32m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleStyle {
    pub color: bool,
    /// Also report successful hooks and per-test timing.
    pub verbose: bool,
}

impl Default for ConsoleStyle {
    fn default() -> Self {
        Self {
            color: true,
            verbose: false,
        }
    }
}

/// Something that failed, reported again in the summary.
struct Failure {
    title: String,
    exception: Option<ExceptionInfo>,
}

/// Renders events for a person watching the run.
pub struct ConsoleFormatter {
    out: Box<dyn Write>,
    style: ConsoleStyle,
    started: Option<Instant>,
    passed: usize,
    failed: usize,
    ignored: usize,
    /// Failed steps of the test currently running.
    pending: Vec<Failure>,
    failures: Vec<Failure>,
}

impl ConsoleFormatter {
    pub fn new(out: impl Write + 'static, style: ConsoleStyle) -> Self {
        Self {
            out: Box::new(out),
            style,
            started: None,
            passed: 0,
            failed: 0,
            ignored: 0,
            pending: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn stdout(style: ConsoleStyle) -> Self {
        Self::new(std::io::stdout(), style)
    }

    fn paint(&self, code: &str, text: impl std::fmt::Display) -> String {
        if self.style.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Console output is best-effort; a closed stream must not abort the run.
    fn line(&mut self, text: impl std::fmt::Display) {
        let _ = writeln!(self.out, "{text}");
    }

    fn hook_end(&mut self, role: LifecycleRole, method: &MethodRef, result: &MethodResult) {
        if result.success {
            if self.style.verbose {
                let text = format!("  {role} {method} ({}ms)", result.elapsed.as_millis());
                let text = self.paint(DIM, text);
                self.line(text);
            }
            return;
        }
        let text = self.paint(RED, format!("  {role} {method} FAILED"));
        self.line(text);
        self.failures.push(Failure {
            title: format!("{role} {method}"),
            exception: result.exception.clone(),
        });
    }

    fn test_step_end(&mut self, role: LifecycleRole, method: &MethodRef, result: &MethodResult) {
        if result.success {
            return;
        }
        let title = match role {
            LifecycleRole::TestMethod => method.to_string(),
            _ => format!("{role} {method}"),
        };
        self.pending.push(Failure {
            title,
            exception: result.exception.clone(),
        });
    }

    fn status(&self, event: &TestEndEvent) -> String {
        let elapsed = |label: String| {
            if self.style.verbose {
                format!("{label} ({}ms)", event.elapsed.as_millis())
            } else {
                label
            }
        };
        match event.outcome {
            TestOutcome::Passed => elapsed(self.paint(GREEN, "PASSED")),
            TestOutcome::Failed => elapsed(self.paint(RED, "FAILED")),
            TestOutcome::Ignored if event.result.ignored_from_command_line => {
                self.paint(YELLOW, "IGNORED (not selected)")
            }
            TestOutcome::Ignored => self.paint(YELLOW, "IGNORED"),
        }
    }

    fn summary(&mut self, success: bool, elapsed: Duration) {
        let failures = std::mem::take(&mut self.failures);
        if !failures.is_empty() {
            self.line("");
            let header = self.paint(BOLD_RED, "=================== FAILURES ===================");
            self.line(header);
            for failure in &failures {
                self.line("");
                let title = self.paint(BOLD, format!("___________ {} ___________", failure.title));
                self.line(title);
                if let Some(exception) = &failure.exception {
                    self.line("");
                    for text in exception.to_string().lines() {
                        self.line(format!("    {text}"));
                    }
                }
            }
        }

        let mut parts = Vec::new();
        if self.passed > 0 {
            parts.push(format!("{} passed", self.passed));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if self.ignored > 0 {
            parts.push(format!("{} ignored", self.ignored));
        }
        if parts.is_empty() {
            parts.push("no tests ran".to_string());
        }

        let color = if success && self.failed == 0 { BOLD_GREEN } else { BOLD_RED };
        let bar = format!(
            "=================== {} in {:.2}s ===================",
            parts.join(", "),
            elapsed.as_secs_f64()
        );
        let bar = self.paint(color, bar);
        self.line("");
        self.line(bar);
    }
}

impl EventHandler for ConsoleFormatter {
    fn on_program_banner(&mut self, event: &ProgramBannerEvent) {
        let text = self.paint(BOLD, format!("{} {}", event.name, event.version));
        self.line(text);
    }

    fn on_program_usage(&mut self, event: &ProgramUsageEvent) {
        self.line(event.usage.trim_end());
    }

    fn on_program_user_error(&mut self, event: &ProgramUserErrorEvent) {
        let label = self.paint(RED, "error:");
        self.line(format!("{label} {}", event.message));
    }

    fn on_program_internal_error(&mut self, event: &ProgramInternalErrorEvent) {
        let label = self.paint(BOLD_RED, "internal error:");
        self.line(format!("{label} {}", event.exception));
    }

    fn on_output_trace(&mut self, event: &OutputTraceEvent) {
        let text = self.paint(DIM, format!("      | {}", event.message));
        self.line(text);
    }

    fn on_output_stdout(&mut self, event: &OutputStdoutEvent) {
        self.line(&event.message);
    }

    fn on_output_stderr(&mut self, event: &OutputStderrEvent) {
        self.line(&event.message);
    }

    fn on_test_run_begin(&mut self, event: &TestRunBeginEvent) {
        self.started = Some(Instant::now());
        let header = self.paint(BOLD, "=================== test run starts ===================");
        self.line(header);
        self.line(format!("{} unit(s)", event.unit_count));
    }

    fn on_test_run_end(&mut self, event: &TestRunEndEvent) {
        let elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        self.summary(event.success, elapsed);
    }

    fn on_test_assembly_begin(&mut self, event: &TestAssemblyBeginEvent) {
        self.line("");
        let text = self.paint(BOLD, &event.path);
        self.line(text);
    }

    fn on_test_assembly_not_found(&mut self, event: &TestAssemblyNotFoundEvent) {
        let text = self.paint(RED, format!("  not found: {}", event.path));
        self.line(text);
    }

    fn on_test_assembly_bad_format(&mut self, event: &TestAssemblyBadFormatEvent) {
        let text = self.paint(YELLOW, format!("  skipped, not a test unit: {}", event.reason));
        self.line(text);
    }

    fn on_test_assembly_not_test(&mut self, _event: &TestAssemblyNotTestEvent) {
        let text = self.paint(YELLOW, "  skipped, no test classes");
        self.line(text);
    }

    fn on_test_assembly_config_file(&mut self, event: &TestAssemblyConfigFileEvent) {
        if self.style.verbose {
            let text = self.paint(DIM, format!("  configuration: {}", event.config_path));
            self.line(text);
        }
    }

    fn on_assembly_initialize_method_end(&mut self, event: &AssemblyInitializeMethodEndEvent) {
        self.hook_end(LifecycleRole::AssemblyInitialize, &event.method, &event.result);
    }

    fn on_assembly_cleanup_method_end(&mut self, event: &AssemblyCleanupMethodEndEvent) {
        self.hook_end(LifecycleRole::AssemblyCleanup, &event.method, &event.result);
    }

    fn on_test_class_begin(&mut self, event: &TestClassBeginEvent) {
        self.line(format!("  {}", event.full_name));
    }

    fn on_class_initialize_method_end(&mut self, event: &ClassInitializeMethodEndEvent) {
        self.hook_end(LifecycleRole::ClassInitialize, &event.method, &event.result);
    }

    fn on_class_cleanup_method_end(&mut self, event: &ClassCleanupMethodEndEvent) {
        self.hook_end(LifecycleRole::ClassCleanup, &event.method, &event.result);
    }

    fn on_test_class_end(&mut self, event: &TestClassEndEvent) {
        let result = &event.result;
        if result.initialize_present && !result.initialize_succeeded && !result.class_ignored {
            let text = self.paint(RED, format!("    {} test(s) not run", result.total));
            self.line(text);
        }
    }

    fn on_test_initialize_method_end(&mut self, event: &TestInitializeMethodEndEvent) {
        self.test_step_end(LifecycleRole::TestInitialize, &event.method, &event.result);
    }

    fn on_test_method_end(&mut self, event: &TestMethodEndEvent) {
        self.test_step_end(LifecycleRole::TestMethod, &event.method, &event.result);
    }

    fn on_test_cleanup_method_end(&mut self, event: &TestCleanupMethodEndEvent) {
        self.test_step_end(LifecycleRole::TestCleanup, &event.method, &event.result);
    }

    fn on_test_end(&mut self, event: &TestEndEvent) {
        match event.outcome {
            TestOutcome::Passed => self.passed += 1,
            TestOutcome::Failed => self.failed += 1,
            TestOutcome::Ignored => self.ignored += 1,
        }
        let status = self.status(event);
        self.line(format!("    {} ... {status}", event.method.name));

        let mut pending = std::mem::take(&mut self.pending);
        if event.outcome == TestOutcome::Failed {
            if pending.is_empty() {
                pending.push(Failure {
                    title: event.method.to_string(),
                    exception: None,
                });
            }
            self.failures.append(&mut pending);
        }
    }
}
