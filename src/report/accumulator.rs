//! Folding end events into result records.

use std::time::Duration;

use attrun_core::TestOutcome;
use attrun_events::{
    EventHandler, MethodRef, TestAssemblyBeginEvent, TestAssemblyEndEvent, TestAssemblyResult, TestClassBeginEvent,
    TestClassEndEvent, TestClassResult, TestEndEvent, TestResult, TestRunEndEvent,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TestReport {
    pub method: MethodRef,
    pub outcome: TestOutcome,
    pub elapsed: Duration,
    pub result: TestResult,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassReport {
    pub full_name: String,
    pub tests: Vec<TestReport>,
    /// Set once the class has ended.
    pub result: Option<TestClassResult>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssemblyReport {
    pub path: String,
    pub classes: Vec<ClassReport>,
    /// Set once the assembly has ended.
    pub result: Option<TestAssemblyResult>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunReport {
    pub assemblies: Vec<AssemblyReport>,
    /// Set once the run has ended.
    pub success: Option<bool>,
}

impl RunReport {
    pub fn tests(&self) -> impl Iterator<Item = &TestReport> {
        self.assemblies
            .iter()
            .flat_map(|a| &a.classes)
            .flat_map(|c| &c.tests)
    }

    pub fn count(&self, outcome: TestOutcome) -> usize {
        self.tests().filter(|t| t.outcome == outcome).count()
    }

    /// Whether every finished assembly succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.assemblies
            .iter()
            .all(|a| a.result.is_some_and(|result| result.success))
    }

    pub fn test(&self, class_full_name: &str, name: &str) -> Option<&TestReport> {
        self.tests()
            .find(|t| t.method.class_full_name == class_full_name && t.method.name == name)
    }
}

/// Builds a [`RunReport`] from the events it observes.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    report: RunReport,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn into_report(self) -> RunReport {
        self.report
    }

    fn current_assembly(&mut self) -> &mut AssemblyReport {
        if self.report.assemblies.is_empty() {
            self.report.assemblies.push(AssemblyReport::default());
        }
        let last = self.report.assemblies.len() - 1;
        &mut self.report.assemblies[last]
    }

    fn current_class(&mut self, full_name: &str) -> &mut ClassReport {
        let assembly = self.current_assembly();
        let open = assembly
            .classes
            .last()
            .is_some_and(|c| c.full_name == full_name && c.result.is_none());
        if !open {
            assembly.classes.push(ClassReport {
                full_name: full_name.to_string(),
                ..ClassReport::default()
            });
        }
        let last = assembly.classes.len() - 1;
        &mut assembly.classes[last]
    }
}

impl EventHandler for ResultAccumulator {
    fn on_test_assembly_begin(&mut self, event: &TestAssemblyBeginEvent) {
        self.report.assemblies.push(AssemblyReport {
            path: event.path.clone(),
            ..AssemblyReport::default()
        });
    }

    fn on_test_class_begin(&mut self, event: &TestClassBeginEvent) {
        self.current_assembly().classes.push(ClassReport {
            full_name: event.full_name.clone(),
            ..ClassReport::default()
        });
    }

    fn on_test_end(&mut self, event: &TestEndEvent) {
        self.current_class(&event.method.class_full_name).tests.push(TestReport {
            method: event.method.clone(),
            outcome: event.outcome,
            elapsed: event.elapsed,
            result: event.result,
        });
    }

    fn on_test_class_end(&mut self, event: &TestClassEndEvent) {
        self.current_class(&event.full_name).result = Some(event.result);
    }

    fn on_test_assembly_end(&mut self, event: &TestAssemblyEndEvent) {
        let assembly = self.current_assembly();
        if assembly.path.is_empty() {
            assembly.path = event.path.clone();
        }
        assembly.result = Some(event.result);
    }

    fn on_test_run_end(&mut self, event: &TestRunEndEvent) {
        self.report.success = Some(event.success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_end(class: &str, name: &str, outcome: TestOutcome) -> TestEndEvent {
        TestEndEvent {
            method: MethodRef::new(class, name),
            outcome,
            elapsed: Duration::from_millis(1),
            result: TestResult {
                success: outcome != TestOutcome::Failed,
                ignored: outcome == TestOutcome::Ignored,
                ignored_from_command_line: false,
            },
        }
    }

    #[test]
    fn folds_a_unit_into_nested_reports() {
        let mut acc = ResultAccumulator::new();
        acc.handle(&TestAssemblyBeginEvent { path: "a.json".into() }.into());
        acc.handle(&TestClassBeginEvent { full_name: "S.A".into() }.into());
        acc.handle(&test_end("S.A", "One", TestOutcome::Passed).into());
        acc.handle(&test_end("S.A", "Two", TestOutcome::Failed).into());
        acc.handle(
            &TestClassEndEvent {
                full_name: "S.A".into(),
                result: TestClassResult {
                    total: 2,
                    ran: 2,
                    passed: 1,
                    failed: 1,
                    ..TestClassResult::default()
                },
            }
            .into(),
        );
        acc.handle(&TestClassBeginEvent { full_name: "S.B".into() }.into());
        acc.handle(&test_end("S.B", "Three", TestOutcome::Ignored).into());
        acc.handle(
            &TestAssemblyEndEvent {
                path: "a.json".into(),
                result: TestAssemblyResult::default(),
            }
            .into(),
        );
        acc.handle(&TestRunEndEvent { success: false }.into());

        let report = acc.into_report();
        assert_eq!(report.assemblies.len(), 1);
        assert_eq!(report.assemblies[0].classes.len(), 2);
        assert_eq!(report.count(TestOutcome::Passed), 1);
        assert_eq!(report.count(TestOutcome::Failed), 1);
        assert_eq!(report.count(TestOutcome::Ignored), 1);
        assert_eq!(report.assemblies[0].classes[0].result.map(|r| r.failed), Some(1));
        assert!(report.assemblies[0].classes[1].result.is_none());
        assert_eq!(report.success, Some(false));
        assert!(!report.all_succeeded());
        assert_eq!(
            report.test("S.A", "Two").map(|t| t.outcome),
            Some(TestOutcome::Failed)
        );
    }

    #[test]
    fn orphan_end_events_get_placeholder_parents() {
        let mut acc = ResultAccumulator::new();
        acc.handle(&test_end("S.A", "One", TestOutcome::Passed).into());
        assert_eq!(acc.report().assemblies.len(), 1);
        assert_eq!(acc.report().assemblies[0].classes[0].full_name, "S.A");
    }
}
