//! Run-scope context state.
//!
//! A [`ContextScope`] is created per run and handed (through the bridge's proxy) to every hook and test that asks
//! for a context. It holds a stack of frames: the engine pushes a frame when it enters AssemblyInitialize,
//! ClassInitialize or a test, and pops it when that scope ends. Readers always see the innermost frame.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use attrun_core::UnitTestOutcome;

/// Property key seeded into every frame with the class name.
pub const CLASS_NAME_PROPERTY: &str = "FullyQualifiedTestClassName";
/// Property key seeded into test frames with the test name.
pub const TEST_NAME_PROPERTY: &str = "TestName";

/// Directories reported to test code. Fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContextDirectories {
    pub test_run: String,
    pub deployment: String,
    pub results: String,
}

impl ContextDirectories {
    /// Directories for a unit: runs from the working directory, deploys from the unit's directory.
    pub fn for_unit(unit: &Path, working_dir: &Path) -> Self {
        let deployment = unit
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(working_dir);
        Self {
            test_run: working_dir.display().to_string(),
            deployment: deployment.display().to_string(),
            results: working_dir.join("TestResults").display().to_string(),
        }
    }
}

/// What test code sees while one lifecycle scope is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFrame {
    pub outcome: UnitTestOutcome,
    pub class_full_name: String,
    pub test_name: String,
    pub properties: BTreeMap<String, String>,
    pub result_files: Vec<String>,
}

impl ContextFrame {
    /// Frame for AssemblyInitialize or ClassInitialize declared on `class_full_name`.
    pub fn for_hook(class_full_name: &str) -> Self {
        Self::new(class_full_name, "")
    }

    /// Frame for one test.
    pub fn for_test(class_full_name: &str, test_name: &str) -> Self {
        Self::new(class_full_name, test_name)
    }

    fn new(class_full_name: &str, test_name: &str) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(CLASS_NAME_PROPERTY.to_string(), class_full_name.to_string());
        if !test_name.is_empty() {
            properties.insert(TEST_NAME_PROPERTY.to_string(), test_name.to_string());
        }
        Self {
            outcome: UnitTestOutcome::InProgress,
            class_full_name: class_full_name.to_string(),
            test_name: test_name.to_string(),
            properties,
            result_files: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct ContextState {
    directories: ContextDirectories,
    frames: Vec<ContextFrame>,
    trace: Vec<String>,
}

/// Shared handle to the run's context state.
#[derive(Debug, Clone, Default)]
pub struct ContextScope(Rc<RefCell<ContextState>>);

impl ContextScope {
    pub fn new(directories: ContextDirectories) -> Self {
        Self(Rc::new(RefCell::new(ContextState {
            directories,
            ..ContextState::default()
        })))
    }

    pub fn push(&self, frame: ContextFrame) {
        self.0.borrow_mut().frames.push(frame);
    }

    pub fn pop(&self) -> Option<ContextFrame> {
        self.0.borrow_mut().frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.0.borrow().frames.len()
    }

    /// Replace the outcome of the innermost frame.
    pub fn set_outcome(&self, outcome: UnitTestOutcome) {
        if let Some(frame) = self.0.borrow_mut().frames.last_mut() {
            frame.outcome = outcome;
        }
    }

    /// Snapshot of the innermost frame.
    pub fn current(&self) -> Option<ContextFrame> {
        self.0.borrow().frames.last().cloned()
    }

    pub fn directories(&self) -> ContextDirectories {
        self.0.borrow().directories.clone()
    }

    /// Outcome of the innermost frame; `Unknown` outside any scope.
    pub fn outcome(&self) -> UnitTestOutcome {
        self.read(|frame| frame.outcome).unwrap_or(UnitTestOutcome::Unknown)
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&ContextFrame) -> T) -> Option<T> {
        self.0.borrow().frames.last().map(f)
    }

    pub(crate) fn write(&self, f: impl FnOnce(&mut ContextFrame)) {
        if let Some(frame) = self.0.borrow_mut().frames.last_mut() {
            f(frame);
        }
    }

    /// Queue a trace line written by test code.
    pub fn trace(&self, line: impl Into<String>) {
        self.0.borrow_mut().trace.push(line.into());
    }

    /// Take every queued trace line, oldest first.
    pub fn drain_trace(&self) -> Vec<String> {
        std::mem::take(&mut self.0.borrow_mut().trace)
    }
}
